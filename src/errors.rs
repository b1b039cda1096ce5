use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::mcp::rpc::app_error_to_json_rpc;

pub const MISSING_SESSION_MESSAGE: &str =
    "Bad Request: No valid session ID provided for non-init request";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest {
        code: &'static str,
        message: &'static str,
    },
    #[error("Bad Request: No valid session ID provided for non-init request")]
    MissingSession,
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("internal error")]
    Internal { code: &'static str, message: String },
}

impl AppError {
    pub fn bad_request(code: &'static str, message: &'static str) -> Self {
        Self::BadRequest { code, message }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest { .. } | Self::MissingSession => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal { message, .. } => {
                tracing::error!(error = %message, "request failed with internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(app_error_to_json_rpc(None, self))).into_response()
    }
}

/// Failure of a single upstream call.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Environment variable GOOGLE_MAPS_API_KEY not found. Please set it to your Google Maps API key.")]
    MissingApiKey,
    #[error("upstream responded with HTTP {status}")]
    Status {
        status: u16,
        message: Option<String>,
        body: Value,
    },
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// The `error.message` carried by a structured upstream error body.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

/// Failure in the outer layer of a tool handler, before any upstream call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),
}

impl ToolError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::DuplicateTool(_) => "duplicate_tool",
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "code": self.code(),
            "message": self.to_string(),
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session already registered: {0}")]
    AlreadyExists(String),
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("session is closed: {0}")]
    Closed(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(id) => Self::SessionNotFound(id),
            other => Self::internal(other.to_string()),
        }
    }
}
