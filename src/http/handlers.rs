//! Axum HTTP handlers for the web server
//!
//! Provides the session-multiplexed Model Context Protocol endpoint, session
//! close, and general metadata endpoints.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::TypedHeader;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::http::session_header::McpSessionId;
use crate::mcp::rpc::{is_json_rpc_error, json_rpc_error, PARSE_ERROR};
use crate::mcp::server::is_initialize_request;
use crate::mcp::session::Session;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub active_sessions: usize,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub mcp_endpoint: &'static str,
    pub session_header: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        active_sessions: state.sessions.len().await,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: state.kind.app_name(),
        version: env!("CARGO_PKG_VERSION"),
        mcp_endpoint: "/mcp",
        session_header: "mcp-session-id",
    })
}

fn present_session_id(header: Option<TypedHeader<McpSessionId>>) -> Option<String> {
    header
        .map(|TypedHeader(McpSessionId(id))| id)
        .filter(|id| !id.is_empty())
}

fn json_rpc_reply(response: Option<Value>) -> Response {
    match response {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

pub async fn mcp_endpoint(
    State(state): State<AppState>,
    session_header: Option<TypedHeader<McpSessionId>>,
    body: Bytes,
) -> Result<Response, AppError> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(json_rpc_error(None, PARSE_ERROR, "Parse error")),
            )
                .into_response())
        }
    };

    if let Some(session_id) = present_session_id(session_header) {
        if let Some(session) = state.sessions.get(&session_id).await {
            let response = session.process(&state, payload).await?;
            return Ok(json_rpc_reply(response));
        }
        warn!(session_id = %session_id, "request for unknown session");
    }

    if !is_initialize_request(&payload) {
        return Err(AppError::MissingSession);
    }

    initialize_session(&state, payload).await
}

async fn initialize_session(state: &AppState, payload: Value) -> Result<Response, AppError> {
    let session = Arc::new(Session::new());
    let response = session.process(state, payload).await?;

    let initialized = response
        .as_ref()
        .is_some_and(|body| !is_json_rpc_error(body));
    if !initialized {
        return Ok(json_rpc_reply(response));
    }

    state.sessions.insert(Arc::clone(&session)).await?;
    info!(session_id = %session.id(), "session initialized");

    Ok((
        TypedHeader(McpSessionId(session.id().to_string())),
        json_rpc_reply(response),
    )
        .into_response())
}

pub async fn close_session(
    State(state): State<AppState>,
    session_header: Option<TypedHeader<McpSessionId>>,
) -> Result<StatusCode, AppError> {
    let Some(session_id) = present_session_id(session_header) else {
        return Err(AppError::MissingSession);
    };

    state.sessions.close(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
