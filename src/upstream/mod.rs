//! Outbound REST clients
//!
//! Each tool performs exactly one call through these clients. The traits are the
//! seam the tool handlers depend on; the `Http*` types are the production
//! implementations built on `reqwest`.

pub mod maps;
pub mod rag;

use reqwest::Response;
use serde_json::Value;

use crate::errors::UpstreamError;

/// A successful (2xx) upstream response.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

pub(crate) async fn read_reply(response: Response) -> Result<UpstreamReply, UpstreamError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).map_err(|err| UpstreamError::Decode(err.to_string()))?
        };
        return Ok(UpstreamReply {
            status: status.as_u16(),
            body,
        });
    }

    let body = serde_json::from_slice::<Value>(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    let message = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string);

    Err(UpstreamError::Status {
        status: status.as_u16(),
        message,
        body,
    })
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
