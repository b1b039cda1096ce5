//! Domain-specific shared normalization and envelope formatting utilities

use rust_mcp_sdk::schema::{CallToolResult, ContentBlock, TextContent};
use serde_json::json;
use tracing::error;

use crate::errors::UpstreamError;
use crate::upstream::UpstreamReply;

pub const INVALID_TOOL_TEXT: &str = "Invalid Tool called";

pub fn text_envelope(text: impl Into<String>) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text.into(), None, None))],
        is_error: None,
        meta: None,
        structured_content: None,
    }
}

/// `{"response":{"contexts":<body>},"status":"<status>"}` as the single text item.
pub fn success_envelope(reply: &UpstreamReply) -> CallToolResult {
    text_envelope(
        json!({
            "response": {
                "contexts": reply.body
            },
            "status": reply.status.to_string(),
        })
        .to_string(),
    )
}

/// Maps the outcome of a maps upstream call into the tool envelope.
///
/// Structured upstream errors surface their `error.message` verbatim; every
/// other failure yields an empty text item.
pub fn upstream_envelope(
    tool: &str,
    result: Result<UpstreamReply, UpstreamError>,
) -> CallToolResult {
    match result {
        Ok(reply) => success_envelope(&reply),
        Err(err) => {
            let message = err.upstream_message().unwrap_or_default();
            error!(tool, error = %err, error_message = message, "error executing tool");
            text_envelope(message)
        }
    }
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
pub(crate) fn envelope_text(result: &CallToolResult) -> String {
    let value = serde_json::to_value(result).expect("envelope serialization");
    value["content"][0]["text"]
        .as_str()
        .expect("text content")
        .to_string()
}
