//! Typed `mcp-session-id` header

use axum::http::{HeaderName, HeaderValue};
use axum_extra::headers::{self, Header};

pub static MCP_SESSION_ID: HeaderName = HeaderName::from_static("mcp-session-id");

/// Session id carried by every non-initialization request. Empty and
/// non-ASCII values decode to an empty id, which the handlers treat as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpSessionId(pub String);

impl McpSessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Header for McpSessionId {
    fn name() -> &'static HeaderName {
        &MCP_SESSION_ID
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, headers::Error>
    where
        I: Iterator<Item = &'i HeaderValue>,
    {
        let value = values.next().ok_or_else(headers::Error::invalid)?;
        // Ids are generated as ASCII, so an opaque value can never match one.
        let id = value.to_str().map(str::trim).unwrap_or_default();
        Ok(Self(id.to_string()))
    }

    fn encode<E: Extend<HeaderValue>>(&self, values: &mut E) {
        if let Ok(value) = HeaderValue::from_str(&self.0) {
            values.extend(std::iter::once(value));
        }
    }
}
