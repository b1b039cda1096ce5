use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::{
    macros,
    schema::{CallToolResult, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::domain::{
    instructions::{InstructionsCache, INSTRUCTIONS_UNAVAILABLE_TEXT},
    registry::ToolHandler,
    utils::{success_envelope, text_envelope},
};
use crate::errors::ToolError;
use crate::upstream::rag::DocsApi;

pub const DOCS_TOOL_NAME: &str = "retrieve-google-maps-platform-docs";
pub const INSTRUCTIONS_TOOL_NAME: &str = "retrieve-instructions";
pub const NO_INFORMATION_TEXT: &str = "No information available";

#[macros::mcp_tool(
    name = "retrieve-google-maps-platform-docs",
    description = "Searches Google Maps Platform documentation, code samples, architecture center, trust center and GitHub repositories. Call this tool for any Google Maps Platform question, and call retrieve-instructions first to learn how to use the results."
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct RetrieveDocsTool {
    pub prompt: String,
}

pub fn instructions_descriptor() -> Tool {
    serde_json::from_value(json!({
        "name": INSTRUCTIONS_TOOL_NAME,
        "description": "Returns the system instructions, preamble and regional terms disclaimer to follow when answering Google Maps Platform questions. Call this before retrieve-google-maps-platform-docs.",
        "inputSchema": {
            "type": "object",
            "properties": {}
        }
    }))
    .expect("instructions tool descriptor")
}

pub struct DocsRetrieval {
    docs: Arc<dyn DocsApi>,
}

impl DocsRetrieval {
    pub fn new(docs: Arc<dyn DocsApi>) -> Self {
        Self { docs }
    }
}

#[async_trait]
impl ToolHandler for DocsRetrieval {
    async fn call(&self, arguments: Map<String, Value>) -> Result<CallToolResult, ToolError> {
        let args: RetrieveDocsTool = serde_json::from_value(Value::Object(arguments))?;
        info!(tool = DOCS_TOOL_NAME, prompt = %args.prompt, "calling tool");

        match self.docs.retrieve_docs(&args.prompt).await {
            Ok(reply) => Ok(success_envelope(&reply)),
            Err(err) => {
                error!(tool = DOCS_TOOL_NAME, error = %err, "error executing tool");
                let text = err.upstream_message().unwrap_or(NO_INFORMATION_TEXT);
                Ok(text_envelope(text))
            }
        }
    }
}

pub struct InstructionsRetrieval {
    docs: Arc<dyn DocsApi>,
    cache: Arc<InstructionsCache>,
}

impl InstructionsRetrieval {
    pub fn new(docs: Arc<dyn DocsApi>, cache: Arc<InstructionsCache>) -> Self {
        Self { docs, cache }
    }
}

#[async_trait]
impl ToolHandler for InstructionsRetrieval {
    async fn call(&self, _arguments: Map<String, Value>) -> Result<CallToolResult, ToolError> {
        info!(tool = INSTRUCTIONS_TOOL_NAME, "calling tool");

        let text = match self.cache.get_or_fetch(self.docs.as_ref()).await {
            Some(instructions) => instructions.joined(),
            None => INSTRUCTIONS_UNAVAILABLE_TEXT.to_string(),
        };
        Ok(text_envelope(text))
    }
}
