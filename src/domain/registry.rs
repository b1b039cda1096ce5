//! Tool registry and call dispatcher
//!
//! The registry is populated once at startup and read-only afterwards. Dispatch
//! never fails at the protocol level: unknown names and handler failures are
//! both turned into text envelopes.

use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolResult, Tool};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::domain::utils::{text_envelope, INVALID_TOOL_TEXT};
use crate::errors::ToolError;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Map<String, Value>) -> Result<CallToolResult, ToolError>;
}

struct RegisteredTool {
    descriptor: Tool,
    handler: Arc<dyn ToolHandler>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: Tool,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ToolError> {
        if self.contains(&descriptor.name) {
            return Err(ToolError::DuplicateTool(descriptor.name));
        }

        self.tools.push(RegisteredTool {
            descriptor,
            handler,
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.descriptor.name == name)
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|tool| tool.descriptor.clone())
            .collect()
    }

    pub async fn dispatch(&self, name: &str, arguments: Map<String, Value>) -> CallToolResult {
        let Some(tool) = self.tools.iter().find(|tool| tool.descriptor.name == name) else {
            info!(tool = name, "tool not found");
            return text_envelope(INVALID_TOOL_TEXT);
        };

        match tool.handler.call(arguments).await {
            Ok(result) => result,
            Err(err) => {
                error!(tool = name, error = %err, "error executing tool");
                text_envelope(err.to_json().to_string())
            }
        }
    }
}
