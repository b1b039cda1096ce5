//! Model Context Protocol resource providers
//!
//! The code assist server exposes its usage instructions under
//! `mcp://<app-name>/instructions`. Every other URI reads as a fixed error text.

use std::sync::Arc;

use rust_mcp_sdk::schema::{ReadResourceContent, ReadResourceResult, Resource, TextResourceContents};

use crate::domain::instructions::{InstructionsCache, INSTRUCTIONS_UNAVAILABLE_TEXT};
use crate::upstream::rag::DocsApi;

pub const INVALID_RESOURCE_TEXT: &str = "Invalid Resource URI";

pub fn instructions_uri(app_name: &str) -> String {
    format!("mcp://{app_name}/instructions")
}

struct InstructionsResource {
    uri: String,
    cache: Arc<InstructionsCache>,
    docs: Arc<dyn DocsApi>,
}

#[derive(Default)]
pub struct ResourceCatalog {
    instructions: Option<InstructionsResource>,
}

impl ResourceCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_instructions(
        app_name: &str,
        cache: Arc<InstructionsCache>,
        docs: Arc<dyn DocsApi>,
    ) -> Self {
        Self {
            instructions: Some(InstructionsResource {
                uri: instructions_uri(app_name),
                cache,
                docs,
            }),
        }
    }

    pub fn list(&self) -> Vec<Resource> {
        self.instructions
            .iter()
            .map(|resource| Resource {
                annotations: None,
                description: Some(
                    "Instructions for using the Google Maps Platform code assist tools"
                        .to_string(),
                ),
                icons: vec![],
                meta: None,
                mime_type: Some("text/plain".to_string()),
                name: "instructions".to_string(),
                size: None,
                title: Some("Usage Instructions".to_string()),
                uri: resource.uri.clone(),
            })
            .collect()
    }

    /// Joined usage instructions, fetching them on first use.
    pub async fn instructions_text(&self) -> Option<String> {
        let resource = self.instructions.as_ref()?;
        resource
            .cache
            .get_or_fetch(resource.docs.as_ref())
            .await
            .map(|instructions| instructions.joined())
    }

    pub async fn read(&self, uri: &str) -> ReadResourceResult {
        let text = match &self.instructions {
            Some(resource) if resource.uri == uri => self
                .instructions_text()
                .await
                .unwrap_or_else(|| INSTRUCTIONS_UNAVAILABLE_TEXT.to_string()),
            _ => INVALID_RESOURCE_TEXT.to_string(),
        };

        ReadResourceResult {
            contents: vec![ReadResourceContent::from(TextResourceContents {
                meta: None,
                mime_type: Some("text/plain".to_string()),
                text,
                uri: uri.to_string(),
            })],
            meta: None,
        }
    }
}
