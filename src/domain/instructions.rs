//! Memoized usage instructions
//!
//! The instructions are fetched once from the documentation service and kept for
//! the lifetime of the owning state. A failed fetch leaves the cache empty so the
//! next access retries.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::upstream::rag::{DocsApi, UsageInstructions};

pub const INSTRUCTIONS_UNAVAILABLE_TEXT: &str =
    "Usage instructions are currently unavailable. Please try again later.";

#[derive(Debug, Default)]
pub struct InstructionsCache {
    value: RwLock<Option<Arc<UsageInstructions>>>,
}

impl InstructionsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Arc<UsageInstructions>> {
        self.value.read().await.clone()
    }

    pub async fn set(&self, instructions: UsageInstructions) -> Arc<UsageInstructions> {
        let instructions = Arc::new(instructions);
        *self.value.write().await = Some(Arc::clone(&instructions));
        instructions
    }

    pub async fn clear(&self) {
        *self.value.write().await = None;
    }

    pub async fn get_or_fetch(&self, docs: &dyn DocsApi) -> Option<Arc<UsageInstructions>> {
        if let Some(cached) = self.get().await {
            return Some(cached);
        }

        match docs.fetch_instructions().await {
            Ok(instructions) => {
                debug!("usage instructions fetched");
                Some(self.set(instructions).await)
            }
            Err(err) => {
                error!(error = %err, "error fetching usage instructions");
                None
            }
        }
    }
}
