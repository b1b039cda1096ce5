//! Session table for the multiplexed HTTP transport
//!
//! A session is created when an `initialize` request arrives without a session
//! header and is registered only once initialization succeeds. Later requests
//! carry the id in the `mcp-session-id` header and are processed one at a time
//! per session. Entries leave the table exactly once, on explicit close or on
//! the shutdown sweep.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::SessionError;
use crate::mcp::server::handle_json_rpc_payload;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closing,
    Closed,
}

#[derive(Debug)]
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
    lane: AsyncMutex<()>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            state: Mutex::new(SessionState::Open),
            lane: AsyncMutex::new(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: SessionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Processes one JSON-RPC payload (single message or batch) for this session.
    pub async fn process(
        &self,
        state: &AppState,
        payload: Value,
    ) -> Result<Option<Value>, SessionError> {
        let _lane = self.lane.lock().await;
        if self.state() != SessionState::Open {
            return Err(SessionError::Closed(self.id.clone()));
        }

        Ok(handle_json_rpc_payload(state, payload).await)
    }

    /// Moves the session to `Closed`, waiting for an in-flight request to finish.
    pub async fn close(&self) -> Result<(), SessionError> {
        {
            let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *current != SessionState::Open {
                return Err(SessionError::Closed(self.id.clone()));
            }
            *current = SessionState::Closing;
        }

        let _lane = self.lane.lock().await;
        self.set_state(SessionState::Closed);
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Arc<Session>) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(SessionError::AlreadyExists(session.id().to_string()));
        }

        sessions.insert(session.id().to_string(), session);
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Removes the entry and closes its handle.
    pub async fn close(&self, id: &str) -> Result<(), SessionError> {
        let session = self
            .remove(id)
            .await
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        session.close().await?;
        let age_ms = (Utc::now() - session.created_at()).num_milliseconds();
        info!(session_id = %id, age_ms, "session closed");
        Ok(())
    }

    /// Closes every remaining session. Failures are logged and do not stop the sweep.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write().await;
            sessions.drain().map(|(_, session)| session).collect()
        };

        let mut closed = 0;
        for session in drained {
            match session.close().await {
                Ok(()) => closed += 1,
                Err(err) => {
                    warn!(session_id = %session.id(), error = %err, "failed to close session")
                }
            }
        }
        closed
    }
}
