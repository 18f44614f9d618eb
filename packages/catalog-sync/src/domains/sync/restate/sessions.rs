//! Portal sessions held in memory for the durable supplier workflow.
//!
//! Tokens never enter the Restate journal. The authenticate step caches the
//! session under the execution id and journals only its expiry; the extract
//! step reuses the cached session, or authenticates again after a restart.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domains::sync::activities;
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::Session;
use crate::kernel::SyncDeps;

#[derive(Default)]
pub struct SessionCache {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate `supplier` and cache the session for `workflow_id`.
    pub async fn refresh(
        &self,
        workflow_id: &str,
        supplier: &str,
        deps: &SyncDeps,
    ) -> Result<Session, SyncError> {
        let session = activities::authenticate(supplier, deps).await?;
        self.sessions
            .lock()
            .await
            .insert(workflow_id.to_string(), session.clone());
        Ok(session)
    }

    /// Cached session for `workflow_id` while it is still valid, otherwise a fresh one.
    pub async fn session_for(
        &self,
        workflow_id: &str,
        supplier: &str,
        deps: &SyncDeps,
    ) -> Result<Session, SyncError> {
        let cached = self.sessions.lock().await.get(workflow_id).cloned();
        match cached {
            Some(session) if !session.is_expired(Utc::now()) => Ok(session),
            _ => {
                debug!(workflow_id, supplier, "no usable cached session");
                self.refresh(workflow_id, supplier, deps).await
            }
        }
    }

    pub async fn forget(&self, workflow_id: &str) {
        self.sessions.lock().await.remove(workflow_id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
