// Trait definitions for dependency injection
//
// One port per external collaborator. Portal automation, catalog storage and
// notification transport all live behind these; the orchestrator only
// sequences them.

use async_trait::async_trait;

use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{
    ExtractionParams, ExtractionResult, NotifyEvent, Session, WorkflowStart,
};

// =============================================================================
// Authentication (portal login flow)
// =============================================================================

#[async_trait]
pub trait AuthPort: Send + Sync {
    /// Log in to the supplier portal.
    async fn authenticate(&self, supplier: &str) -> Result<Session, SyncError>;
}

// =============================================================================
// Extraction (pagination/scraping of the remote catalog)
// =============================================================================

#[async_trait]
pub trait ExtractionPort: Send + Sync {
    /// Paginate the supplier catalog within `params`.
    ///
    /// Returns `status = partial` when some but not all pages succeed.
    async fn extract(
        &self,
        session: &Session,
        params: &ExtractionParams,
    ) -> Result<ExtractionResult, SyncError>;
}

// =============================================================================
// Persistence (catalog upsert keyed by supplier-scoped SKU)
// =============================================================================

#[async_trait]
pub trait PersistencePort: Send + Sync {
    async fn persist(&self, supplier: &str, result: &ExtractionResult) -> Result<(), SyncError>;
}

// =============================================================================
// Notification transport
// =============================================================================

#[async_trait]
pub trait NotifyPort: Send + Sync {
    async fn notify(&self, event: &NotifyEvent) -> Result<(), SyncError>;
}

// =============================================================================
// Durable runtime start port
// =============================================================================

#[async_trait]
pub trait WorkflowStarter: Send + Sync {
    /// Start a workflow execution; returns the execution id.
    async fn start_workflow(&self, start: WorkflowStart) -> Result<String, SyncError>;
}
