//! Per-supplier sync workflow
//!
//! Flow:
//! 1. Authenticate against the supplier portal
//! 2. Extract the catalog with the fixed operational defaults
//! 3. Persist the extraction output
//! 4. Notify exactly once (success or error) and reach a terminal state
//!
//! Every step goes through the activity retry policy. Status snapshots are
//! published on a watch channel so queries never wait on the workflow.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::domains::sync::activities::{self, run_activity, within_timeout};
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{
    ExtractionParams, NotifyEvent, NotifyOutcome, NotifyPolicy, SyncRequest, SyncResult,
    SyncState, SyncStatus,
};
use crate::kernel::SyncDeps;

/// Read side of a workflow's live status.
#[derive(Debug, Clone)]
pub struct StatusHandle(watch::Receiver<SyncStatus>);

impl StatusHandle {
    pub fn current(&self) -> SyncStatus {
        self.0.borrow().clone()
    }

    pub fn state(&self) -> SyncState {
        self.0.borrow().state
    }

    /// Last computed result, `None` before one exists.
    pub fn result(&self) -> Option<SyncResult> {
        self.0.borrow().result.clone()
    }
}

pub struct SupplierSyncWorkflow {
    workflow_id: String,
    deps: Arc<SyncDeps>,
    config: Arc<SyncConfig>,
    status: watch::Sender<SyncStatus>,
}

impl SupplierSyncWorkflow {
    pub fn new(
        workflow_id: impl Into<String>,
        supplier: &str,
        deps: Arc<SyncDeps>,
        config: Arc<SyncConfig>,
    ) -> Self {
        let workflow_id = workflow_id.into();
        let (status, _) = watch::channel(SyncStatus::pending(&workflow_id, supplier));
        Self {
            workflow_id,
            deps,
            config,
            status,
        }
    }

    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn status_handle(&self) -> StatusHandle {
        StatusHandle(self.status.subscribe())
    }

    /// Run the pipeline to a terminal state.
    ///
    /// On failure the error notification is sent before the error is returned.
    pub async fn run(&self, request: SyncRequest) -> Result<SyncResult, SyncError> {
        let started = Instant::now();
        let policy = NotifyPolicy::for_mode(request.mode);

        info!(
            workflow_id = %self.workflow_id,
            supplier = %request.supplier,
            mode = %request.mode,
            "starting supplier sync"
        );

        match self.execute(&request, started).await {
            Ok(result) => {
                self.publish(SyncState::Notifying, Some(result.clone()));
                if policy.on_success() {
                    self.notify(NotifyEvent::success(&result)).await;
                }
                self.publish(SyncState::Succeeded, None);

                info!(
                    workflow_id = %self.workflow_id,
                    supplier = %result.supplier,
                    status = %result.status,
                    products_extracted = result.products_extracted,
                    duration_ms = result.duration_ms,
                    "supplier sync completed"
                );
                Ok(result)
            }
            Err(e) => {
                let failed = SyncResult::failed(&request.supplier, started.elapsed());
                self.publish(SyncState::Notifying, Some(failed));
                self.notify(NotifyEvent::error(&request.supplier, e.to_string()))
                    .await;
                self.publish(SyncState::Failed, None);

                error!(
                    workflow_id = %self.workflow_id,
                    supplier = %request.supplier,
                    error = %e,
                    "supplier sync failed"
                );
                Err(e)
            }
        }
    }

    async fn execute(&self, request: &SyncRequest, started: Instant) -> Result<SyncResult, SyncError> {
        let deps = self.deps.as_ref();
        let options = &self.config.activity;

        self.publish(SyncState::Authenticating, None);
        let session = run_activity("authenticate", options, || {
            activities::authenticate(&request.supplier, deps)
        })
        .await?;

        self.publish(SyncState::Extracting, None);
        let params = ExtractionParams::from_request(request, &self.config.extraction);
        let extraction = run_activity("extract", options, || {
            activities::extract(&session, &params, deps)
        })
        .await?;

        self.publish(SyncState::Persisting, None);
        run_activity("persist", options, || {
            activities::persist(&request.supplier, &extraction, deps)
        })
        .await?;

        Ok(SyncResult::from_extraction(
            &request.supplier,
            &extraction,
            started.elapsed(),
        ))
    }

    async fn notify(&self, event: NotifyEvent) -> NotifyOutcome {
        let deps = self.deps.as_ref();
        let outcome = within_timeout(
            "notify",
            self.config.notify.start_to_close_timeout,
            async { Ok(activities::notify(&event, deps).await) },
        )
        .await
        .unwrap_or_else(|e| NotifyOutcome::Failed {
            error: e.to_string(),
        });

        if outcome.is_delivered() {
            debug!(workflow_id = %self.workflow_id, kind = ?event.kind, "notification delivered");
        } else {
            warn!(workflow_id = %self.workflow_id, kind = ?event.kind, outcome = ?outcome, "notification not delivered");
        }
        outcome
    }

    /// Move to `state`, replacing the result snapshot when one is given.
    fn publish(&self, state: SyncState, result: Option<SyncResult>) {
        self.status.send_modify(|status| {
            debug_assert!(
                status.state.can_transition_to(state),
                "illegal transition {} -> {}",
                status.state,
                state
            );
            status.state = state;
            if let Some(result) = result {
                status.result = Some(result);
            }
        });
    }
}
