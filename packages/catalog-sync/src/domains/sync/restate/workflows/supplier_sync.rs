//! Supplier sync workflow (durable)
//!
//! Flow:
//! 1. Authenticate against the supplier portal (only the expiry is journaled)
//! 2. Extract the catalog with the fixed operational defaults
//! 3. Persist the extraction output
//! 4. Notify once and finish
//!
//! The Restate workflow key is the execution id (`<supplier>-<millis>`), so
//! Restate itself rejects a second start for an id it already holds.

use std::sync::Arc;
use std::time::Duration;

use restate_sdk::prelude::*;
use tracing::{error, info, warn};

use crate::common::EmptyRequest;
use crate::config::SyncConfig;
use crate::domains::sync::activities::{self, within_timeout};
use crate::domains::sync::restate::sessions::SessionCache;
use crate::domains::sync::models::{
    ExtractionParams, NotifyEvent, NotifyOutcome, NotifyPolicy, SyncRequest, SyncResult,
    SyncState, SyncStatus,
};
use crate::domains::sync::restate::{attempt_error, now_millis};
use crate::kernel::SyncDeps;

const STATUS_KEY: &str = "status";

// =============================================================================
// Workflow definition
// =============================================================================

#[restate_sdk::workflow]
#[name = "SupplierSyncWorkflow"]
pub trait SupplierSyncWorkflow {
    async fn run(req: SyncRequest) -> Result<SyncResult, HandlerError>;

    #[shared]
    async fn get_status(req: EmptyRequest) -> Result<SyncStatus, HandlerError>;
}

pub struct SupplierSyncWorkflowImpl {
    deps: Arc<SyncDeps>,
    config: Arc<SyncConfig>,
    sessions: Arc<SessionCache>,
}

impl SupplierSyncWorkflowImpl {
    pub fn with_deps(deps: Arc<SyncDeps>, config: Arc<SyncConfig>) -> Self {
        Self {
            deps,
            config,
            sessions: Arc::new(SessionCache::new()),
        }
    }
}

fn publish(ctx: &WorkflowContext<'_>, status: &mut SyncStatus, state: SyncState, result: Option<SyncResult>) {
    *status = match result {
        Some(result) => status.with_result(state, result),
        None => status.with_state(state),
    };
    ctx.set(STATUS_KEY, status.clone());
}

impl SupplierSyncWorkflow for SupplierSyncWorkflowImpl {
    async fn run(
        &self,
        ctx: WorkflowContext<'_>,
        req: SyncRequest,
    ) -> Result<SyncResult, HandlerError> {
        let workflow_id = ctx.key().to_string();
        let deps = self.deps.as_ref();
        let sessions = self.sessions.as_ref();
        let options = self.config.activity;
        let notify_options = self.config.notify;
        let policy = NotifyPolicy::for_mode(req.mode);

        info!(
            workflow_id = %workflow_id,
            supplier = %req.supplier,
            mode = %req.mode,
            "Starting supplier sync workflow"
        );

        let mut status = SyncStatus::pending(&workflow_id, &req.supplier);
        ctx.set(STATUS_KEY, status.clone());

        let started_ms = ctx
            .run(|| async { Ok(now_millis()) })
            .name("started_at")
            .await?;

        let pipeline = async {
            publish(&ctx, &mut status, SyncState::Authenticating, None);
            let expires_at: String = ctx
                .run(|| async {
                    let session = within_timeout(
                        "authenticate",
                        options.start_to_close_timeout,
                        sessions.refresh(&workflow_id, &req.supplier, deps),
                    )
                    .await
                    .map_err(attempt_error)?;
                    Ok(session.expires_at.to_rfc3339())
                })
                .retry_policy(options.retry.to_restate())
                .name("authenticate")
                .await?;
            info!(workflow_id = %workflow_id, %expires_at, "Portal session ready");

            publish(&ctx, &mut status, SyncState::Extracting, None);
            let params = ExtractionParams::from_request(&req, &self.config.extraction);
            let extraction = ctx
                .run(|| async {
                    within_timeout("extract", options.start_to_close_timeout, async {
                        let session = sessions.session_for(&workflow_id, &req.supplier, deps).await?;
                        activities::extract(&session, &params, deps).await
                    })
                    .await
                    .map_err(attempt_error)
                })
                .retry_policy(options.retry.to_restate())
                .name("extract")
                .await?;

            publish(&ctx, &mut status, SyncState::Persisting, None);
            ctx.run(|| async {
                within_timeout(
                    "persist",
                    options.start_to_close_timeout,
                    activities::persist(&req.supplier, &extraction, deps),
                )
                .await
                .map_err(attempt_error)?;
                Ok(extraction.products_created + extraction.products_updated)
            })
            .retry_policy(options.retry.to_restate())
            .name("persist")
            .await?;

            Ok::<_, TerminalError>(extraction)
        };
        let outcome = pipeline.await;
        sessions.forget(&workflow_id).await;

        let finished_ms = ctx
            .run(|| async { Ok(now_millis()) })
            .name("finished_at")
            .await?;
        let elapsed = Duration::from_millis(finished_ms.saturating_sub(started_ms));

        let (event, result) = match &outcome {
            Ok(extraction) => {
                let result = SyncResult::from_extraction(&req.supplier, extraction, elapsed);
                let event = policy
                    .on_success()
                    .then(|| NotifyEvent::success(&result));
                (event, result)
            }
            Err(e) => (
                Some(NotifyEvent::error(&req.supplier, e.to_string())),
                SyncResult::failed(&req.supplier, elapsed),
            ),
        };

        publish(&ctx, &mut status, SyncState::Notifying, Some(result.clone()));
        if let Some(event) = event {
            let delivered = ctx
                .run(|| async {
                    let outcome = within_timeout(
                        "notify",
                        notify_options.start_to_close_timeout,
                        async { Ok(activities::notify(&event, deps).await) },
                    )
                    .await
                    .unwrap_or_else(|e| NotifyOutcome::Failed {
                        error: e.to_string(),
                    });
                    Ok(outcome)
                })
                .retry_policy(notify_options.retry.to_restate())
                .name("notify")
                .await;

            match delivered {
                Ok(NotifyOutcome::Delivered) => {}
                Ok(outcome) => warn!(workflow_id = %workflow_id, ?outcome, "Notification not delivered"),
                Err(e) => warn!(workflow_id = %workflow_id, error = %e, "Notification step failed"),
            }
        }

        match outcome {
            Ok(_) => {
                publish(&ctx, &mut status, SyncState::Succeeded, None);
                info!(
                    workflow_id = %workflow_id,
                    supplier = %result.supplier,
                    status = %result.status,
                    products_extracted = result.products_extracted,
                    duration_ms = result.duration_ms,
                    "Supplier sync workflow completed"
                );
                Ok(result)
            }
            Err(e) => {
                publish(&ctx, &mut status, SyncState::Failed, None);
                error!(
                    workflow_id = %workflow_id,
                    supplier = %req.supplier,
                    error = %e,
                    "Supplier sync workflow failed"
                );
                Err(e.into())
            }
        }
    }

    async fn get_status(
        &self,
        ctx: SharedWorkflowContext<'_>,
        _req: EmptyRequest,
    ) -> Result<SyncStatus, HandlerError> {
        Ok(ctx
            .get::<SyncStatus>(STATUS_KEY)
            .await?
            .unwrap_or_else(|| SyncStatus::pending(ctx.key(), "")))
    }
}
