//! Fan-out coordinator
//!
//! Starts one supplier workflow per roster member concurrently and waits for
//! every one of them to settle. A failed or rejected execution is downgraded
//! to a zero-metric failed entry, so the aggregate always has exactly one
//! result per roster member, in roster order.
//!
//! ```text
//! CatalogSyncCoordinator::run(mode)
//!     │
//!     ├─► runtime.start_supplier_sync(A) ─┐
//!     ├─► runtime.start_supplier_sync(B) ─┼─► settle all ─► [A, B, C]
//!     └─► runtime.start_supplier_sync(C) ─┘
//! ```

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{
    fan_out_workflow_id, FanOutReport, FanOutRequest, SyncMode, SyncRequest, SyncResult,
};
use crate::kernel::LocalRuntime;

pub struct CatalogSyncCoordinator {
    runtime: LocalRuntime,
    config: Arc<SyncConfig>,
}

impl CatalogSyncCoordinator {
    pub fn new(runtime: LocalRuntime, config: Arc<SyncConfig>) -> Self {
        Self { runtime, config }
    }

    /// Sync every roster supplier in `mode` and return the settled aggregate.
    pub async fn run(&self, request: FanOutRequest) -> FanOutReport {
        let stamp = Utc::now().timestamp_millis();
        let mode = request.mode;

        info!(mode = %mode, suppliers = self.config.roster.len(), "starting catalog fan-out");

        let results = settle_all(&self.config.roster, |supplier| {
            let sync_request = SyncRequest {
                supplier: supplier.to_string(),
                mode,
                categories: request.categories.clone(),
            };
            let workflow_id = fan_out_workflow_id(mode, supplier, stamp);
            async move {
                let handle = self
                    .runtime
                    .start_supplier_sync(workflow_id, sync_request)
                    .await?;
                handle.wait().await
            }
        })
        .await;

        let report = FanOutReport { results };
        log_report(mode, &report);
        report
    }

    pub async fn run_mode(&self, mode: SyncMode) -> FanOutReport {
        self.run(FanOutRequest {
            mode,
            categories: None,
        })
        .await
    }
}

/// Drive one execution per roster member concurrently and wait for all of
/// them, mapping every error to [`SyncResult::failed_placeholder`].
pub async fn settle_all<'a, F, Fut>(roster: &'a [String], mut start: F) -> Vec<SyncResult>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<SyncResult, SyncError>>,
{
    let runs: Vec<_> = roster.iter().map(|supplier| start(supplier)).collect();
    let settled = join_all(runs).await;

    roster
        .iter()
        .zip(settled)
        .map(|(supplier, outcome)| {
            outcome.unwrap_or_else(|e| {
                warn!(supplier = %supplier, error = %e, "supplier execution failed");
                SyncResult::failed_placeholder(supplier)
            })
        })
        .collect()
}

pub(crate) fn log_report(mode: SyncMode, report: &FanOutReport) {
    info!(
        mode = %mode,
        succeeded = report.succeeded(),
        partial = report.partial(),
        failed = report.failed(),
        "fan-out settled"
    );
    for result in &report.results {
        info!(
            supplier = %result.supplier,
            status = %result.status,
            products_extracted = result.products_extracted,
            products_created = result.products_created,
            products_updated = result.products_updated,
            errors = result.errors,
            duration_ms = result.duration_ms,
            "supplier result"
        );
    }
}
