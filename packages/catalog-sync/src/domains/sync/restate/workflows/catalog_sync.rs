//! Catalog sync workflow (durable fan-out)
//!
//! Calls one `SupplierSyncWorkflow` per roster member. All calls are issued
//! before any is awaited, so the suppliers run concurrently; results are then
//! collected in roster order and any failure becomes a zero-metric entry.

use std::sync::Arc;

use restate_sdk::prelude::*;
use tracing::{info, warn};

use super::supplier_sync::SupplierSyncWorkflowClient;
use crate::common::EmptyRequest;
use crate::config::SyncConfig;
use crate::domains::sync::models::{
    fan_out_workflow_id, FanOutReport, FanOutRequest, SyncRequest, SyncResult,
};
use crate::domains::sync::restate::now_millis;
use crate::domains::sync::workflows::catalog_sync::log_report;

const REPORT_KEY: &str = "report";

#[restate_sdk::workflow]
#[name = "CatalogSyncWorkflow"]
pub trait CatalogSyncWorkflow {
    async fn run(req: FanOutRequest) -> Result<FanOutReport, HandlerError>;

    #[shared]
    async fn get_report(req: EmptyRequest) -> Result<FanOutReport, HandlerError>;
}

pub struct CatalogSyncWorkflowImpl {
    config: Arc<SyncConfig>,
}

impl CatalogSyncWorkflowImpl {
    pub fn with_config(config: Arc<SyncConfig>) -> Self {
        Self { config }
    }
}

impl CatalogSyncWorkflow for CatalogSyncWorkflowImpl {
    async fn run(
        &self,
        ctx: WorkflowContext<'_>,
        req: FanOutRequest,
    ) -> Result<FanOutReport, HandlerError> {
        let roster = &self.config.roster;
        info!(
            workflow_id = %ctx.key(),
            mode = %req.mode,
            suppliers = roster.len(),
            "Starting catalog sync workflow"
        );

        let stamp = ctx
            .run(|| async { Ok(now_millis()) })
            .name("started_at")
            .await? as i64;

        let calls: Vec<_> = roster
            .iter()
            .map(|supplier| {
                let request = SyncRequest {
                    supplier: supplier.clone(),
                    mode: req.mode,
                    categories: req.categories.clone(),
                };
                ctx.workflow_client::<SupplierSyncWorkflowClient>(fan_out_workflow_id(
                    req.mode, supplier, stamp,
                ))
                    .run(request)
                    .call()
            })
            .collect();

        let mut results = Vec::with_capacity(roster.len());
        for (supplier, call) in roster.iter().zip(calls) {
            match call.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(supplier = %supplier, error = %e, "Supplier workflow failed");
                    results.push(SyncResult::failed_placeholder(supplier));
                }
            }
        }

        let report = FanOutReport { results };
        log_report(req.mode, &report);
        ctx.set(REPORT_KEY, report.clone());
        Ok(report)
    }

    async fn get_report(
        &self,
        ctx: SharedWorkflowContext<'_>,
        _req: EmptyRequest,
    ) -> Result<FanOutReport, HandlerError> {
        Ok(ctx
            .get::<FanOutReport>(REPORT_KEY)
            .await?
            .unwrap_or_default())
    }
}
