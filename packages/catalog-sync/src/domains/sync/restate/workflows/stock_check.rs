//! Stock check workflow (durable)
//!
//! Runs every roster supplier in `stock_only` mode. Supplier workflows only
//! notify on failure in this mode.

use std::sync::Arc;

use restate_sdk::prelude::*;
use tracing::warn;

use super::supplier_sync::SupplierSyncWorkflowClient;
use crate::common::EmptyRequest;
use crate::config::SyncConfig;
use crate::domains::sync::models::{
    fan_out_workflow_id, FanOutReport, SyncMode, SyncRequest, SyncResult,
};
use crate::domains::sync::restate::now_millis;
use crate::domains::sync::workflows::catalog_sync::log_report;

#[restate_sdk::workflow]
#[name = "StockCheckWorkflow"]
pub trait StockCheckWorkflow {
    async fn run(req: EmptyRequest) -> Result<FanOutReport, HandlerError>;
}

pub struct StockCheckWorkflowImpl {
    config: Arc<SyncConfig>,
}

impl StockCheckWorkflowImpl {
    pub fn with_config(config: Arc<SyncConfig>) -> Self {
        Self { config }
    }
}

impl StockCheckWorkflow for StockCheckWorkflowImpl {
    async fn run(
        &self,
        ctx: WorkflowContext<'_>,
        _req: EmptyRequest,
    ) -> Result<FanOutReport, HandlerError> {
        let roster = &self.config.roster;

        let stamp = ctx
            .run(|| async { Ok(now_millis()) })
            .name("started_at")
            .await? as i64;

        let calls: Vec<_> = roster
            .iter()
            .map(|supplier| {
                let workflow_id = fan_out_workflow_id(SyncMode::StockOnly, supplier, stamp);
                ctx.workflow_client::<SupplierSyncWorkflowClient>(workflow_id)
                    .run(SyncRequest::new(supplier.as_str(), SyncMode::StockOnly))
                    .call()
            })
            .collect();

        let mut results = Vec::with_capacity(roster.len());
        for (supplier, call) in roster.iter().zip(calls) {
            match call.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(supplier = %supplier, error = %e, "Stock check failed");
                    results.push(SyncResult::failed_placeholder(supplier));
                }
            }
        }

        let report = FanOutReport { results };
        log_report(SyncMode::StockOnly, &report);
        Ok(report)
    }
}
