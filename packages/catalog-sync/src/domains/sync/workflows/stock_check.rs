//! Stock-check workflow
//!
//! A stock-only pass over the roster. Each supplier runs the same pipeline in
//! `stock_only` mode, which only announces failures.

use std::sync::Arc;

use chrono::Utc;

use super::catalog_sync::{log_report, settle_all};
use crate::config::SyncConfig;
use crate::domains::sync::models::{fan_out_workflow_id, FanOutReport, SyncMode, SyncRequest};
use crate::kernel::LocalRuntime;

pub struct StockCheckWorkflow {
    runtime: LocalRuntime,
    config: Arc<SyncConfig>,
}

impl StockCheckWorkflow {
    pub fn new(runtime: LocalRuntime, config: Arc<SyncConfig>) -> Self {
        Self { runtime, config }
    }

    pub async fn run(&self) -> FanOutReport {
        let stamp = Utc::now().timestamp_millis();

        let results = settle_all(&self.config.roster, |supplier| {
            let request = SyncRequest::new(supplier, SyncMode::StockOnly);
            let workflow_id = fan_out_workflow_id(SyncMode::StockOnly, supplier, stamp);
            async move {
                let handle = self.runtime.start_supplier_sync(workflow_id, request).await?;
                handle.wait().await
            }
        })
        .await;

        let report = FanOutReport { results };
        log_report(SyncMode::StockOnly, &report);
        report
    }
}
