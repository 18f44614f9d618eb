//! Restate Workflow Server
//!
//! This binary runs the Restate workflow HTTP server that handles
//! durable sync executions.

use std::sync::Arc;

use anyhow::Result;
use catalog_sync_core::domains::sync::restate::{
    CatalogSyncWorkflow, CatalogSyncWorkflowImpl, StockCheckWorkflow, StockCheckWorkflowImpl,
    SupplierSyncWorkflow, SupplierSyncWorkflowImpl,
};
use catalog_sync_core::kernel::SyncDeps;
use catalog_sync_core::Config;
use restate_sdk::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,catalog_sync_core=debug,restate_sdk=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Restate Workflow Server");

    let config = Config::from_env()?;
    let deps = Arc::new(SyncDeps::from_config(&config));
    let sync = Arc::new(config.sync.clone());

    tracing::info!(
        suppliers = sync.roster.len(),
        task_queue = %sync.task_queue,
        gateway = %config.supplier_gateway_url,
        "Sync configuration loaded"
    );

    let addr = format!("0.0.0.0:{}", config.workflow_server_port);
    tracing::info!("Workflow server listening on {}", addr);

    let endpoint = Endpoint::builder()
        .bind(SupplierSyncWorkflowImpl::with_deps(deps.clone(), sync.clone()).serve())
        .bind(CatalogSyncWorkflowImpl::with_config(sync.clone()).serve())
        .bind(StockCheckWorkflowImpl::with_config(sync).serve())
        .build();

    HttpServer::new(endpoint)
        .listen_and_serve(addr.parse()?)
        .await;

    Ok(())
}
