//! Operator trigger: run one supplier sync to completion.
//!
//! Runs in-process against the configured supplier gateway, prints the
//! result metrics (zeroed on failure) and exits non-zero unless the sync
//! fully succeeded.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use catalog_sync_core::domains::sync::models::{
    workflow_id_for, SyncMode, SyncRequest, SyncResult,
};
use catalog_sync_core::kernel::{LocalRuntime, SyncDeps};
use catalog_sync_core::Config;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sync_once")]
#[command(about = "Sync one supplier catalog and print the result")]
struct Cli {
    /// Supplier to sync
    #[arg(long)]
    supplier: String,

    /// full, incremental, price_only or stock_only
    #[arg(long, default_value = "incremental")]
    mode: SyncMode,

    /// Restrict the sync to a category (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Execution id (defaults to <supplier>-<unix millis>)
    #[arg(long)]
    workflow_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,catalog_sync_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let runtime = LocalRuntime::new(
        Arc::new(SyncDeps::from_config(&config)),
        Arc::new(config.sync.clone()),
    );

    let workflow_id = cli.workflow_id.unwrap_or_else(|| {
        workflow_id_for(&cli.supplier, chrono::Utc::now().timestamp_millis())
    });
    let supplier = cli.supplier;
    let request = SyncRequest::new(supplier.clone(), cli.mode).with_categories(cli.categories);

    let handle = runtime.start_supplier_sync(workflow_id.clone(), request).await?;
    println!("Started {}", workflow_id);

    match handle.clone().wait().await {
        Ok(result) => {
            print_summary(&result);
            Ok(if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(e) => {
            let result = handle
                .status()
                .result
                .unwrap_or_else(|| SyncResult::failed(&supplier, Duration::ZERO));
            print_summary(&result);
            eprintln!("Sync failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_summary(result: &SyncResult) {
    for line in result.summary_lines() {
        println!("{}", line);
    }
}
