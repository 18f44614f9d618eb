//! Schedule runner
//!
//! Registers the default schedules and starts workflows when they fire.
//! Starts go to Restate by default; `--local` runs executions in-process
//! instead, which needs no Restate deployment.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use catalog_sync_core::domains::schedules::{register_defaults, ScheduleRegistry};
use catalog_sync_core::kernel::{
    LocalRuntime, RestateWorkflowStarter, ScheduleRunner, SyncDeps, WorkflowStarter,
};
use catalog_sync_core::Config;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Finished local executions are kept this long for inspection
const RETENTION_HOURS: i64 = 24;

#[derive(Parser)]
#[command(name = "scheduler")]
#[command(about = "Run the catalog sync schedules")]
struct Cli {
    /// Execute workflows in this process instead of starting them on Restate
    #[arg(long)]
    local: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,catalog_sync_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let sync = Arc::new(config.sync.clone());

    let registry = ScheduleRegistry::new();
    register_defaults(&registry, &sync)
        .await
        .context("Failed to register default schedules")?;

    let local = cli
        .local
        .then(|| LocalRuntime::new(Arc::new(SyncDeps::from_config(&config)), sync.clone()));
    let starter: Arc<dyn WorkflowStarter> = match &local {
        Some(runtime) => Arc::new(runtime.clone()),
        None => Arc::new(RestateWorkflowStarter::new(&config.restate_ingress_url)),
    };

    let runner = ScheduleRunner::start(&registry, starter, sync.task_queue.clone()).await?;
    tracing::info!(
        schedules = runner.job_count().await,
        local = cli.local,
        "Scheduler running, press Ctrl+C to stop"
    );

    let mut prune = tokio::time::interval(Duration::from_secs(3600));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = prune.tick() => {
                if let Some(runtime) = &local {
                    runtime
                        .prune_finished(chrono::Duration::hours(RETENTION_HOURS))
                        .await;
                }
            }
        }
    }

    tracing::info!("Shutting down scheduler");
    runner.shutdown().await
}
