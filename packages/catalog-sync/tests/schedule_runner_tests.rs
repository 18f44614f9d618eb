//! Schedule runner: jobs follow the registry across start, sync and shutdown.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use catalog_sync_core::domains::schedules::loader::{FULL_SYNC_DAILY, STOCK_CHECK_30M};
use catalog_sync_core::domains::schedules::{register_defaults, Schedule, ScheduleRegistry, Trigger};
use catalog_sync_core::domains::sync::errors::SyncError;
use catalog_sync_core::domains::sync::models::{SyncMode, WorkflowArgs, WorkflowRef, WorkflowStart};
use catalog_sync_core::kernel::{RunnerSync, ScheduleRunner, WorkflowStarter};
use catalog_sync_core::SyncConfig;
use common::*;

#[derive(Default)]
struct RecordingStarter {
    starts: Mutex<Vec<WorkflowStart>>,
}

#[async_trait]
impl WorkflowStarter for RecordingStarter {
    async fn start_workflow(&self, start: WorkflowStart) -> Result<String, SyncError> {
        let id = start.workflow_id.clone();
        self.starts.lock().unwrap().push(start);
        Ok(id)
    }
}

async fn defaults() -> ScheduleRegistry {
    let registry = ScheduleRegistry::new();
    register_defaults(&registry, &SyncConfig::default())
        .await
        .unwrap();
    registry
}

#[tokio::test]
async fn runner_reconciles_jobs_with_the_registry() {
    init_tracing();
    let registry = defaults().await;
    let starter = Arc::new(RecordingStarter::default());

    let runner = ScheduleRunner::start(&registry, starter.clone(), "catalog-sync")
        .await
        .unwrap();
    assert_eq!(runner.job_count().await, 4);

    // nothing changed
    assert_eq!(runner.sync(&registry).await.unwrap(), RunnerSync::default());

    registry
        .register(
            Schedule::builder()
                .id(FULL_SYNC_DAILY)
                .trigger(Trigger::cron("0 0 3 * * *"))
                .target(WorkflowRef::CatalogSync)
                .args(WorkflowArgs::mode(SyncMode::Full))
                .build(),
        )
        .await
        .unwrap();
    registry.remove(STOCK_CHECK_30M).await.unwrap();

    assert_eq!(
        runner.sync(&registry).await.unwrap(),
        RunnerSync {
            added: 0,
            replaced: 1,
            removed: 1,
        }
    );
    assert_eq!(runner.job_count().await, 3);

    runner.shutdown().await.unwrap();
}

#[tokio::test]
async fn disabled_schedules_get_no_job() {
    let registry = ScheduleRegistry::new();
    registry
        .register(
            Schedule::builder()
                .id("paused-nightly")
                .trigger(Trigger::cron("0 0 1 * * *"))
                .target(WorkflowRef::CatalogSync)
                .enabled(false)
                .build(),
        )
        .await
        .unwrap();
    registry
        .register(
            Schedule::builder()
                .id("acme-hourly")
                .trigger(Trigger::every(Duration::from_secs(3600)))
                .target(WorkflowRef::SupplierSync {
                    supplier: "acme".to_string(),
                })
                .build(),
        )
        .await
        .unwrap();

    let runner = ScheduleRunner::start(&registry, Arc::new(RecordingStarter::default()), "q")
        .await
        .unwrap();
    assert_eq!(runner.job_count().await, 1);

    registry.remove("acme-hourly").await.unwrap();
    assert_eq!(runner.sync(&registry).await.unwrap().removed, 1);
    assert_eq!(runner.job_count().await, 0);

    runner.shutdown().await.unwrap();
}
