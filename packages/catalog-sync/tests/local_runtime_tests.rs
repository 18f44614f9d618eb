//! Local runtime: execution identity, overlap policy, retention and the
//! workflow start port.

mod common;

use std::time::Duration;

use catalog_sync_core::domains::sync::errors::SyncError;
use catalog_sync_core::domains::sync::models::{
    SyncMode, SyncRequest, SyncState, WorkflowArgs, WorkflowRef, WorkflowStart,
};
use catalog_sync_core::kernel::test_dependencies::MockExtractor;
use catalog_sync_core::kernel::{TestDependencies, WorkflowStarter};
use catalog_sync_core::OverlapPolicy;
use common::*;

fn slow_extractor() -> TestDependencies {
    TestDependencies::new().mock_extractor(MockExtractor::new().with_delay(Duration::from_secs(30)))
}

#[tokio::test(start_paused = true)]
async fn active_workflow_id_cannot_be_started_twice() {
    let harness = TestHarness::with_overlap(slow_extractor(), OverlapPolicy::Allow);
    let request = SyncRequest::new("acme", SyncMode::Full);

    let first = harness
        .runtime
        .start_supplier_sync("acme-1", request.clone())
        .await
        .unwrap();

    let err = harness
        .runtime
        .start_supplier_sync("acme-1", request.clone())
        .await
        .err()
        .expect("duplicate id must be rejected");
    assert!(matches!(err, SyncError::AlreadyRunning(id) if id == "acme-1"));

    first.wait().await.unwrap();

    // finished ids may be reused
    let again = harness
        .runtime
        .start_supplier_sync("acme-1", request)
        .await
        .unwrap();
    assert!(again.wait().await.is_ok());
    assert_eq!(harness.deps.auth.call_count_for("acme"), 2);
}

#[tokio::test(start_paused = true)]
async fn skip_policy_rejects_overlapping_supplier_runs() {
    let harness = TestHarness::with_overlap(slow_extractor(), OverlapPolicy::Skip);

    harness
        .runtime
        .start_supplier_sync("acme-1", SyncRequest::new("acme", SyncMode::Full))
        .await
        .unwrap();

    let err = harness
        .runtime
        .start_supplier_sync("acme-2", SyncRequest::new("acme", SyncMode::Incremental))
        .await
        .err()
        .expect("overlap must be rejected");
    match err {
        SyncError::SupplierBusy {
            supplier,
            workflow_id,
        } => {
            assert_eq!(supplier, "acme");
            assert_eq!(workflow_id, "acme-1");
        }
        other => panic!("unexpected error: {other}"),
    }

    // other suppliers are unaffected
    assert!(harness
        .runtime
        .start_supplier_sync("globex-1", SyncRequest::new("globex", SyncMode::Full))
        .await
        .is_ok());
}

#[tokio::test(start_paused = true)]
async fn serialize_policy_queues_the_second_supplier_run() {
    let harness = TestHarness::with_overlap(slow_extractor(), OverlapPolicy::Serialize);
    let started = tokio::time::Instant::now();

    let first = harness
        .runtime
        .start_supplier_sync("acme-1", SyncRequest::new("acme", SyncMode::Full))
        .await
        .unwrap();
    let second = harness
        .runtime
        .start_supplier_sync("acme-2", SyncRequest::new("acme", SyncMode::PriceOnly))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(second.status().state, SyncState::Pending);
    assert_eq!(harness.deps.extractor.call_count_for("acme"), 1);

    assert!(first.wait().await.is_ok());
    assert!(second.wait().await.is_ok());
    assert_eq!(started.elapsed(), Duration::from_secs(60));

    let modes: Vec<_> = harness.deps.extractor.calls().iter().map(|p| p.mode).collect();
    assert_eq!(modes, vec![SyncMode::Full, SyncMode::PriceOnly]);
}

#[tokio::test(start_paused = true)]
async fn allow_policy_runs_overlapping_supplier_syncs() {
    let harness = TestHarness::with_overlap(slow_extractor(), OverlapPolicy::Allow);

    let a = harness
        .runtime
        .start_supplier_sync("acme-1", SyncRequest::new("acme", SyncMode::Full))
        .await
        .unwrap();
    let b = harness
        .runtime
        .start_supplier_sync("acme-2", SyncRequest::new("acme", SyncMode::Incremental))
        .await
        .unwrap();

    assert_eq!(
        harness.runtime.active_executions().await,
        vec!["acme-1".to_string(), "acme-2".to_string()]
    );
    assert!(a.wait().await.is_ok());
    assert!(b.wait().await.is_ok());
    assert!(harness.runtime.active_executions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unknown_ids_have_no_status() {
    let harness = TestHarness::with_roster(TestDependencies::new(), &["acme"]);

    assert!(harness.runtime.status("nope").await.is_none());
    assert!(matches!(
        harness.runtime.wait("nope").await,
        Err(SyncError::Runtime(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn wait_by_id_returns_the_result() {
    let harness = TestHarness::with_roster(TestDependencies::new(), &["acme"]);

    harness
        .runtime
        .start_supplier_sync("acme-1", SyncRequest::new("acme", SyncMode::Full))
        .await
        .unwrap();

    let result = harness.runtime.wait("acme-1").await.unwrap();
    assert_eq!(result.supplier, "acme");
    assert_eq!(
        harness.runtime.status("acme-1").await.unwrap().state,
        SyncState::Succeeded
    );
}

#[tokio::test(start_paused = true)]
async fn prune_drops_only_finished_records_past_retention() {
    let harness = TestHarness::with_overlap(TestDependencies::new(), OverlapPolicy::Allow);

    harness
        .runtime
        .start_supplier_sync("acme-1", SyncRequest::new("acme", SyncMode::Full))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(harness.runtime.prune_finished(chrono::Duration::hours(1)).await, 0);
    assert!(harness.runtime.status("acme-1").await.is_some());

    assert_eq!(harness.runtime.prune_finished(chrono::Duration::zero()).await, 1);
    assert!(harness.runtime.status("acme-1").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn prune_keeps_active_executions() {
    let harness = TestHarness::with_overlap(slow_extractor(), OverlapPolicy::Allow);

    let handle = harness
        .runtime
        .start_supplier_sync("acme-1", SyncRequest::new("acme", SyncMode::Full))
        .await
        .unwrap();

    assert_eq!(harness.runtime.prune_finished(chrono::Duration::zero()).await, 0);
    handle.wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn starter_dispatches_supplier_workflows() {
    let harness = TestHarness::with_roster(TestDependencies::new(), &["acme"]);

    let id = harness
        .runtime
        .start_workflow(WorkflowStart {
            workflow: WorkflowRef::SupplierSync {
                supplier: "acme".to_string(),
            },
            args: WorkflowArgs::mode(SyncMode::Full),
            task_queue: "catalog-sync".to_string(),
            workflow_id: "acme-42".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(id, "acme-42");
    harness.runtime.wait("acme-42").await.unwrap();
    assert_eq!(harness.deps.extractor.calls()[0].mode, SyncMode::Full);
}

#[tokio::test(start_paused = true)]
async fn starter_dispatches_roster_workflows_in_the_background() {
    let harness = TestHarness::with_roster(TestDependencies::new(), &["acme", "globex"]);

    let id = harness
        .runtime
        .start_workflow(WorkflowStart {
            workflow: WorkflowRef::StockCheck,
            args: WorkflowArgs::default(),
            task_queue: "catalog-sync".to_string(),
            workflow_id: "stock-check-30m-1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(id, "stock-check-30m-1");

    tokio::time::sleep(Duration::from_secs(1)).await;

    let mut persisted = harness.deps.store.persisted_suppliers();
    persisted.sort();
    assert_eq!(persisted, vec!["acme", "globex"]);
    assert!(harness
        .deps
        .extractor
        .calls()
        .iter()
        .all(|p| p.mode == SyncMode::StockOnly));
}
