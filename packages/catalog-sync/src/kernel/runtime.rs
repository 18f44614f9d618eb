//! In-process workflow runtime.
//!
//! Owns the execution table: every supplier execution is addressed by its
//! workflow id, spawned as its own task, and kept as a record (status handle
//! plus eventual outcome) until pruned. The table is the only state shared
//! between concurrent executions.
//!
//! # Collision policy
//!
//! - A workflow id that is still active is rejected with
//!   [`SyncError::AlreadyRunning`]. Finished ids may be reused.
//! - With [`OverlapPolicy::Skip`] a second start for a supplier that has an
//!   active execution is rejected with [`SyncError::SupplierBusy`].
//! - With [`OverlapPolicy::Serialize`] (the default) the start is accepted
//!   and stays `pending` until every earlier execution for the supplier has
//!   finished, so runs for one supplier never overlap.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};

use crate::config::{OverlapPolicy, SyncConfig};
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{SyncRequest, SyncResult, SyncStatus, WorkflowRef, WorkflowStart};
use crate::domains::sync::workflows::{
    CatalogSyncCoordinator, StatusHandle, StockCheckWorkflow, SupplierSyncWorkflow,
};
use crate::kernel::{SyncDeps, WorkflowStarter};

/// Terminal outcome of one execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub result: Result<SyncResult, SyncError>,
    pub finished_at: DateTime<Utc>,
}

struct ExecutionRecord {
    supplier: String,
    status: StatusHandle,
    outcome: watch::Receiver<Option<ExecutionOutcome>>,
}

impl ExecutionRecord {
    fn is_active(&self) -> bool {
        self.outcome.borrow().is_none()
    }

    fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.outcome.borrow().as_ref().map(|o| o.finished_at)
    }
}

/// Resolves once the execution behind `outcome` has finished.
async fn settled(mut outcome: watch::Receiver<Option<ExecutionOutcome>>) {
    while outcome.borrow().is_none() {
        if outcome.changed().await.is_err() {
            return;
        }
    }
}

/// Handle to a started supplier execution.
#[derive(Clone)]
pub struct ExecutionHandle {
    workflow_id: String,
    status: StatusHandle,
    outcome: watch::Receiver<Option<ExecutionOutcome>>,
}

impl ExecutionHandle {
    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    pub fn status(&self) -> SyncStatus {
        self.status.current()
    }

    /// Wait for the execution to reach a terminal state.
    pub async fn wait(mut self) -> Result<SyncResult, SyncError> {
        loop {
            if let Some(outcome) = self.outcome.borrow().clone() {
                return outcome.result;
            }
            if self.outcome.changed().await.is_err() {
                return Err(SyncError::Runtime(format!(
                    "execution {} ended without an outcome",
                    self.workflow_id
                )));
            }
        }
    }
}

#[derive(Clone)]
pub struct LocalRuntime {
    deps: Arc<SyncDeps>,
    config: Arc<SyncConfig>,
    executions: Arc<RwLock<HashMap<String, ExecutionRecord>>>,
}

impl LocalRuntime {
    pub fn new(deps: Arc<SyncDeps>, config: Arc<SyncConfig>) -> Self {
        Self {
            deps,
            config,
            executions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start one supplier sync under `workflow_id`.
    pub async fn start_supplier_sync(
        &self,
        workflow_id: impl Into<String>,
        request: SyncRequest,
    ) -> Result<ExecutionHandle, SyncError> {
        let workflow_id = workflow_id.into();
        let mut executions = self.executions.write().await;

        if executions
            .get(&workflow_id)
            .is_some_and(ExecutionRecord::is_active)
        {
            warn!(workflow_id = %workflow_id, "rejecting duplicate start");
            return Err(SyncError::AlreadyRunning(workflow_id));
        }

        let mut ahead = Vec::new();
        match self.config.overlap_policy {
            OverlapPolicy::Allow => {}
            OverlapPolicy::Skip => {
                if let Some((active_id, _)) = executions
                    .iter()
                    .find(|(_, r)| r.supplier == request.supplier && r.is_active())
                {
                    warn!(
                        workflow_id = %workflow_id,
                        supplier = %request.supplier,
                        active = %active_id,
                        "supplier busy, skipping start"
                    );
                    return Err(SyncError::SupplierBusy {
                        supplier: request.supplier.clone(),
                        workflow_id: active_id.clone(),
                    });
                }
            }
            OverlapPolicy::Serialize => {
                ahead = executions
                    .values()
                    .filter(|r| r.supplier == request.supplier && r.is_active())
                    .map(|r| r.outcome.clone())
                    .collect();
                if !ahead.is_empty() {
                    info!(
                        workflow_id = %workflow_id,
                        supplier = %request.supplier,
                        queued_behind = ahead.len(),
                        "supplier busy, queueing start"
                    );
                }
            }
        }

        let workflow = SupplierSyncWorkflow::new(
            workflow_id.clone(),
            &request.supplier,
            self.deps.clone(),
            self.config.clone(),
        );
        let status = workflow.status_handle();
        let (outcome_tx, outcome_rx) = watch::channel(None);

        executions.insert(
            workflow_id.clone(),
            ExecutionRecord {
                supplier: request.supplier.clone(),
                status: status.clone(),
                outcome: outcome_rx.clone(),
            },
        );
        drop(executions);

        tokio::spawn(async move {
            for outcome in ahead {
                settled(outcome).await;
            }
            let result = workflow.run(request).await;
            outcome_tx.send_replace(Some(ExecutionOutcome {
                result,
                finished_at: Utc::now(),
            }));
        });

        Ok(ExecutionHandle {
            workflow_id,
            status,
            outcome: outcome_rx,
        })
    }

    /// Live status of an execution; `None` for unknown ids.
    pub async fn status(&self, workflow_id: &str) -> Option<SyncStatus> {
        self.executions
            .read()
            .await
            .get(workflow_id)
            .map(|r| r.status.current())
    }

    /// Handle for an existing execution, active or finished.
    pub async fn handle(&self, workflow_id: &str) -> Option<ExecutionHandle> {
        self.executions
            .read()
            .await
            .get(workflow_id)
            .map(|r| ExecutionHandle {
                workflow_id: workflow_id.to_string(),
                status: r.status.clone(),
                outcome: r.outcome.clone(),
            })
    }

    /// Block until `workflow_id` reaches a terminal state.
    pub async fn wait(&self, workflow_id: &str) -> Result<SyncResult, SyncError> {
        let handle = self
            .handle(workflow_id)
            .await
            .ok_or_else(|| SyncError::Runtime(format!("unknown workflow {}", workflow_id)))?;
        handle.wait().await
    }

    /// Ids of executions that have not reached a terminal state.
    pub async fn active_executions(&self) -> Vec<String> {
        let executions = self.executions.read().await;
        let mut active: Vec<String> = executions
            .iter()
            .filter(|(_, r)| r.is_active())
            .map(|(id, _)| id.clone())
            .collect();
        active.sort();
        active
    }

    /// Drop finished records older than `older_than`; returns how many were removed.
    pub async fn prune_finished(&self, older_than: ChronoDuration) -> usize {
        let cutoff = Utc::now() - older_than;
        let mut executions = self.executions.write().await;
        let before = executions.len();
        executions.retain(|_, r| match r.finished_at() {
            Some(finished_at) => finished_at > cutoff,
            None => true,
        });
        let pruned = before - executions.len();
        if pruned > 0 {
            info!(pruned, "pruned finished executions");
        }
        pruned
    }
}

#[async_trait]
impl WorkflowStarter for LocalRuntime {
    async fn start_workflow(&self, start: WorkflowStart) -> Result<String, SyncError> {
        info!(
            workflow = start.workflow.workflow_name(),
            workflow_id = %start.workflow_id,
            task_queue = %start.task_queue,
            "starting workflow"
        );

        match &start.workflow {
            WorkflowRef::SupplierSync { .. } => {
                let request = start.supplier_request().ok_or_else(|| {
                    SyncError::Runtime("supplier start without a supplier".to_string())
                })?;
                let handle = self.start_supplier_sync(&start.workflow_id, request).await?;
                Ok(handle.workflow_id().to_string())
            }
            WorkflowRef::CatalogSync => {
                let coordinator = CatalogSyncCoordinator::new(self.clone(), self.config.clone());
                let request = start.fan_out_request();
                let workflow_id = start.workflow_id.clone();
                tokio::spawn(async move {
                    let report = coordinator.run(request).await;
                    if report.failed() > 0 {
                        error!(
                            workflow_id = %workflow_id,
                            failed = report.failed(),
                            "catalog sync finished with failures"
                        );
                    }
                });
                Ok(start.workflow_id)
            }
            WorkflowRef::StockCheck => {
                let workflow = StockCheckWorkflow::new(self.clone(), self.config.clone());
                tokio::spawn(async move {
                    workflow.run().await;
                });
                Ok(start.workflow_id)
            }
        }
    }
}
