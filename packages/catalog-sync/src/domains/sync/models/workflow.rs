use serde::{Deserialize, Serialize};

use super::{ResultStatus, SyncMode, SyncRequest, SyncResult};
use crate::impl_restate_serde;

/// Workflow a trigger starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "workflow", rename_all = "snake_case")]
pub enum WorkflowRef {
    /// Fan-out over the whole supplier roster.
    CatalogSync,
    /// A single supplier's sync workflow.
    SupplierSync { supplier: String },
    /// Stock-only pass over the roster.
    StockCheck,
}

impl WorkflowRef {
    /// Registered workflow name on the durable runtime.
    pub fn workflow_name(&self) -> &'static str {
        match self {
            WorkflowRef::CatalogSync => "CatalogSyncWorkflow",
            WorkflowRef::SupplierSync { .. } => "SupplierSyncWorkflow",
            WorkflowRef::StockCheck => "StockCheckWorkflow",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SyncMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl WorkflowArgs {
    pub fn mode(mode: SyncMode) -> Self {
        Self {
            mode: Some(mode),
            categories: None,
        }
    }
}

/// A start command handed to the durable-execution runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStart {
    pub workflow: WorkflowRef,
    pub args: WorkflowArgs,
    pub task_queue: String,
    pub workflow_id: String,
}

impl WorkflowStart {
    /// Request for a single-supplier start; `None` for roster-wide workflows.
    pub fn supplier_request(&self) -> Option<SyncRequest> {
        match &self.workflow {
            WorkflowRef::SupplierSync { supplier } => Some(SyncRequest {
                supplier: supplier.clone(),
                mode: self.args.mode.unwrap_or_default(),
                categories: self.args.categories.clone(),
            }),
            _ => None,
        }
    }

    /// Request for a roster-wide start.
    pub fn fan_out_request(&self) -> FanOutRequest {
        let mode = match self.workflow {
            WorkflowRef::StockCheck => SyncMode::StockOnly,
            _ => self.args.mode.unwrap_or_default(),
        };
        FanOutRequest {
            mode,
            categories: self.args.categories.clone(),
        }
    }
}

/// Execution identity for one supplier run: `<supplier>-<unix millis>`.
pub fn workflow_id_for(supplier: &str, at_millis: i64) -> String {
    format!("{}-{}", supplier, at_millis)
}

/// Execution id of one supplier run started by a roster-wide workflow:
/// `<mode>-<supplier>-<unix millis>`. The mode keeps fan-outs that fire in
/// the same millisecond (hourly price sync and the stock check) apart.
pub fn fan_out_workflow_id(mode: SyncMode, supplier: &str, at_millis: i64) -> String {
    format!("{}-{}", mode.as_str(), workflow_id_for(supplier, at_millis))
}

/// Input of the roster-wide workflows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutRequest {
    #[serde(default)]
    pub mode: SyncMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl_restate_serde!(FanOutRequest);

/// Aggregate of a roster-wide run, one entry per roster member in roster order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOutReport {
    pub results: Vec<SyncResult>,
}

impl_restate_serde!(FanOutReport);

impl FanOutReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn partial(&self) -> usize {
        self.count(ResultStatus::Partial)
    }

    pub fn failed(&self) -> usize {
        self.count(ResultStatus::Failed)
    }

    fn count(&self, status: ResultStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}
