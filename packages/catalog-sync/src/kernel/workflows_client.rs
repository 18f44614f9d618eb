//! Restate workflow client
//!
//! Starts workflows through the Restate ingress and queries their status.
//! The workflow id is the Restate workflow key, so a second start for a key
//! Restate has already accepted comes back as `PreviouslyAccepted`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::WorkflowStarter;
use crate::common::EmptyRequest;
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{SyncStatus, WorkflowRef, WorkflowStart};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    invocation_id: String,
    #[serde(default)]
    status: Option<String>,
}

/// Client for starting Restate workflows via HTTP
#[derive(Clone)]
pub struct RestateWorkflowStarter {
    base_url: String,
    http_client: Arc<reqwest::Client>,
}

impl RestateWorkflowStarter {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: Arc::new(reqwest::Client::new()),
        }
    }

    fn handler_url(&self, workflow: &str, key: &str, handler: &str) -> String {
        format!("{}/{}/{}/{}", self.base_url, workflow, key, handler)
    }

    async fn post_send<Req: Serialize + ?Sized>(
        &self,
        url: &str,
        workflow_id: &str,
        body: &Req,
    ) -> Result<String, SyncError> {
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| SyncError::Runtime(format!("failed to start workflow: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SyncError::Runtime(format!(
                "failed to start workflow ({}): {}",
                status, body
            )));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Runtime(format!("invalid ingress response: {}", e)))?;

        if sent.status.as_deref() == Some("PreviouslyAccepted") {
            return Err(SyncError::AlreadyRunning(workflow_id.to_string()));
        }

        tracing::debug!(
            workflow_id,
            invocation_id = %sent.invocation_id,
            "workflow accepted"
        );
        Ok(sent.invocation_id)
    }

    /// Query a supplier workflow's live status.
    pub async fn get_status(&self, workflow_id: &str) -> Result<SyncStatus, SyncError> {
        let url = self.handler_url("SupplierSyncWorkflow", workflow_id, "get_status");

        let response = self
            .http_client
            .post(&url)
            .json(&EmptyRequest::default())
            .send()
            .await
            .map_err(|e| SyncError::Runtime(format!("failed to query workflow: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Runtime(format!(
                "status query failed ({}): {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SyncError::Runtime(format!("invalid status response: {}", e)))
    }
}

#[async_trait]
impl WorkflowStarter for RestateWorkflowStarter {
    async fn start_workflow(&self, start: WorkflowStart) -> Result<String, SyncError> {
        let name = start.workflow.workflow_name();
        let url = self.handler_url(name, &start.workflow_id, "run/send");

        tracing::info!(
            workflow = name,
            workflow_id = %start.workflow_id,
            task_queue = %start.task_queue,
            "starting Restate workflow"
        );

        match &start.workflow {
            WorkflowRef::SupplierSync { .. } => {
                let request = start.supplier_request().ok_or_else(|| {
                    SyncError::Runtime("supplier start without a supplier".to_string())
                })?;
                self.post_send(&url, &start.workflow_id, &request).await?;
            }
            WorkflowRef::CatalogSync => {
                self.post_send(&url, &start.workflow_id, &start.fan_out_request())
                    .await?;
            }
            WorkflowRef::StockCheck => {
                self.post_send(&url, &start.workflow_id, &EmptyRequest::default())
                    .await?;
            }
        }

        Ok(start.workflow_id)
    }
}
