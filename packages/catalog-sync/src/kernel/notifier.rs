//! Notification transports

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::NotifyPort;
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::NotifyEvent;

/// Posts each event as JSON to a webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    http_client: Arc<reqwest::Client>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_client: Arc::new(reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl NotifyPort for WebhookNotifier {
    async fn notify(&self, event: &NotifyEvent) -> Result<(), SyncError> {
        let response = self
            .http_client
            .post(&self.url)
            .timeout(Duration::from_secs(10))
            .json(event)
            .send()
            .await
            .map_err(|e| SyncError::Notify(format!("webhook unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Notify(format!(
                "webhook returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

/// Writes events to the log. Used when no webhook is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotifyPort for LogNotifier {
    async fn notify(&self, event: &NotifyEvent) -> Result<(), SyncError> {
        info!(
            kind = ?event.kind,
            supplier = %event.supplier,
            message = %event.message,
            "sync notification"
        );
        Ok(())
    }
}
