//! Sync dependencies for activities (using traits for testability)
//!
//! Every external collaborator is injected through a port trait so workflows
//! can run against the supplier gateway in production and mocks in tests.

use std::sync::Arc;

use crate::config::Config;
use crate::kernel::{
    AuthPort, ExtractionPort, LogNotifier, NotifyPort, PersistencePort, SupplierGatewayClient,
    WebhookNotifier,
};

/// Collaborators shared by all workflow executions
#[derive(Clone)]
pub struct SyncDeps {
    pub auth: Arc<dyn AuthPort>,
    pub extractor: Arc<dyn ExtractionPort>,
    pub store: Arc<dyn PersistencePort>,
    pub notifier: Arc<dyn NotifyPort>,
}

impl SyncDeps {
    pub fn new(
        auth: Arc<dyn AuthPort>,
        extractor: Arc<dyn ExtractionPort>,
        store: Arc<dyn PersistencePort>,
        notifier: Arc<dyn NotifyPort>,
    ) -> Self {
        Self {
            auth,
            extractor,
            store,
            notifier,
        }
    }

    /// Production wiring: the supplier gateway serves auth, extraction and
    /// persistence; notifications go to the webhook when one is configured.
    pub fn from_config(config: &Config) -> Self {
        let gateway = Arc::new(SupplierGatewayClient::new(&config.supplier_gateway_url));

        let notifier: Arc<dyn NotifyPort> = match &config.notify_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url)),
            None => {
                tracing::warn!("NOTIFY_WEBHOOK_URL not set, notifications will only be logged");
                Arc::new(LogNotifier)
            }
        };

        Self::new(gateway.clone(), gateway.clone(), gateway, notifier)
    }
}
