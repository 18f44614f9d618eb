use serde::{Deserialize, Serialize};

use super::{SyncMode, SyncResult};
use crate::impl_restate_serde;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyEvent {
    #[serde(rename = "type")]
    pub kind: NotifyKind,
    pub supplier: String,
    pub message: String,
}

impl NotifyEvent {
    pub fn success(result: &SyncResult) -> Self {
        Self {
            kind: NotifyKind::Success,
            supplier: result.supplier.clone(),
            message: format!(
                "Synced {} products ({} created, {} updated, {} errors) in {}ms",
                result.products_extracted,
                result.products_created,
                result.products_updated,
                result.errors,
                result.duration_ms
            ),
        }
    }

    pub fn error(supplier: &str, message: impl Into<String>) -> Self {
        Self {
            kind: NotifyKind::Error,
            supplier: supplier.to_string(),
            message: message.into(),
        }
    }
}

/// Result of a best-effort notification. Logged by the workflow, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotifyOutcome {
    Delivered,
    Failed { error: String },
}

impl_restate_serde!(NotifyOutcome);

impl NotifyOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotifyOutcome::Delivered)
    }
}

/// When a workflow sends its terminal notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPolicy {
    Always,
    ErrorsOnly,
}

impl NotifyPolicy {
    /// Stock checks run every half hour, so only their failures are announced.
    pub fn for_mode(mode: SyncMode) -> Self {
        match mode {
            SyncMode::StockOnly => NotifyPolicy::ErrorsOnly,
            _ => NotifyPolicy::Always,
        }
    }

    pub fn on_success(&self) -> bool {
        matches!(self, NotifyPolicy::Always)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_delivered_or_failed() {
        let failed: NotifyOutcome =
            serde_json::from_str(r#"{"outcome":"failed","error":"timeout"}"#).unwrap();
        assert!(!failed.is_delivered());
        assert!(serde_json::from_str::<NotifyOutcome>(r#"{"outcome":"delivered"}"#)
            .unwrap()
            .is_delivered());
        assert!(serde_json::from_str::<NotifyOutcome>(r#"{"outcome":"skipped"}"#).is_err());
    }

    #[test]
    fn stock_checks_stay_quiet_on_success() {
        assert!(!NotifyPolicy::for_mode(SyncMode::StockOnly).on_success());
        assert!(NotifyPolicy::for_mode(SyncMode::PriceOnly).on_success());
    }
}
