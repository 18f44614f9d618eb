use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_restate_serde;

/// How much of a supplier catalog a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    Full,
    #[default]
    Incremental,
    PriceOnly,
    /// Stock levels only; used by the stock-check workflow.
    StockOnly,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Full => "full",
            SyncMode::Incremental => "incremental",
            SyncMode::PriceOnly => "price_only",
            SyncMode::StockOnly => "stock_only",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "full" => Ok(SyncMode::Full),
            "incremental" => Ok(SyncMode::Incremental),
            "price_only" | "price" => Ok(SyncMode::PriceOnly),
            "stock_only" | "stock" => Ok(SyncMode::StockOnly),
            other => Err(format!("unknown sync mode: {}", other)),
        }
    }
}

/// The unit of work requested by a trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub supplier: String,
    #[serde(default)]
    pub mode: SyncMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl_restate_serde!(SyncRequest);

impl SyncRequest {
    pub fn new(supplier: impl Into<String>, mode: SyncMode) -> Self {
        Self {
            supplier: supplier.into(),
            mode,
            categories: None,
        }
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = if categories.is_empty() {
            None
        } else {
            Some(categories)
        };
        self
    }
}

/// Operational tuning applied to every extraction the workflow dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionDefaults {
    pub batch_size: u32,
    pub concurrency: u32,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for ExtractionDefaults {
    fn default() -> Self {
        Self {
            batch_size: 50,
            concurrency: 3,
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Parameters for one extraction run, sent to the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionParams {
    pub supplier: String,
    pub mode: SyncMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    pub batch_size: u32,
    pub concurrency: u32,
    pub timeout_ms: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl ExtractionParams {
    pub fn from_request(request: &SyncRequest, defaults: &ExtractionDefaults) -> Self {
        Self {
            supplier: request.supplier.clone(),
            mode: request.mode,
            categories: request.categories.clone(),
            batch_size: defaults.batch_size,
            concurrency: defaults.concurrency,
            timeout_ms: defaults.timeout.as_millis() as u64,
            retry_attempts: defaults.retry_attempts,
            retry_delay_ms: defaults.retry_delay.as_millis() as u64,
        }
    }
}

/// Portal session returned by the authentication collaborator.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_cli_spellings() {
        assert_eq!("price-only".parse::<SyncMode>().unwrap(), SyncMode::PriceOnly);
        assert_eq!("FULL".parse::<SyncMode>().unwrap(), SyncMode::Full);
        assert!("weekly".parse::<SyncMode>().is_err());
    }

    #[test]
    fn mode_serializes_snake_case() {
        let json = serde_json::to_string(&SyncMode::PriceOnly).unwrap();
        assert_eq!(json, "\"price_only\"");
    }

    #[test]
    fn params_carry_workflow_defaults() {
        let request = SyncRequest::new("acme", SyncMode::Full)
            .with_categories(vec!["fasteners".to_string()]);
        let params = ExtractionParams::from_request(&request, &ExtractionDefaults::default());

        assert_eq!(params.batch_size, 50);
        assert_eq!(params.concurrency, 3);
        assert_eq!(params.timeout_ms, 30_000);
        assert_eq!(params.retry_attempts, 3);
        assert_eq!(params.retry_delay_ms, 1_000);
        assert_eq!(params.categories, Some(vec!["fasteners".to_string()]));
    }

    #[test]
    fn empty_category_filter_means_all() {
        let request = SyncRequest::new("acme", SyncMode::Full).with_categories(vec![]);
        assert_eq!(request.categories, None);
    }

    #[test]
    fn session_debug_hides_token() {
        let session = Session {
            token: "secret-token".to_string(),
            expires_at: Utc::now(),
        };
        assert!(!format!("{:?}", session).contains("secret-token"));
    }
}
