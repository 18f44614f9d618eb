use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::impl_restate_serde;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failed,
    Partial,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResultStatus::Success => "success",
            ResultStatus::Failed => "failed",
            ResultStatus::Partial => "partial",
        })
    }
}

/// Product counts reported by an extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCounts {
    pub extracted: u64,
    pub created: u64,
    pub updated: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub status: ResultStatus,
    pub products_extracted: u64,
    pub products_created: u64,
    pub products_updated: u64,
    pub products_error: u64,
    #[serde(default)]
    pub pages_attempted: u32,
    #[serde(default)]
    pub pages_failed: u32,
}

impl_restate_serde!(ExtractionResult);

impl ExtractionResult {
    /// Build a result whose status is derived from page accounting.
    ///
    /// No failed pages is a success, every attempted page failing is a
    /// failure, and anything in between is partial.
    pub fn from_pages(pages_attempted: u32, pages_failed: u32, counts: ProductCounts) -> Self {
        Self {
            status: classify_pages(pages_attempted, pages_failed),
            products_extracted: counts.extracted,
            products_created: counts.created,
            products_updated: counts.updated,
            products_error: counts.errors,
            pages_attempted,
            pages_failed,
        }
    }

    pub fn success(counts: ProductCounts) -> Self {
        Self::from_pages(0, 0, counts)
    }
}

pub fn classify_pages(pages_attempted: u32, pages_failed: u32) -> ResultStatus {
    if pages_failed == 0 {
        ResultStatus::Success
    } else if pages_failed >= pages_attempted {
        ResultStatus::Failed
    } else {
        ResultStatus::Partial
    }
}

/// Externally observable outcome of one workflow execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub supplier: String,
    pub status: ResultStatus,
    pub products_extracted: u64,
    pub products_created: u64,
    pub products_updated: u64,
    pub errors: u64,
    pub duration_ms: u64,
}

impl_restate_serde!(SyncResult);

impl SyncResult {
    pub fn from_extraction(supplier: &str, extraction: &ExtractionResult, elapsed: Duration) -> Self {
        Self {
            supplier: supplier.to_string(),
            status: extraction.status,
            products_extracted: extraction.products_extracted,
            products_created: extraction.products_created,
            products_updated: extraction.products_updated,
            errors: extraction.products_error,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    /// Failed result with zero product metrics; counts are never guessed.
    pub fn failed(supplier: &str, elapsed: Duration) -> Self {
        Self {
            supplier: supplier.to_string(),
            status: ResultStatus::Failed,
            products_extracted: 0,
            products_created: 0,
            products_updated: 0,
            errors: 1,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    /// Entry the coordinator substitutes for an execution that failed or never started.
    pub fn failed_placeholder(supplier: &str) -> Self {
        Self::failed(supplier, Duration::ZERO)
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    /// Operator-facing metric lines, one per field.
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("Status:             {}", self.status),
            format!("Products extracted: {}", self.products_extracted),
            format!("Products created:   {}", self.products_created),
            format!("Products updated:   {}", self.products_updated),
            format!("Errors:             {}", self.errors),
            format!("Duration:           {}ms", self.duration_ms),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(extracted: u64, created: u64, updated: u64, errors: u64) -> ProductCounts {
        ProductCounts {
            extracted,
            created,
            updated,
            errors,
        }
    }

    #[test]
    fn page_classification() {
        assert_eq!(classify_pages(10, 0), ResultStatus::Success);
        assert_eq!(classify_pages(0, 0), ResultStatus::Success);
        assert_eq!(classify_pages(10, 3), ResultStatus::Partial);
        assert_eq!(classify_pages(10, 9), ResultStatus::Partial);
        assert_eq!(classify_pages(10, 10), ResultStatus::Failed);
        assert_eq!(classify_pages(0, 2), ResultStatus::Failed);
    }

    #[test]
    fn sync_result_mirrors_extraction_errors() {
        let extraction = ExtractionResult::from_pages(4, 1, counts(100, 70, 20, 10));
        let result = SyncResult::from_extraction("acme", &extraction, Duration::from_millis(1500));

        assert_eq!(result.status, ResultStatus::Partial);
        assert_eq!(result.products_extracted, 100);
        assert_eq!(result.errors, 10);
        assert_eq!(result.duration_ms, 1500);
    }

    #[test]
    fn placeholder_has_zero_metrics() {
        let result = SyncResult::failed_placeholder("acme");
        assert_eq!(result.status, ResultStatus::Failed);
        assert_eq!(result.products_extracted, 0);
        assert_eq!(result.products_created, 0);
        assert_eq!(result.products_updated, 0);
        assert_eq!(result.errors, 1);
        assert_eq!(result.duration_ms, 0);
    }

    #[test]
    fn failed_summary_shows_zero_metrics() {
        let lines = SyncResult::failed("acme", Duration::from_millis(250)).summary_lines();

        assert_eq!(lines.len(), 6);
        assert!(lines[0].ends_with(&ResultStatus::Failed.to_string()));
        assert!(lines[1].ends_with(": 0"));
        assert!(lines[2].ends_with(": 0"));
        assert!(lines[3].ends_with(": 0"));
        assert!(lines[4].ends_with(" 1"));
        assert!(lines[5].ends_with(" 250ms"));
    }

    #[test]
    fn extraction_result_accepts_payload_without_page_accounting() {
        let json = r#"{"status":"success","products_extracted":5,"products_created":5,"products_updated":0,"products_error":0}"#;
        let parsed: ExtractionResult = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.pages_attempted, 0);
        assert_eq!(parsed.status, ResultStatus::Success);
    }
}
