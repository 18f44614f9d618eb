//! Test data builders.

use catalog_sync_core::domains::sync::models::{ExtractionResult, ProductCounts};

pub fn counts(extracted: u64, created: u64, updated: u64, errors: u64) -> ProductCounts {
    ProductCounts {
        extracted,
        created,
        updated,
        errors,
    }
}

/// Clean extraction: every page fetched.
#[allow(dead_code)]
pub fn complete_extraction(extracted: u64, created: u64, updated: u64) -> ExtractionResult {
    ExtractionResult::from_pages(5, 0, counts(extracted, created, updated, 0))
}

/// Extraction with some failed pages and some product errors.
#[allow(dead_code)]
pub fn partial_extraction(extracted: u64, errors: u64) -> ExtractionResult {
    ExtractionResult::from_pages(5, 2, counts(extracted, extracted / 2, extracted / 2, errors))
}

/// Extraction where every page failed.
#[allow(dead_code)]
pub fn failed_extraction() -> ExtractionResult {
    ExtractionResult::from_pages(5, 5, counts(0, 0, 0, 0))
}
