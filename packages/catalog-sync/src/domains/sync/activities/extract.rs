//! Extract a supplier catalog

use tracing::{info, warn};

use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{ExtractionParams, ExtractionResult, ResultStatus, Session};
use crate::kernel::SyncDeps;

/// Run one extraction.
///
/// Partial runs are returned as-is. A run the extractor itself reports as
/// failed becomes an [`SyncError::Extraction`] so the retry policy applies.
pub async fn extract(
    session: &Session,
    params: &ExtractionParams,
    deps: &SyncDeps,
) -> Result<ExtractionResult, SyncError> {
    info!(
        supplier = %params.supplier,
        mode = %params.mode,
        batch_size = params.batch_size,
        concurrency = params.concurrency,
        "extracting catalog"
    );

    let result = deps.extractor.extract(session, params).await?;

    match result.status {
        ResultStatus::Failed => Err(SyncError::extraction(
            &params.supplier,
            format!(
                "all {} pages failed ({} product errors)",
                result.pages_attempted, result.products_error
            ),
        )),
        ResultStatus::Partial => {
            warn!(
                supplier = %params.supplier,
                pages_attempted = result.pages_attempted,
                pages_failed = result.pages_failed,
                products_extracted = result.products_extracted,
                "partial extraction"
            );
            Ok(result)
        }
        ResultStatus::Success => {
            info!(
                supplier = %params.supplier,
                products_extracted = result.products_extracted,
                "extraction complete"
            );
            Ok(result)
        }
    }
}
