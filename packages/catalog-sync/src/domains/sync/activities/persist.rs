//! Persist extracted products

use tracing::info;

use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::ExtractionResult;
use crate::kernel::SyncDeps;

/// Upsert the extraction output into the catalog. Idempotent per supplier SKU.
pub async fn persist(
    supplier: &str,
    result: &ExtractionResult,
    deps: &SyncDeps,
) -> Result<(), SyncError> {
    deps.store.persist(supplier, result).await?;

    info!(
        supplier,
        products_created = result.products_created,
        products_updated = result.products_updated,
        "catalog persisted"
    );
    Ok(())
}
