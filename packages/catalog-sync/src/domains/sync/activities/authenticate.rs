//! Authenticate against a supplier portal

use tracing::{debug, info};

use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::Session;
use crate::kernel::SyncDeps;

/// Open a portal session for `supplier`.
///
/// A session that is already expired when handed back is treated as a
/// retryable authentication failure.
pub async fn authenticate(supplier: &str, deps: &SyncDeps) -> Result<Session, SyncError> {
    debug!(supplier, "authenticating");

    let session = deps.auth.authenticate(supplier).await?;

    if session.is_expired(chrono::Utc::now()) {
        return Err(SyncError::auth(supplier, "portal returned an expired session"));
    }

    info!(supplier, expires_at = %session.expires_at, "authenticated");
    Ok(session)
}
