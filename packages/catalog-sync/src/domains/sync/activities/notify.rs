//! Best-effort notification

use tracing::warn;

use crate::domains::sync::models::{NotifyEvent, NotifyOutcome};
use crate::kernel::SyncDeps;

/// Send `event`. Never fails: transport errors come back as
/// [`NotifyOutcome::Failed`] for the workflow to log.
pub async fn notify(event: &NotifyEvent, deps: &SyncDeps) -> NotifyOutcome {
    match deps.notifier.notify(event).await {
        Ok(()) => NotifyOutcome::Delivered,
        Err(e) => {
            warn!(supplier = %event.supplier, kind = ?event.kind, error = %e, "notification failed");
            NotifyOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}
