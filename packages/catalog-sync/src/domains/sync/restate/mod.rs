//! Durable sync workflows served by Restate.
//!
//! Same pipeline as the in-process workflows, with every activity journaled
//! through `ctx.run` so a restarted execution resumes instead of redoing work.

pub mod sessions;
pub mod workflows;

use chrono::Utc;
use restate_sdk::prelude::*;

use crate::domains::sync::errors::SyncError;

pub use sessions::SessionCache;
pub use workflows::*;

/// Map an activity attempt failure: non-retryable errors end the run,
/// everything else is retried under the run's retry policy.
pub(crate) fn attempt_error(e: SyncError) -> HandlerError {
    if e.is_retryable() {
        HandlerError::from(e.to_string())
    } else {
        TerminalError::new(e.to_string()).into()
    }
}

/// Wall clock for journaling; only call inside `ctx.run`.
pub(crate) fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
