//! Sync activities - the four retryable, externally-effectful steps
//!
//! Activities are plain async functions over `SyncDeps`. The retry policy is
//! applied by whoever runs them: `run_activity` in-process, or Restate's
//! journaled `ctx.run` in the durable workflows.

mod authenticate;
mod extract;
mod notify;
mod persist;
pub mod retry;

pub use authenticate::authenticate;
pub use extract::extract;
pub use notify::notify;
pub use persist::persist;
pub use retry::{run_activity, within_timeout, ActivityOptions, RetryPolicy};
