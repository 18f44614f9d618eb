//! Activity retry policy and the in-process retry loop.
//!
//! Every activity attempt is bounded by a start-to-close timeout. A failed or
//! timed-out attempt is retried with exponential backoff until the policy's
//! attempt budget is spent, then the last error surfaces to the workflow.

use std::future::Future;
use std::time::Duration;

use restate_sdk::prelude::RunRetryPolicy;
use tracing::{debug, warn};

use crate::domains::sync::errors::SyncError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub backoff_coefficient: f64,
    pub maximum_interval: Duration,
    pub maximum_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            backoff_coefficient: 2.0,
            maximum_interval: Duration::from_secs(30),
            maximum_attempts: 3,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub fn no_retry() -> Self {
        Self {
            maximum_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let secs = self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.maximum_interval)
            .min(self.maximum_interval)
    }

    /// Same policy expressed for Restate's journaled `ctx.run`.
    pub fn to_restate(&self) -> RunRetryPolicy {
        // factor: Restate default (2.0)
        RunRetryPolicy::default()
            .initial_delay(self.initial_interval)
            .max_delay(self.maximum_interval)
            .max_attempts(self.maximum_attempts)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityOptions {
    pub start_to_close_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ActivityOptions {
    fn default() -> Self {
        Self {
            start_to_close_timeout: Duration::from_secs(10 * 60),
            retry: RetryPolicy::default(),
        }
    }
}

impl ActivityOptions {
    /// Options for the best-effort notify activity: same timeout, one attempt.
    pub fn best_effort() -> Self {
        Self {
            retry: RetryPolicy::no_retry(),
            ..Self::default()
        }
    }
}

/// Run one attempt of `fut`, failing with [`SyncError::Timeout`] past `timeout`.
pub async fn within_timeout<T, Fut>(
    activity: &str,
    timeout: Duration,
    fut: Fut,
) -> Result<T, SyncError>
where
    Fut: Future<Output = Result<T, SyncError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(SyncError::Timeout {
            activity: activity.to_string(),
            after: timeout,
        }),
    }
}

/// Run an activity under `options`, retrying retryable failures with backoff.
pub async fn run_activity<T, F, Fut>(
    activity: &str,
    options: &ActivityOptions,
    mut op: F,
) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SyncError>>,
{
    let max_attempts = options.retry.maximum_attempts.max(1);
    let mut attempt = 1;

    loop {
        match within_timeout(activity, options.start_to_close_timeout, op()).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(activity, attempt, "activity succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = options.retry.delay_after(attempt);
                warn!(
                    activity,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "activity attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(activity, attempt, error = %e, "activity failed");
                return Err(e);
            }
        }
    }
}
