//! Client-side polling until a job resolves
//!
//! The remote never pushes status changes, so callers poll. [`poll_until_resolved`]
//! checks immediately, then sleeps between checks, growing the interval by
//! the configured multiplier up to `max_interval`. A job that stays
//! unresolved for `max_attempts` checks is treated as lost.

use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::retry::scale_delay;
use crate::types::{BuildStatus, ClientStatus};
use std::future::Future;
use std::time::Duration;

/// Poll `check` until it reports a terminal status
///
/// `check` receives the 1-based attempt number. `error` statuses are
/// transient and polled past like `building`. Returns
/// [`Error::PollTimeout`] once `config.max_attempts` checks came back
/// unresolved.
pub async fn poll_until_resolved<F, Fut>(config: &PollConfig, mut check: F) -> Result<ClientStatus>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ClientStatus>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut interval = config.interval;

    for attempt in 1..=max_attempts {
        let status = check(attempt).await;
        if status.status.is_terminal() {
            tracing::debug!(attempt, status = ?status.status, "poll resolved");
            return Ok(status);
        }

        if status.status == BuildStatus::Error {
            tracing::warn!(attempt, message = ?status.message, "status check failed, polling again");
        } else {
            tracing::trace!(attempt, message = ?status.message, "still building");
        }

        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
            interval = next_interval(interval, config);
        }
    }

    tracing::warn!(attempts = max_attempts, "job did not resolve, giving up");
    Err(Error::PollTimeout {
        attempts: max_attempts,
    })
}

fn next_interval(current: Duration, config: &PollConfig) -> Duration {
    if config.backoff_multiplier <= 1.0 {
        return current;
    }
    scale_delay(current, config.backoff_multiplier, config.max_interval)
}
