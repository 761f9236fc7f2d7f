//! Backoff schedule for re-fetching after a transient failure.

use std::time::Duration;

use super::classify::{transient_cause, Transient};
use crate::cache::FetchError;

/// How many times to fetch and how long to wait in between. Built from
/// `[retry]` in config.toml via `RetryConfig::to_policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fetch attempts, the first one included.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A single attempt; every failure is final.
    pub fn never() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before retry number `retry` (1 = first retry). Doubles per step
    /// from `base_delay`, capped at `max_delay`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let doublings = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay)
    }

    /// Wait before the next attempt after attempt `attempt` failed with `err`.
    /// `None` when `err` is final or no attempts are left. A throttled server
    /// gets the wait one step further down the schedule.
    pub fn delay_after(&self, attempt: u32, err: &FetchError) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let step = match transient_cause(err)? {
            Transient::Throttled => attempt + 1,
            Transient::Timeout | Transient::Connection | Transient::ServerError(_) => attempt,
        };
        Some(self.backoff(step))
    }
}
