//! Cold-start retry policy.

use std::time::Duration;

const DEFAULT_COLD_START_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY_SECS: u64 = 10;
const DEFAULT_MAX_DELAY_SECS: u64 = 60;

/// How long to wait, and how often to retry, while a model is loading.
///
/// Only a 503 response triggers a retry of the same URL; every other
/// failure moves on to the next endpoint immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts per URL after the first 503.
    pub cold_start_retries: u32,
    /// Delay unit; attempt `n` waits `n * base_delay` without a host hint.
    pub base_delay: Duration,
    /// Upper bound for any single wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            cold_start_retries: DEFAULT_COLD_START_RETRIES,
            base_delay: Duration::from_secs(DEFAULT_BASE_DELAY_SECS),
            max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with explicit values.
    pub fn new(cold_start_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            cold_start_retries,
            base_delay,
            max_delay,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    /// Total requests allowed per URL.
    pub fn max_attempts(&self) -> u32 {
        self.cold_start_retries.saturating_add(1)
    }

    /// Delay before retrying after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let delay = hint.unwrap_or_else(|| self.base_delay.saturating_mul(attempt.max(1)));
        delay.min(self.max_delay)
    }
}
