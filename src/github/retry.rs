//! Bounded exponential backoff for transient GitHub failures.
//!
//! Only transient errors are retried; permanent errors and exhausted
//! retries return to the caller, where they abort the tick.

use std::future::Future;
use std::time::Duration;

use super::error::HostError;

/// Retry schedule for GitHub API calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Retry attempts after the initial one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each attempt.
    pub initial_delay: Duration,
    /// Cap on the exponential growth.
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Three retries at 2s, 4s, 8s.
    pub const DEFAULT: Self = RetryConfig {
        max_retries: 3,
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(16),
    };

    /// Delay before the given 0-indexed retry.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Runs `operation`, retrying transient failures per `config`.
pub async fn retry_transient<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, HostError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, HostError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.kind.is_retriable() && attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                tracing::warn!(
                    error = %err,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "transient GitHub error, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
