//! Retry logic.
//!
//! # Responsibilities
//! - Describe the attempt budget and delay schedule (`RetryPolicy`)
//! - Run an async operation until it succeeds or the budget is spent
//!
//! Every error is treated as retryable. Callers that need to distinguish
//! error kinds do so after the loop, from `RetryError::last_error`.

use std::future::Future;
use std::time::Duration;

use crate::resilience::backoff::calculate_backoff;

/// Attempt budget and delay schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Retries after the initial attempt.
    pub max_retries: u32,
}

impl RetryPolicy {
    /// Policy for the startup secret lookup: 2s doubling to 16s, 5 retries.
    pub const KEY_VAULT: Self = Self {
        initial_delay: Duration::from_secs(2),
        max_delay: Duration::from_secs(16),
        max_retries: 5,
    };

    pub const fn new(initial_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_retries,
        }
    }

    /// Initial attempt plus retries.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `retry` (1-based).
    pub fn delay_before(&self, retry: u32) -> Duration {
        calculate_backoff(retry, self.initial_delay, self.max_delay)
    }

    /// Sum of every delay when all attempts fail.
    pub fn worst_case_delay(&self) -> Duration {
        (1..=self.max_retries).map(|retry| self.delay_before(retry)).sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::KEY_VAULT
    }
}

/// All attempts failed.
#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `operation` until it returns `Ok` or the policy's attempts run out.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts => {
                let delay = policy.delay_before(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay = ?delay,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(attempts = attempt, error = %e, "Retry budget exhausted");
                return Err(RetryError {
                    attempts: attempt,
                    last_error: e,
                });
            }
        }
    }
}
