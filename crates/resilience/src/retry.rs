// crates/resilience/src/retry.rs
//! Retry policy with linear backoff

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// All attempts failed; carries the last error for classification upstream
#[derive(Debug, Error)]
#[error("operation failed after {attempts} attempts: {source}")]
pub struct RetriesExhausted<E: std::error::Error + 'static> {
    /// Number of attempts made
    pub attempts: usize,
    /// The error from the final attempt
    #[source]
    pub source: E,
}

impl<E: std::error::Error> RetriesExhausted<E> {
    /// Consumes the wrapper and returns the final error
    pub fn into_source(self) -> E {
        self.source
    }
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first attempt)
    max_attempts: usize,
    /// Delay added per failed attempt
    step: Duration,
    /// Maximum delay between attempts
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a new retry policy
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            step: Duration::from_millis(300),
            max_delay: Duration::from_secs(5),
        }
    }

    /// Sets the linear backoff step
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Sets the maximum delay between attempts
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Calculates the delay before a given attempt (1-based).
    ///
    /// Linear: attempt 1 waits one step, attempt 2 two steps, capped at
    /// the maximum delay. Attempt 0 is the initial call and never waits.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let delay = self.step.saturating_mul(attempt as u32);
        delay.min(self.max_delay)
    }

    /// Returns the maximum number of attempts
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Runs an async operation with bounded retries.
///
/// `is_retryable` decides which errors are worth another attempt; a
/// non-retryable error surfaces immediately without consuming the remaining
/// attempts.
pub async fn with_retry<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    operation: F,
    is_retryable: P,
) -> Result<T, RetriesExhausted<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;

                if attempt >= policy.max_attempts() || !is_retryable(&e) {
                    return Err(RetriesExhausted {
                        attempts: attempt,
                        source: e,
                    });
                }

                tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
            }
        }
    }
}
