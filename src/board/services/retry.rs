//! Bounded retry with linear backoff for remote board calls.

use crate::board::ports::{BoardGatewayError, BoardGatewayResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How often, and how patiently, remote board calls are repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    delay_increment: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(250), Duration::from_millis(250))
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` counts the first call and is raised
    /// to one when zero.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration, delay_increment: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            base_delay,
            delay_increment,
        }
    }

    /// Creates a policy that calls once and never waits.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Returns the total number of calls allowed.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the wait after the failed call numbered `attempt` (1-based):
    /// `base + (attempt - 1) * increment`.
    #[must_use]
    pub const fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_add(self.delay_increment.saturating_mul(attempt.saturating_sub(1)))
    }

    /// Runs `call` until it succeeds, fails with a non-retryable error, or
    /// the attempts run out. The last error is returned.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, call: F) -> BoardGatewayResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BoardGatewayResult<T>>,
    {
        self.run_when(operation, BoardGatewayError::is_retryable, call)
            .await
    }

    /// Like [`Self::run`], but repeats only errors accepted by `retry_if`.
    ///
    /// # Errors
    ///
    /// Returns the error of the final attempt.
    pub async fn run_when<T, F, Fut>(
        &self,
        operation: &'static str,
        retry_if: fn(&BoardGatewayError) -> bool,
        mut call: F,
    ) -> BoardGatewayResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BoardGatewayResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if retry_if(&err) && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "remote board call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
