//! Bounded exponential backoff for board service requests.

use std::time::Duration;

use crate::source::SourceError;

/// How often and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay after failed attempt `attempt` (1-based): doubles each time,
    /// capped at `max_backoff`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1_u32 << exponent)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the error of a non-transient failure as is, or
    /// [`SourceError::RetriesExhausted`] wrapping the last transient one.
    pub fn run<T>(
        &self,
        what: &str,
        op: impl FnMut(u32) -> Result<T, SourceError>,
    ) -> Result<T, SourceError> {
        self.run_with_sleep(what, op, std::thread::sleep)
    }

    /// [`RetryPolicy::run`] with an injectable sleep.
    ///
    /// # Errors
    ///
    /// Same as [`RetryPolicy::run`].
    pub fn run_with_sleep<T>(
        &self,
        what: &str,
        mut op: impl FnMut(u32) -> Result<T, SourceError>,
        mut sleep: impl FnMut(Duration),
    ) -> Result<T, SourceError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) if attempt >= max_attempts => {
                    if max_attempts == 1 {
                        return Err(err);
                    }
                    return Err(SourceError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        request = what,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "request failed, retrying: {err}"
                    );
                    sleep(delay);
                    attempt += 1;
                }
            }
        }
    }
}
