//! Bounded retry with backoff for RPC polling
//!
//! Polling loops must not read a single RPC hiccup as a terminal protocol
//! status. Transient transport failures are retried with exponential
//! backoff up to a bound; everything else propagates unchanged.

use std::time::Duration;

use tracing::warn;

use crate::error::Result;

/// Retry policy for transient RPC failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential growth
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Calculate backoff duration for a given attempt (0-indexed)
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(backoff_secs.min(self.max_backoff.as_secs_f64()))
    }

    /// Check if another attempt is allowed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Whether an error message describes a transient transport failure.
pub fn is_transient(error: &str) -> bool {
    let error_lower = error.to_lowercase();

    error_lower.contains("timeout")
        || error_lower.contains("timed out")
        || error_lower.contains("connection")
        || error_lower.contains("network")
        || error_lower.contains("rate limit")
        || error_lower.contains("too many requests")
        || error_lower.contains("503")
        || error_lower.contains("502")
        || error_lower.contains("temporarily unavailable")
}

/// Run `operation`, retrying transient failures with backoff.
///
/// Non-transient errors and exhausted budgets return the last error
/// unchanged.
pub async fn with_retry<F, T, Fut>(policy: &RetryPolicy, what: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !e.is_transient() || !policy.should_retry(attempt) {
                    return Err(e);
                }

                let backoff = policy.backoff_for_attempt(attempt);
                warn!(
                    what = what,
                    attempt = attempt + 1,
                    max = policy.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Transient RPC failure, retrying"
                );
                attempt += 1;
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
