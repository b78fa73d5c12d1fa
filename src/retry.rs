use std::future::Future;
use std::time::Duration;

use rand::Rng as _;

/// Retry decision returned by the error classifier callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Retry,
    Abort,
}

/// Exponential backoff with jitter for status reconciliation writes.
///
/// Only store writes go through this; a fetch is never repeated because it
/// may have side effects on disk.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Config that makes exactly one attempt.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Compute the delay for a given retry attempt (0-indexed).
    ///
    /// Formula: `min(base_delay * 2^retry, max_delay) + random_jitter(0..base_delay)`
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX);
        let exp_ms = base_ms.saturating_mul(1u64.checked_shl(retry).unwrap_or(u64::MAX));
        let capped = exp_ms.min(max_ms);
        let jitter = if base_ms > 0 {
            rand::thread_rng().gen_range(0..base_ms)
        } else {
            0
        };
        Duration::from_millis(capped.saturating_add(jitter))
    }
}

/// Retry an async operation with exponential backoff and jitter.
///
/// Returns the first `Ok` result, or the last error if retries are exhausted
/// or the classifier returns `Abort`.
pub async fn retry_with_backoff<F, Fut, T, E, C>(
    config: &RetryConfig,
    classifier: C,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> RetryAction,
    E: std::fmt::Display,
{
    let total_attempts = config.max_retries + 1;
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => e,
        };
        attempt += 1;
        if classifier(&err) == RetryAction::Abort || attempt >= total_attempts {
            return Err(err);
        }
        let delay = config.delay_for_retry(attempt - 1);
        tracing::warn!(
            "Retryable error (attempt {}/{}), retrying in {}ms: {}",
            attempt,
            total_attempts,
            delay.as_millis(),
            err
        );
        tokio::time::sleep(delay).await;
    }
}
