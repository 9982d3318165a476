//! Retry loop: run an async operation until success or the policy says stop.

use std::fmt;
use std::future::Future;

use super::policy::{RetryConfig, RetryDecision};

/// Runs `operation` up to `config.max_attempts` times, sleeping
/// `config.delay_after(k)` after failed attempt `k`.
///
/// Every failure is retried. The last failure is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Debug,
{
    with_retry_if(config, operation, |_| true).await
}

/// Like [`with_retry`] but stops as soon as `retryable` rejects a failure.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    mut operation: F,
    mut retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Debug,
    P: FnMut(&E) -> bool,
{
    let config = config.normalized();
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => match config.decide(attempt, retryable(&e)) {
                RetryDecision::NoRetry => {
                    tracing::debug!(attempt, error = ?e, "giving up");
                    return Err(e);
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::debug!(
                        attempt,
                        max_attempts = config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = ?e,
                        "operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            },
        }
    }
}
