//! Retry and backoff policy.
//!
//! `with_retry` re-runs an async operation with bounded exponential backoff.
//! Retryability classification (timeouts, throttling, connection failures,
//! 5xx text) lives beside it as a standalone predicate; the wrapper never
//! consults it unless the caller opts in through `with_retry_if`.

mod classify;
mod policy;
mod run;

pub use classify::{
    classify_http_status, classify_message, is_retryable_error, is_retryable_message, ErrorKind,
};
pub use policy::{RetryConfig, RetryDecision, RetryOverrides};
pub use run::{with_retry, with_retry_if};
