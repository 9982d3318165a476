//! Classify failure text and HTTP status codes into retry error kinds.
//!
//! Message sniffing is advisory: `with_retry` retries every failure, and
//! callers that want to stop early on permanent failures pass one of these
//! predicates to `with_retry_if`.

use std::fmt;

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read/statement).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection reset/refused, DNS, etc.).
    Connection,
    /// Server-side HTTP failure that is retryable but not throttling (5xx).
    Http5xx(u16),
    /// Anything else (not retried).
    Other,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::Other)
    }
}

const TIMEOUT_MARKERS: &[&str] = &["timeout", "timed out"];
const CONNECTION_MARKERS: &[&str] = &["network", "econnreset", "econnrefused"];
const THROTTLE_MARKERS: &[&str] = &["429", "503"];

/// Classify a failure message by case-insensitive substring markers.
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));
    if has(THROTTLE_MARKERS) {
        return ErrorKind::Throttled;
    }
    if lower.contains("500") {
        return ErrorKind::Http5xx(500);
    }
    if has(TIMEOUT_MARKERS) {
        return ErrorKind::Timeout;
    }
    if has(CONNECTION_MARKERS) {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code),
        _ => ErrorKind::Other,
    }
}

/// True if the message names a timeout, network failure, 500, 503 or 429.
pub fn is_retryable_message(message: &str) -> bool {
    classify_message(message).is_retryable()
}

/// True if the error's display text looks transient (see [`is_retryable_message`]).
pub fn is_retryable_error<E: fmt::Display + ?Sized>(error: &E) -> bool {
    is_retryable_message(&error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_markers_are_retryable() {
        for msg in [
            "request timeout",
            "Network request failed",
            "HTTP 500 Internal Server Error",
            "503 Service Unavailable",
            "status 429: too many requests",
            "read ECONNRESET",
            "operation timed out",
        ] {
            assert!(is_retryable_message(msg), "{msg}");
        }
    }

    #[test]
    fn unrelated_messages_are_not_retryable() {
        assert!(!is_retryable_message("not found"));
        assert!(!is_retryable_message("invalid input syntax"));
        assert!(!is_retryable_message(""));
    }

    #[test]
    fn message_kinds() {
        assert_eq!(classify_message("Gateway Timeout"), ErrorKind::Timeout);
        assert_eq!(classify_message("429 Too Many Requests"), ErrorKind::Throttled);
        assert_eq!(classify_message("got 500 from upstream"), ErrorKind::Http5xx(500));
        assert_eq!(classify_message("connect ECONNREFUSED 127.0.0.1"), ErrorKind::Connection);
    }

    #[test]
    fn error_values_use_display_text() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "network is unreachable");
        assert!(is_retryable_error(&err));
        let err = std::io::Error::new(std::io::ErrorKind::Other, "permission denied");
        assert!(!is_retryable_error(&err));
    }

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn http_5xx_retryable() {
        assert_eq!(classify_http_status(500), ErrorKind::Http5xx(500));
        assert_eq!(classify_http_status(504), ErrorKind::Http5xx(504));
        assert!(classify_http_status(502).is_retryable());
    }

    #[test]
    fn http_4xx_other() {
        assert_eq!(classify_http_status(404), ErrorKind::Other);
        assert_eq!(classify_http_status(403), ErrorKind::Other);
        assert!(!classify_http_status(400).is_retryable());
    }
}
