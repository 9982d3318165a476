use serde::{Deserialize, Serialize};

use super::category::ErrorCategory;

/// Normalized failure: message, HTTP-style status and an optional short code.
///
/// Fields are private; once built the value is only read, cloned and forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ApplicationError {
    message: String,
    status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    category: ErrorCategory,
}

impl ApplicationError {
    /// Status 500, no code.
    pub fn new(message: impl Into<String>, category: ErrorCategory) -> Self {
        Self {
            message: message.into(),
            status_code: 500,
            code: None,
            category,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// One-line summary for logs and chat messages: `[CATEGORY/CODE 503] message`.
    pub fn summary(&self) -> String {
        match &self.code {
            Some(code) => format!(
                "[{}/{} {}] {}",
                self.category, code, self.status_code, self.message
            ),
            None => format!("[{} {}] {}", self.category, self.status_code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_500_without_code() {
        let e = ApplicationError::new("boom", ErrorCategory::Unknown);
        assert_eq!(e.status_code(), 500);
        assert!(e.code().is_none());
        assert_eq!(e.to_string(), "boom");
        assert_eq!(e.summary(), "[UNKNOWN 500] boom");
    }

    #[test]
    fn builder_sets_status_and_code() {
        let e = ApplicationError::new("db down", ErrorCategory::Database)
            .with_status(503)
            .with_code("DB_CONNECTION_ERROR");
        assert_eq!(e.status_code(), 503);
        assert_eq!(e.code(), Some("DB_CONNECTION_ERROR"));
        assert_eq!(e.summary(), "[DATABASE/DB_CONNECTION_ERROR 503] db down");
    }

    #[test]
    fn json_shape() {
        let e = ApplicationError::new("x", ErrorCategory::Validation).with_status(400);
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["message"], "x");
        assert_eq!(v["status_code"], 400);
        assert_eq!(v["category"], "VALIDATION");
        assert!(v.get("code").is_none());
    }
}
