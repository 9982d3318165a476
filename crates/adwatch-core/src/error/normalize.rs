//! Turn whatever a caller caught into an [`ApplicationError`].

use std::error::Error as StdError;

use super::app_error::ApplicationError;
use super::category::ErrorCategory;
use crate::retry::is_retryable_message;

pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Anything a caller may have caught.
#[derive(Debug)]
pub enum Failure {
    /// Already normalized; passed through untouched.
    App(ApplicationError),
    /// An error value; its display text is classified.
    Error(Box<dyn StdError + Send + Sync>),
    /// A bare message.
    Message(String),
    /// Nothing usable (no message, panic payload of unknown type, ...).
    Opaque,
}

impl Failure {
    /// Wrap any error value, unwrapping it first if it is already an `ApplicationError`.
    pub fn error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        let boxed: Box<dyn StdError + Send + Sync> = Box::new(error);
        match boxed.downcast::<ApplicationError>() {
            Ok(app) => Failure::App(*app),
            Err(other) => Failure::Error(other),
        }
    }

    /// Message text, if this failure carries a non-empty one.
    pub fn message(&self) -> Option<String> {
        let msg = match self {
            Failure::App(e) => e.message().to_string(),
            Failure::Error(e) => e.to_string(),
            Failure::Message(m) => m.clone(),
            Failure::Opaque => return None,
        };
        if msg.trim().is_empty() {
            None
        } else {
            Some(msg)
        }
    }

    /// Message-based retryability; failures without a message are never retryable.
    pub fn is_retryable(&self) -> bool {
        self.message()
            .map(|m| is_retryable_message(&m))
            .unwrap_or(false)
    }
}

impl From<ApplicationError> for Failure {
    fn from(e: ApplicationError) -> Self {
        Failure::App(e)
    }
}

impl From<String> for Failure {
    fn from(m: String) -> Self {
        Failure::Message(m)
    }
}

impl From<&str> for Failure {
    fn from(m: &str) -> Self {
        Failure::Message(m.to_string())
    }
}

impl From<std::io::Error> for Failure {
    fn from(e: std::io::Error) -> Self {
        Failure::error(e)
    }
}

impl From<anyhow::Error> for Failure {
    /// Keeps the whole context chain (`outer: inner`) as the message.
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<ApplicationError>() {
            Ok(app) => Failure::App(app),
            Err(e) => Failure::Message(format!("{:#}", e)),
        }
    }
}

/// Normalize `raw` into an [`ApplicationError`].
///
/// Already-normalized errors are returned unchanged. A message is run through
/// the classifier for `default_category` (database, auth, validation); other
/// categories get status 500 and no code. No message at all yields a generic
/// unexpected error.
pub fn to_application_error(
    raw: impl Into<Failure>,
    default_category: ErrorCategory,
) -> ApplicationError {
    let raw = raw.into();
    if let Failure::App(e) = raw {
        return e;
    }
    let Some(message) = raw.message() else {
        return unexpected();
    };
    match default_category {
        ErrorCategory::Database => classify_database_error(&message),
        ErrorCategory::Authentication => classify_auth_error(&message),
        ErrorCategory::Validation => classify_validation_error(&message),
        other => ApplicationError::new(message, other),
    }
}

fn unexpected() -> ApplicationError {
    ApplicationError::new(UNEXPECTED_ERROR_MESSAGE, ErrorCategory::Unknown)
        .with_code("UNEXPECTED_ERROR")
}

fn contains_any(lower: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| lower.contains(m))
}

/// Database failures: connection → 503, timeout → 504, permission → 403,
/// constraint violation → 409, anything else → 500.
pub fn classify_database_error(message: &str) -> ApplicationError {
    let lower = message.to_lowercase();
    let (status, code) = if lower.contains("connection") {
        (503, "DB_CONNECTION_ERROR")
    } else if lower.contains("timeout") {
        (504, "DB_TIMEOUT")
    } else if lower.contains("permission") {
        (403, "DB_PERMISSION_ERROR")
    } else if contains_any(&lower, &["duplicate", "unique"]) {
        (409, "DB_CONSTRAINT_ERROR")
    } else {
        (500, "DB_ERROR")
    };
    ApplicationError::new(message, ErrorCategory::Database)
        .with_status(status)
        .with_code(code)
}

/// Auth failures: token problems → 401, permission → 403, anything else → 401.
pub fn classify_auth_error(message: &str) -> ApplicationError {
    let lower = message.to_lowercase();
    let (status, code) = if lower.contains("token") {
        (401, "AUTH_TOKEN_ERROR")
    } else if contains_any(&lower, &["permission", "forbidden"]) {
        (403, "AUTH_PERMISSION_ERROR")
    } else {
        (401, "AUTH_ERROR")
    };
    ApplicationError::new(message, ErrorCategory::Authentication)
        .with_status(status)
        .with_code(code)
}

/// Validation failures are always 400; the code narrows down why.
pub fn classify_validation_error(message: &str) -> ApplicationError {
    let lower = message.to_lowercase();
    let code = if lower.contains("required") {
        "VALIDATION_REQUIRED"
    } else if contains_any(&lower, &["format", "invalid"]) {
        "VALIDATION_FORMAT"
    } else {
        "VALIDATION_ERROR"
    };
    ApplicationError::new(message, ErrorCategory::Validation)
        .with_status(400)
        .with_code(code)
}
