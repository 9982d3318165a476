//! Required environment variables for the fetch job (API tokens, database URL/key).

use crate::error::{ApplicationError, ErrorCategory};

/// Fail with one `Environment` error naming every variable that is unset or empty.
pub fn require_env(names: &[&str]) -> Result<(), ApplicationError> {
    require_env_with(names, |name| std::env::var(name).ok())
}

/// Like [`require_env`] with an explicit lookup (tests, alternate env sources).
pub fn require_env_with<F>(names: &[&str], lookup: F) -> Result<(), ApplicationError>
where
    F: Fn(&str) -> Option<String>,
{
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| lookup(name).map_or(true, |v| v.trim().is_empty()))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(ApplicationError::new(
        format!("missing required environment variables: {}", missing.join(", ")),
        ErrorCategory::Environment,
    )
    .with_code("MISSING_ENV"))
}
