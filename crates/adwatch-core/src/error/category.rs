use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a failure came from. Drives which message classifier applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Missing or invalid environment variables / configuration.
    Environment,
    FileSystem,
    /// Spawning or running an external job failed.
    ProcessExecution,
    Network,
    Database,
    Authentication,
    Validation,
    Unknown,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 8] = [
        ErrorCategory::Environment,
        ErrorCategory::FileSystem,
        ErrorCategory::ProcessExecution,
        ErrorCategory::Network,
        ErrorCategory::Database,
        ErrorCategory::Authentication,
        ErrorCategory::Validation,
        ErrorCategory::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Environment => "ENVIRONMENT",
            ErrorCategory::FileSystem => "FILE_SYSTEM",
            ErrorCategory::ProcessExecution => "PROCESS_EXECUTION",
            ErrorCategory::Network => "NETWORK",
            ErrorCategory::Database => "DATABASE",
            ErrorCategory::Authentication => "AUTHENTICATION",
            ErrorCategory::Validation => "VALIDATION",
            ErrorCategory::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a category name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown error category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for ErrorCategory {
    type Err = ParseCategoryError;

    /// Accepts the display names and short CLI spellings (`db`, `auth`, `fs`, `process`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let category = match norm.as_str() {
            "environment" | "env" | "config" => ErrorCategory::Environment,
            "file_system" | "filesystem" | "fs" => ErrorCategory::FileSystem,
            "process_execution" | "process" => ErrorCategory::ProcessExecution,
            "network" | "net" => ErrorCategory::Network,
            "database" | "db" => ErrorCategory::Database,
            "authentication" | "auth" => ErrorCategory::Authentication,
            "validation" => ErrorCategory::Validation,
            "unknown" => ErrorCategory::Unknown,
            _ => return Err(ParseCategoryError(s.to_string())),
        };
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parses_back() {
        for c in ErrorCategory::ALL {
            assert_eq!(c.to_string().parse::<ErrorCategory>(), Ok(c));
        }
    }

    #[test]
    fn short_spellings() {
        assert_eq!("db".parse(), Ok(ErrorCategory::Database));
        assert_eq!("Auth".parse(), Ok(ErrorCategory::Authentication));
        assert_eq!("file-system".parse(), Ok(ErrorCategory::FileSystem));
        assert_eq!("process".parse(), Ok(ErrorCategory::ProcessExecution));
        assert!("chart".parse::<ErrorCategory>().is_err());
    }

    #[test]
    fn serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCategory::ProcessExecution).unwrap();
        assert_eq!(json, "\"PROCESS_EXECUTION\"");
    }
}
