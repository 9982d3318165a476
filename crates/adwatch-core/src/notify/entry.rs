use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ApplicationError;

/// Free-form key/value context attached to a recorded error (job name, attempt count, ...).
pub type ErrorContext = BTreeMap<String, String>;

/// One recorded failure. Also the JSON body sent to the generic webhook sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub error: ApplicationError,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: ErrorContext,
    /// Process that recorded the entry (see [`run_agent_id`]).
    pub agent: String,
}

impl ErrorLogEntry {
    pub fn new(error: ApplicationError, context: ErrorContext, agent: impl Into<String>) -> Self {
        Self {
            timestamp_ms: now_unix_ms(),
            error,
            context,
            agent: agent.into(),
        }
    }

    /// Human-readable multi-line rendering used by the chat and email sinks.
    pub fn render_text(&self) -> String {
        let mut out = format!("{} (agent {})", self.error.summary(), self.agent);
        for (k, v) in &self.context {
            out.push_str(&format!("\n  {}: {}", k, v));
        }
        out
    }
}

pub fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Per-run agent identifier: `<agent>-<pid>-<start unix ms>`.
///
/// Generate once at process start so every entry from one run can be correlated.
pub fn run_agent_id(agent: &str) -> String {
    format!("{}-{}-{}", agent, std::process::id(), now_unix_ms())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn render_text_includes_context() {
        let mut ctx = ErrorContext::new();
        ctx.insert("account".to_string(), "act_42".to_string());
        ctx.insert("attempts".to_string(), "3".to_string());
        let entry = ErrorLogEntry::new(
            ApplicationError::new("boom", ErrorCategory::Network),
            ctx,
            "adwatch-test",
        );
        assert_eq!(
            entry.render_text(),
            "[NETWORK 500] boom (agent adwatch-test)\n  account: act_42\n  attempts: 3"
        );
    }

    #[test]
    fn json_omits_empty_context() {
        let entry = ErrorLogEntry::new(
            ApplicationError::new("x", ErrorCategory::Unknown),
            ErrorContext::new(),
            "a",
        );
        let v = serde_json::to_value(&entry).unwrap();
        assert!(v.get("context").is_none());
        assert_eq!(v["agent"], "a");
        assert_eq!(v["error"]["status_code"], 500);
    }

    #[test]
    fn run_agent_id_has_pid() {
        let id = run_agent_id("adwatch");
        assert!(id.starts_with(&format!("adwatch-{}-", std::process::id())));
    }
}
