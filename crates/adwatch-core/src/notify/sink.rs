//! Notification destinations.

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::entry::ErrorLogEntry;
use super::http::post_json;
use crate::config::NotifyConfig;

pub use super::http::HttpTimeouts;

/// An external destination for error notifications.
///
/// `deliver` is blocking and is always called from a blocking-pool thread.
pub trait Sink: Send + Sync + 'static {
    /// Short name used in logs and dispatch reports.
    fn name(&self) -> &str;

    fn deliver(&self, entry: &ErrorLogEntry) -> Result<()>;
}

/// Generic webhook: the full log entry as JSON.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    url: String,
    timeouts: HttpTimeouts,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeouts: HttpTimeouts) -> Self {
        Self {
            url: url.into(),
            timeouts,
        }
    }
}

impl Sink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn deliver(&self, entry: &ErrorLogEntry) -> Result<()> {
        let body = serde_json::to_vec(entry).context("serialize log entry")?;
        post_json(&self.url, &body, self.timeouts)
    }
}

/// Chat-ops incoming webhook: `{"text": "..."}`.
#[derive(Debug, Clone)]
pub struct ChatSink {
    url: String,
    timeouts: HttpTimeouts,
}

impl ChatSink {
    pub fn new(url: impl Into<String>, timeouts: HttpTimeouts) -> Self {
        Self {
            url: url.into(),
            timeouts,
        }
    }
}

impl Sink for ChatSink {
    fn name(&self) -> &str {
        "chat"
    }

    fn deliver(&self, entry: &ErrorLogEntry) -> Result<()> {
        let body = json!({ "text": format!("adwatch error: {}", entry.render_text()) });
        post_json(&self.url, body.to_string().as_bytes(), self.timeouts)
    }
}

/// Email relay: `{"to": [...], "subject": "...", "body": "..."}` posted to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct EmailSink {
    endpoint: String,
    recipients: Vec<String>,
    timeouts: HttpTimeouts,
}

impl EmailSink {
    pub fn new(
        endpoint: impl Into<String>,
        recipients: Vec<String>,
        timeouts: HttpTimeouts,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            recipients,
            timeouts,
        }
    }

    fn subject(entry: &ErrorLogEntry) -> String {
        const MAX_SUBJECT_CHARS: usize = 120;
        let e = &entry.error;
        let mut subject = format!(
            "[adwatch] {} {}: {}",
            e.category(),
            e.status_code(),
            e.message()
        );
        if subject.chars().count() > MAX_SUBJECT_CHARS {
            subject = subject.chars().take(MAX_SUBJECT_CHARS - 3).collect();
            subject.push_str("...");
        }
        subject
    }
}

impl Sink for EmailSink {
    fn name(&self) -> &str {
        "email"
    }

    fn deliver(&self, entry: &ErrorLogEntry) -> Result<()> {
        let body = json!({
            "to": self.recipients,
            "subject": Self::subject(entry),
            "body": format!(
                "{}\n\nrecorded at {} ms since epoch",
                entry.render_text(),
                entry.timestamp_ms
            ),
        });
        post_json(&self.endpoint, body.to_string().as_bytes(), self.timeouts)
    }
}

fn checked_url(field: &str, raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw).with_context(|| format!("invalid notify.{}", field))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.to_string()),
        other => anyhow::bail!("notify.{}: unsupported scheme {:?}", field, other),
    }
}

/// Build the sinks named in the `[notify]` section. URLs are validated up front.
pub fn sinks_from_config(cfg: &NotifyConfig) -> Result<Vec<Arc<dyn Sink>>> {
    let timeouts = HttpTimeouts {
        connect: Duration::from_secs(cfg.connect_timeout_secs),
        total: Duration::from_secs(cfg.timeout_secs),
    };
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
    if let Some(url) = &cfg.webhook_url {
        let url = checked_url("webhook_url", url)?;
        sinks.push(Arc::new(WebhookSink::new(url, timeouts)));
    }
    if let Some(url) = &cfg.chat_webhook_url {
        let url = checked_url("chat_webhook_url", url)?;
        sinks.push(Arc::new(ChatSink::new(url, timeouts)));
    }
    if let Some(endpoint) = &cfg.email_endpoint {
        if cfg.email_recipients.is_empty() {
            tracing::warn!("notify.email_endpoint set without recipients; email sink disabled");
        } else {
            sinks.push(Arc::new(EmailSink::new(
                checked_url("email_endpoint", endpoint)?,
                cfg.email_recipients.clone(),
                timeouts,
            )));
        }
    }
    Ok(sinks)
}
