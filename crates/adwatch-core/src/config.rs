use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::notify::DEFAULT_LOG_CAPACITY;
use crate::redact::{redact_secret, redact_url};
use crate::retry::{RetryConfig, RetryOverrides};

/// Notification sink parameters (optional `[notify]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Minimum status code that is forwarded to sinks (e.g. 500 = server-side failures only).
    #[serde(default = "default_severity_threshold")]
    pub severity_threshold: u16,
    /// Connect timeout for each sink request, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Total timeout for each sink request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Generic webhook receiving the full log entry as JSON.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Chat-ops incoming webhook (`{"text": ...}` payload).
    #[serde(default)]
    pub chat_webhook_url: Option<String>,
    /// Email relay endpoint; only used when `email_recipients` is non-empty.
    #[serde(default)]
    pub email_endpoint: Option<String>,
    #[serde(default)]
    pub email_recipients: Vec<String>,
}

fn default_severity_threshold() -> u16 {
    500
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            severity_threshold: default_severity_threshold(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            webhook_url: None,
            chat_webhook_url: None,
            email_endpoint: None,
            email_recipients: Vec::new(),
        }
    }
}

impl NotifyConfig {
    /// True if at least one sink is configured.
    pub fn has_sinks(&self) -> bool {
        self.webhook_url.is_some()
            || self.chat_webhook_url.is_some()
            || (self.email_endpoint.is_some() && !self.email_recipients.is_empty())
    }

    /// Copy of this section with sink URLs redacted, for printing and logging.
    pub fn redacted(&self) -> Self {
        Self {
            webhook_url: self.webhook_url.as_deref().map(redact_url),
            chat_webhook_url: self.chat_webhook_url.as_deref().map(redact_url),
            email_endpoint: self.email_endpoint.as_deref().map(redact_url),
            email_recipients: self
                .email_recipients
                .iter()
                .map(|r| redact_secret(r))
                .collect(),
            ..self.clone()
        }
    }
}

/// Global configuration loaded from `~/.config/adwatch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdwatchConfig {
    /// Name recorded as the originating agent of every error log entry.
    pub agent: String,
    /// Capacity of the in-memory error log (newest entries kept).
    pub error_log_capacity: usize,
    /// Optional retry overrides; missing fields fall back to built-in defaults.
    #[serde(default)]
    pub retry: Option<RetryOverrides>,
    /// Optional notification sinks; if missing, errors are only recorded locally.
    #[serde(default)]
    pub notify: Option<NotifyConfig>,
}

impl Default for AdwatchConfig {
    fn default() -> Self {
        Self {
            agent: "adwatch".to_string(),
            error_log_capacity: DEFAULT_LOG_CAPACITY,
            retry: None,
            notify: None,
        }
    }
}

impl AdwatchConfig {
    /// Retry configuration from the `[retry]` section merged over defaults.
    pub fn retry_config(&self) -> RetryConfig {
        match &self.retry {
            Some(overrides) => overrides.merge(RetryConfig::default()),
            None => RetryConfig::default(),
        }
    }

    /// Notify section, or defaults (no sinks) if missing.
    pub fn notify_config(&self) -> NotifyConfig {
        self.notify.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("adwatch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AdwatchConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] but for an explicit path (used by `--config` and tests).
pub fn load_or_init_at(path: &Path) -> Result<AdwatchConfig> {
    if !path.exists() {
        let default_cfg = AdwatchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: AdwatchConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
