//! The process-wide error recorder.
//!
//! Build one `ErrorNotifier` at startup, wrap it in an `Arc` and pass it to
//! whatever needs to report failures; all of them share the same log.

use anyhow::Result;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

use super::entry::{run_agent_id, ErrorContext, ErrorLogEntry};
use super::ring::ErrorLog;
use super::sink::{sinks_from_config, Sink};
use crate::config::AdwatchConfig;
use crate::error::ApplicationError;

/// Why a recorded error was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Status below the severity threshold.
    BelowThreshold,
    NoSinks,
}

/// Result of one sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkOutcome {
    pub sink: String,
    /// `Err` holds the rendered failure (HTTP status, curl error, panic message).
    pub result: Result<(), String>,
}

/// What happened to one recorded error beyond the local log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Per-sink outcomes, sorted by sink name. Empty when skipped.
    pub outcomes: Vec<SinkOutcome>,
    pub skipped: Option<SkipReason>,
}

impl DispatchReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            outcomes: Vec::new(),
            skipped: Some(reason),
        }
    }

    pub fn dispatched(&self) -> bool {
        self.skipped.is_none()
    }

    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// Records failures to a bounded log and forwards severe ones to the sinks.
pub struct ErrorNotifier {
    log: Mutex<ErrorLog>,
    sinks: Vec<Arc<dyn Sink>>,
    severity_threshold: u16,
    agent: String,
}

impl std::fmt::Debug for ErrorNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sinks: Vec<&str> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("ErrorNotifier")
            .field("agent", &self.agent)
            .field("severity_threshold", &self.severity_threshold)
            .field("sinks", &sinks)
            .field("logged", &self.len())
            .finish()
    }
}

impl ErrorNotifier {
    /// A notifier with no sinks: errors are only logged locally.
    pub fn new(agent: impl Into<String>, log_capacity: usize, severity_threshold: u16) -> Self {
        Self {
            log: Mutex::new(ErrorLog::new(log_capacity)),
            sinks: Vec::new(),
            severity_threshold,
            agent: agent.into(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Build from config: log capacity, threshold and sinks from `[notify]`,
    /// agent as a per-run id derived from `cfg.agent`.
    pub fn from_config(cfg: &AdwatchConfig) -> Result<Self> {
        let notify = cfg.notify_config();
        let mut notifier = Self::new(
            run_agent_id(&cfg.agent),
            cfg.error_log_capacity,
            notify.severity_threshold,
        );
        for sink in sinks_from_config(&notify)? {
            notifier = notifier.with_sink(sink);
        }
        tracing::debug!(notifier = ?notifier, "error notifier ready");
        Ok(notifier)
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn severity_threshold(&self) -> u16 {
        self.severity_threshold
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.sinks.iter().map(|s| s.name().to_string()).collect()
    }

    /// True if an error of this status would be forwarded (ignoring whether sinks exist).
    pub fn should_notify(&self, error: &ApplicationError) -> bool {
        error.status_code() >= self.severity_threshold
    }

    /// Record `error` locally and, if severe enough, deliver it to every sink.
    ///
    /// Sinks run concurrently; this waits for all of them. Sink failures end up
    /// in the report and the log, never in the caller's control flow.
    pub async fn record_error(
        &self,
        error: ApplicationError,
        context: ErrorContext,
    ) -> DispatchReport {
        match self.record_local(error, context) {
            Ok(entry) => dispatch(self.sinks.clone(), entry).await,
            Err(reason) => DispatchReport::skipped(reason),
        }
    }

    /// Record locally now; deliver in a background task.
    ///
    /// The entry is in the log when this returns. Await the handle to observe delivery.
    pub fn record_error_detached(
        self: &Arc<Self>,
        error: ApplicationError,
        context: ErrorContext,
    ) -> tokio::task::JoinHandle<DispatchReport> {
        let local = self.record_local(error, context);
        let sinks = self.sinks.clone();
        tokio::spawn(async move {
            match local {
                Ok(entry) => dispatch(sinks, entry).await,
                Err(reason) => DispatchReport::skipped(reason),
            }
        })
    }

    /// Append to the log; return the entry if it should go to the sinks.
    fn record_local(
        &self,
        error: ApplicationError,
        context: ErrorContext,
    ) -> std::result::Result<ErrorLogEntry, SkipReason> {
        let severe = self.should_notify(&error);
        if severe {
            tracing::error!(
                category = %error.category(),
                status = error.status_code(),
                code = error.code().unwrap_or("-"),
                context = ?context,
                "{}",
                error.message()
            );
        } else {
            tracing::warn!(
                category = %error.category(),
                status = error.status_code(),
                code = error.code().unwrap_or("-"),
                context = ?context,
                "{}",
                error.message()
            );
        }

        let entry = ErrorLogEntry::new(error, context, self.agent.clone());
        self.lock_log().push(entry.clone());

        if !severe {
            Err(SkipReason::BelowThreshold)
        } else if self.sinks.is_empty() {
            Err(SkipReason::NoSinks)
        } else {
            Ok(entry)
        }
    }

    fn lock_log(&self) -> MutexGuard<'_, ErrorLog> {
        // A panic while holding the lock cannot leave the ring half-updated.
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the log, newest first.
    pub fn entries(&self) -> Vec<ErrorLogEntry> {
        self.lock_log().iter().cloned().collect()
    }

    /// Up to `n` newest entries.
    pub fn recent(&self, n: usize) -> Vec<ErrorLogEntry> {
        self.lock_log().recent(n)
    }

    pub fn len(&self) -> usize {
        self.lock_log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_log().is_empty()
    }

    /// Operator action: drop every logged entry.
    pub fn clear_log(&self) {
        self.lock_log().clear();
        tracing::info!("error log cleared");
    }
}

/// Deliver `entry` to every sink concurrently and collect each outcome.
async fn dispatch(sinks: Vec<Arc<dyn Sink>>, entry: ErrorLogEntry) -> DispatchReport {
    let entry = Arc::new(entry);
    let mut join_set = tokio::task::JoinSet::new();
    for sink in sinks {
        let entry = Arc::clone(&entry);
        join_set.spawn_blocking(move || {
            let name = sink.name().to_string();
            let result = panic::catch_unwind(AssertUnwindSafe(|| sink.deliver(&entry)))
                .unwrap_or_else(|payload| {
                    Err(anyhow::anyhow!("sink panicked: {}", panic_message(&*payload)))
                });
            (name, result)
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        let outcome = match joined {
            Ok((sink, Ok(()))) => SinkOutcome {
                sink,
                result: Ok(()),
            },
            Ok((sink, Err(e))) => {
                tracing::warn!(sink = %sink, "notification delivery failed: {:#}", e);
                SinkOutcome {
                    sink,
                    result: Err(format!("{:#}", e)),
                }
            }
            Err(e) => {
                tracing::warn!("notification task failed: {}", e);
                SinkOutcome {
                    sink: "unknown".to_string(),
                    result: Err(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes.sort_by(|a, b| a.sink.cmp(&b.sink));
    DispatchReport {
        outcomes,
        skipped: None,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
