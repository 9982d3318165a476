//! Error log and notification fan-out.
//!
//! Every recorded error lands in a bounded in-memory log (newest first). Errors
//! at or above the severity threshold are also pushed to the configured sinks
//! (generic webhook, chat-ops webhook, email relay). Sinks run concurrently and
//! fail independently; a broken sink is logged and reported, never propagated.

mod entry;
mod http;
mod notifier;
mod ring;
mod sink;

pub use entry::{now_unix_ms, run_agent_id, ErrorContext, ErrorLogEntry};
pub use notifier::{DispatchReport, ErrorNotifier, SinkOutcome, SkipReason};
pub use ring::{ErrorLog, DEFAULT_LOG_CAPACITY};
pub use sink::{sinks_from_config, ChatSink, EmailSink, HttpTimeouts, Sink, WebhookSink};
