pub mod config;
pub mod logging;

pub mod error;
pub mod fetch_job;
pub mod notify;
pub mod redact;
pub mod retry;
