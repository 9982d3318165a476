//! CLI command handlers, one per file.

mod classify;
mod completions;
mod config;
mod run;

pub use classify::run_classify;
pub use completions::run_completions;
pub use config::run_show_config;
pub use notify_test::run_notify_test;
pub use run::{run_fetch, RunOptions};
