//! CLI for the adwatch fetch-job host.

mod commands;

use adwatch_core::config::{self, AdwatchConfig};
use adwatch_core::error::ErrorCategory;
use adwatch_core::notify::ErrorNotifier;
use adwatch_core::retry::RetryOverrides;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use commands::{
    run_classify, run_completions, run_fetch, run_notify_test, run_show_config, RunOptions,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "adwatch")]
#[command(
    about = "adwatch: run the ads fetch job with retries and error notifications",
    long_about = None
)]
pub struct Cli {
    /// Config file to use instead of ~/.config/adwatch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Per-invocation overrides of the `[retry]` config section.
#[derive(Debug, Clone, Default, Args)]
pub struct RetryArgs {
    /// Maximum attempts including the first (1 = no retries).
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,
    /// Delay after the first failure, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub initial_delay_ms: Option<u64>,
    /// Multiplier applied to the delay after each further failure.
    #[arg(long, value_name = "F")]
    pub backoff_factor: Option<f64>,
    /// Upper bound on any single delay, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub max_delay_ms: Option<u64>,
}

impl RetryArgs {
    pub fn overrides(&self) -> RetryOverrides {
        RetryOverrides {
            max_attempts: self.max_attempts,
            initial_delay_ms: self.initial_delay_ms,
            backoff_factor: self.backoff_factor,
            max_delay_ms: self.max_delay_ms,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the external fetch job, retrying on failure and reporting the final error.
    Run {
        #[command(flatten)]
        retry: RetryArgs,

        /// Kill a single attempt after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,

        /// Environment variable that must be set before the job starts (repeatable).
        #[arg(long = "require-env", value_name = "VAR")]
        require_env: Vec<String>,

        /// Stop retrying as soon as a failure does not look transient.
        #[arg(long)]
        only_retryable: bool,

        /// Program and arguments, after `--`.
        #[arg(last = true, required = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Show how a failure message would be classified.
    Classify {
        /// Failure message text.
        message: String,

        /// Category used for normalization (database, auth, validation, network, ...).
        #[arg(long, default_value = "unknown")]
        category: ErrorCategory,
    },

    /// Send a synthetic error through the configured notification sinks.
    NotifyTest {
        /// HTTP-style status of the synthetic error.
        #[arg(long, default_value = "500")]
        status: u16,

        /// Message of the synthetic error.
        #[arg(long, default_value = "adwatch notification test")]
        message: String,
    },

    /// Print the config file path and the effective config (secrets redacted).
    Config,

    /// Print shell completions to stdout.
    Completions {
        /// Target shell (bash, zsh, fish, ...).
        shell: clap_complete::Shell,
    },
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::Completions { shell } = cli.command {
            return run_completions(shell);
        }

        let (cfg_path, cfg) = load_config(cli.config.as_deref())?;
        tracing::debug!(
            "loaded config from {}: {:?}",
            cfg_path.display(),
            cfg.notify_config().redacted()
        );

        // One notifier per process; every command reports through it.
        let notifier = Arc::new(ErrorNotifier::from_config(&cfg)?);

        match cli.command {
            CliCommand::Run {
                retry,
                timeout_secs,
                require_env,
                only_retryable,
                command,
            } => {
                let opts = RunOptions {
                    retry: retry.overrides(),
                    timeout_secs,
                    require_env,
                    only_retryable,
                    command,
                };
                run_fetch(&cfg, &notifier, opts).await?
            }
            CliCommand::Classify { message, category } => run_classify(&message, category)?,
            CliCommand::NotifyTest { status, message } => {
                run_notify_test(&notifier, status, &message).await?
            }
            CliCommand::Config => run_show_config(&cfg_path, &cfg)?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<(PathBuf, AdwatchConfig)> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    let cfg = config::load_or_init_at(&path)?;
    Ok((path, cfg))
}

#[cfg(test)]
mod tests;
