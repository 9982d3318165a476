//! `adwatch run -- <program> [args...]` – run the fetch job with retries; report the last failure.

use adwatch_core::config::AdwatchConfig;
use adwatch_core::error::{to_application_error, ErrorCategory};
use adwatch_core::fetch_job::{is_retryable_failure, require_env, run_fetch_job, FetchJob};
use adwatch_core::notify::{DispatchReport, ErrorContext, ErrorNotifier};
use adwatch_core::retry::{with_retry, with_retry_if, RetryOverrides};
use anyhow::Result;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Options collected from the `run` subcommand.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub retry: RetryOverrides,
    pub timeout_secs: Option<u64>,
    pub require_env: Vec<String>,
    pub only_retryable: bool,
    pub command: Vec<String>,
}

pub async fn run_fetch(
    cfg: &AdwatchConfig,
    notifier: &ErrorNotifier,
    opts: RunOptions,
) -> Result<()> {
    let Some((program, args)) = opts.command.split_first() else {
        anyhow::bail!("no command given after `--`");
    };
    let mut job = FetchJob::new(program.as_str()).args(args.iter().cloned());
    if let Some(secs) = opts.timeout_secs {
        job = job.timeout(Duration::from_secs(secs));
    }
    let command_line = job.command_line();

    let mut context = ErrorContext::new();
    context.insert("command".to_string(), command_line.clone());

    let required: Vec<&str> = opts.require_env.iter().map(String::as_str).collect();
    if let Err(missing) = require_env(&required) {
        let report = notifier.record_error(missing.clone(), context).await;
        print_report(&report);
        return Err(anyhow::Error::new(missing).context("fetch job not started"));
    }

    let retry = opts.retry.merge(cfg.retry_config());
    let attempts = AtomicU32::new(0);
    let attempt = || {
        attempts.fetch_add(1, Ordering::SeqCst);
        run_fetch_job(&job)
    };
    let result = if opts.only_retryable {
        with_retry_if(&retry, attempt, is_retryable_failure).await
    } else {
        with_retry(&retry, attempt).await
    };
    let attempts = attempts.load(Ordering::SeqCst);

    match result {
        Ok(output) => {
            tracing::info!(
                command = %command_line,
                attempts,
                elapsed_ms = output.elapsed.as_millis() as u64,
                "fetch job succeeded"
            );
            print!("{}", output.stdout);
            Ok(())
        }
        Err(e) => {
            let error = to_application_error(e, ErrorCategory::ProcessExecution);
            context.insert("attempts".to_string(), attempts.to_string());
            context.insert("max_attempts".to_string(), retry.max_attempts.to_string());
            let report = notifier.record_error(error.clone(), context).await;
            print_report(&report);
            let summary = format!("fetch job failed after {} attempt(s)", attempts);
            Err(anyhow::Error::new(error).context(summary))
        }
    }
}

fn print_report(report: &DispatchReport) {
    if let Some(reason) = report.skipped {
        eprintln!("error recorded locally (not forwarded: {:?})", reason);
        return;
    }
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => eprintln!("notified {}", outcome.sink),
            Err(e) => eprintln!("failed to notify {}: {}", outcome.sink, e),
        }
    }
}
