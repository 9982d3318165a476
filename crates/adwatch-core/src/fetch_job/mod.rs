//! Run the external ads-fetch job as a child process.
//!
//! The job itself (API calls, database upserts) lives outside this crate. This
//! module only spawns it, captures its output and maps every way it can fail
//! onto the error taxonomy so the caller can retry, record and notify.

mod env;

pub use env::{require_env, require_env_with};

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use crate::error::{ApplicationError, ErrorCategory};
use crate::retry::is_retryable_error;

/// Lines of stderr kept in the error message of a failed run.
const STDERR_TAIL_LINES: usize = 20;

/// An external command to run.
#[derive(Debug, Clone, Default)]
pub struct FetchJob {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub working_dir: Option<PathBuf>,
    /// Kill the job if it runs longer than this.
    pub timeout: Option<Duration>,
}

impl FetchJob {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Program and arguments joined by spaces, for logs and error messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone)]
pub struct FetchOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Spawn the job, wait for it and capture its output.
///
/// Non-zero exit, spawn failure and timeout are all returned as
/// `ApplicationError`s. Messages never contain the program or its arguments,
/// only the failure itself and the stderr tail, so message-based retry
/// classification sees what the job reported and not how it was invoked.
pub async fn run_fetch_job(job: &FetchJob) -> Result<FetchOutput, ApplicationError> {
    let command_line = job.command_line();
    let mut cmd = tokio::process::Command::new(&job.program);
    cmd.args(&job.args)
        .envs(job.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &job.working_dir {
        cmd.current_dir(dir);
    }

    tracing::info!(command = %command_line, "starting fetch job");
    let started = Instant::now();
    let child = cmd.spawn().map_err(|e| {
        tracing::warn!(command = %command_line, "could not start fetch job: {}", e);
        spawn_error(e)
    })?;

    let waited = match job.timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(waited) => waited,
            // Dropping the wait future drops the child, which kills it (kill_on_drop).
            Err(_) => {
                tracing::warn!(command = %command_line, "fetch job timed out");
                return Err(timeout_error(limit));
            }
        },
        None => child.wait_with_output().await,
    };
    let output = waited.map_err(|e| {
        ApplicationError::new(
            format!("waiting for fetch job: {}", e),
            ErrorCategory::ProcessExecution,
        )
        .with_code("PROCESS_WAIT_ERROR")
    })?;
    let elapsed = started.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let (what, code) = match output.status.code() {
            Some(n) => (
                format!("exited with status {}", n),
                format!("PROCESS_EXIT_{}", n),
            ),
            None => (
                "was terminated by a signal".to_string(),
                "PROCESS_SIGNAL".to_string(),
            ),
        };
        tracing::warn!(command = %command_line, code = %code, "fetch job {}", what);
        let tail = stderr_tail(&stderr, STDERR_TAIL_LINES);
        let message = if tail.is_empty() {
            format!("fetch job {}", what)
        } else {
            format!("fetch job {}: {}", what, tail)
        };
        let error = ApplicationError::new(message, ErrorCategory::ProcessExecution);
        return Err(error.with_code(code));
    }

    tracing::info!(
        command = %command_line,
        elapsed_ms = elapsed.as_millis() as u64,
        stdout_lines = stdout.lines().count(),
        "fetch job finished"
    );
    Ok(FetchOutput {
        stdout,
        stderr,
        elapsed,
    })
}

/// Retry predicate for [`run_fetch_job`] failures.
///
/// Spawn failures never heal by themselves and timeouts always may; anything
/// else is judged by its message (exit status plus stderr tail).
pub fn is_retryable_failure(error: &ApplicationError) -> bool {
    match error.code() {
        Some("COMMAND_NOT_FOUND" | "COMMAND_NOT_EXECUTABLE") => false,
        Some("PROCESS_TIMEOUT") => true,
        _ => is_retryable_error(error),
    }
}

fn spawn_error(e: io::Error) -> ApplicationError {
    let (category, code) = match e.kind() {
        io::ErrorKind::NotFound => (ErrorCategory::FileSystem, "COMMAND_NOT_FOUND"),
        io::ErrorKind::PermissionDenied => (ErrorCategory::FileSystem, "COMMAND_NOT_EXECUTABLE"),
        _ => (ErrorCategory::ProcessExecution, "PROCESS_SPAWN_ERROR"),
    };
    let message = format!("could not start fetch job: {}", e);
    ApplicationError::new(message, category).with_code(code)
}

fn timeout_error(limit: Duration) -> ApplicationError {
    ApplicationError::new(
        format!("fetch job timed out after {}s", limit.as_secs_f64()),
        ErrorCategory::ProcessExecution,
    )
    .with_status(504)
    .with_code("PROCESS_TIMEOUT")
}

/// Last `n` non-empty lines of `stderr`, newline-joined.
fn stderr_tail(stderr: &str, n: usize) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
