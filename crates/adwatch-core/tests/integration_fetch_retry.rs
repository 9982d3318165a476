//! Integration test: external fetch job under the retry wrapper, with terminal
//! failures recorded and forwarded the way the `adwatch run` command does it.

#![cfg(unix)]

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use adwatch_core::error::{to_application_error, ErrorCategory};
use adwatch_core::fetch_job::{run_fetch_job, FetchJob};
use adwatch_core::notify::{ErrorContext, ErrorNotifier, WebhookSink};
use adwatch_core::retry::{is_retryable_error, with_retry, with_retry_if, RetryConfig};

fn fast(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay_ms: 10,
        backoff_factor: 2.0,
        max_delay_ms: 50,
    }
}

/// Script that fails with a 503 until it has been run `fail_times` times.
fn flaky_job(dir: &std::path::Path, fail_times: u32) -> FetchJob {
    let counter = dir.join("runs");
    let script = format!(
        "n=$(cat '{c}' 2>/dev/null || echo 0); n=$((n+1)); echo $n > '{c}'; \
         if [ $n -le {f} ]; then echo 'graph API returned 503' >&2; exit 1; fi; \
         echo \"fetched on run $n\"",
        c = counter.display(),
        f = fail_times
    );
    FetchJob::new("sh").args(["-c".to_string(), script])
}

#[tokio::test]
async fn flaky_job_succeeds_after_retries() {
    let dir = tempfile::tempdir().unwrap();
    let job = flaky_job(dir.path(), 2);
    let attempts = AtomicU32::new(0);

    let out = with_retry(&fast(3), || {
        attempts.fetch_add(1, Ordering::SeqCst);
        run_fetch_job(&job)
    })
    .await
    .unwrap();

    assert_eq!(out.stdout.trim(), "fetched on run 3");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_retries_are_recorded_and_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let job = flaky_job(dir.path(), 10);
    let server = common::webhook_server::start(200);
    let notifier = Arc::new(
        ErrorNotifier::new("it", 100, 500)
            .with_sink(Arc::new(WebhookSink::new(server.url("hook"), Default::default()))),
    );

    let attempts = AtomicU32::new(0);
    let err = with_retry(&fast(2), || {
        attempts.fetch_add(1, Ordering::SeqCst);
        run_fetch_job(&job)
    })
    .await
    .unwrap_err();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert!(err.message().contains("graph API returned 503"));

    let app = to_application_error(err.clone(), ErrorCategory::ProcessExecution);
    assert_eq!(app, err);

    let mut ctx = ErrorContext::new();
    ctx.insert("attempts".to_string(), "2".to_string());
    let report = notifier.record_error(app, ctx).await;
    assert_eq!(report.delivered(), 1);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["error"]["category"], "PROCESS_EXECUTION");
    assert_eq!(body["error"]["code"], "PROCESS_EXIT_1");
    assert_eq!(body["context"]["attempts"], "2");
}

#[tokio::test]
async fn opt_in_classification_stops_on_missing_program() {
    let job = FetchJob::new("adwatch-definitely-missing-binary")
        .args(["--limit", "500"]);
    let attempts = AtomicU32::new(0);
    let err = with_retry_if(
        &fast(5),
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            run_fetch_job(&job)
        },
        |e| is_retryable_error(e),
    )
    .await
    .unwrap_err();
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(err.category(), ErrorCategory::FileSystem);
}
