//! JSON POST over libcurl for the notification sinks.
//!
//! Blocking; the notifier calls sinks from `spawn_blocking`.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::redact::redact_url;

/// Response bytes kept for the error message on a non-2xx reply.
const MAX_ERROR_BODY: usize = 512;

/// Per-request timeouts for sink calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub total: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            total: Duration::from_secs(10),
        }
    }
}

/// POSTs `body` as `application/json`. Any non-2xx status is an error.
pub(super) fn post_json(url: &str, body: &[u8], timeouts: HttpTimeouts) -> Result<()> {
    let shown = redact_url(url);
    let mut easy = curl::easy::Easy::new();
    easy.url(url)
        .with_context(|| format!("invalid sink URL {}", shown))?;
    easy.post(true)?;
    easy.post_fields_copy(body)?;
    easy.follow_location(false)?;
    easy.connect_timeout(timeouts.connect)?;
    easy.timeout(timeouts.total)?;

    let mut list = curl::easy::List::new();
    list.append("Content-Type: application/json")?;
    list.append(&format!("User-Agent: adwatch/{}", env!("CARGO_PKG_VERSION")))?;
    // Disable `Expect: 100-continue` so small relays don't stall on large bodies.
    list.append("Expect:")?;
    easy.http_headers(list)?;

    let mut response = Vec::new();
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            let room = MAX_ERROR_BODY.saturating_sub(response.len());
            response.extend_from_slice(&data[..data.len().min(room)]);
            Ok(data.len())
        })?;
        transfer
            .perform()
            .with_context(|| format!("POST {} failed", shown))?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        let snippet = String::from_utf8_lossy(&response);
        anyhow::bail!("POST {} returned HTTP {}: {}", shown, code, snippet.trim());
    }
    tracing::debug!(url = %shown, status = code, "sink accepted notification");
    Ok(())
}
