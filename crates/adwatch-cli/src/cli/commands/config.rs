//! `adwatch config` – print the config path and effective settings with secrets redacted.

use adwatch_core::config::AdwatchConfig;
use anyhow::Result;
use std::path::Path;

pub fn run_show_config(path: &Path, cfg: &AdwatchConfig) -> Result<()> {
    let shown = AdwatchConfig {
        notify: cfg.notify.as_ref().map(|n| n.redacted()),
        ..cfg.clone()
    };
    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(&shown)?);

    let retry = cfg.retry_config();
    println!(
        "# effective retry: {} attempt(s), {}ms initial, x{}, {}ms cap",
        retry.max_attempts, retry.initial_delay_ms, retry.backoff_factor, retry.max_delay_ms
    );
    Ok(())
}
