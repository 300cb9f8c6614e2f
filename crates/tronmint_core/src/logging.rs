use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::DashboardConfig;

/// Filter used when neither `RUST_LOG` nor the config file sets one.
pub const DEFAULT_FILTER: &str = "info,tronmint_wallet=debug,tronmint_app=debug";

const FILE_PREFIX: &str = "tronmint";

/// Pick the filter directives to run with: `RUST_LOG`, then the configured
/// `log_filter`, then [`DEFAULT_FILTER`]. Blank or unparseable candidates
/// are skipped.
pub fn filter_directives<'a>(rust_log: Option<&'a str>, configured: Option<&'a str>) -> &'a str {
    [rust_log, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty() && EnvFilter::try_new(candidate).is_ok())
        .unwrap_or(DEFAULT_FILTER)
}

fn env_filter(configured: Option<&str>) -> EnvFilter {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    EnvFilter::new(filter_directives(rust_log.as_deref(), configured))
}

fn rolling_file(logs_dir: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(logs_dir)?;
    let appender = tracing_appender::rolling::daily(logs_dir, FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

/// Daily rolling file under `~/.tronmint/logs` plus compact stderr output.
/// `configured` is the config file's `log_filter`.
/// Returns a guard that must be kept alive for the duration of the process.
pub fn init_logging(configured: Option<&str>) -> Result<WorkerGuard> {
    let (file_writer, guard) = rolling_file(&DashboardConfig::logs_dir()?)?;

    tracing_subscriber::registry()
        .with(env_filter(configured))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

/// File-only logging into `logs_dir`, for tests and embedding.
pub fn init_logging_to_dir(logs_dir: &Path, filter: &str) -> Result<WorkerGuard> {
    let (file_writer, guard) = rolling_file(logs_dir)?;

    tracing_subscriber::registry()
        .with(env_filter(Some(filter)))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}
