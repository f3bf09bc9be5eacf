//! Structured Logger
//!
//! Wraps `tracing` to provide console output, a daily-rolling NDJSON file,
//! and environment-based level control (`RUST_LOG` overrides the configured level).

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global structured logger.
///
/// Creates a console logger and a rolling file logger writing
/// `<log_dir>/chequeforge.<date>.log`. Keep the returned guard alive for the
/// life of the process or buffered file lines are lost on exit.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> Result<WorkerGuard> {
    let log_dir = log_dir.as_ref();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("chequeforge")
        .filename_suffix("log")
        .build(log_dir)
        .context("Failed to create rolling log file")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(file_writer).with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(true);

    // A second init (tests, embedded use) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_log_directory() {
        let dir = std::env::temp_dir().join(format!("chequeforge-logs-{}", std::process::id()));
        let guard = init_logger(&dir, "debug").unwrap();
        tracing::info!("logger smoke test");
        drop(guard);
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(dir);
    }
}
