//! Structured logging setup using `tracing-subscriber` and `tracing-appender`.
//!
//! Console output on stderr always; when a logs directory is configured an
//! additional JSON file layer with daily rotation is attached.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Holds the non-blocking writer guard for file logging.
///
/// The [`WorkerGuard`] must be kept alive for the duration of the process.
/// Dropping it flushes pending log entries and closes the file.
pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
}

/// Initialise logging.
///
/// Writes JSON logs to `{logs_dir}/skald.log.YYYY-MM-DD` with daily rotation
/// when `logs_dir` is given, plus human-readable output to stderr. The filter
/// comes from `RUST_LOG`, falling back to `default_level`.
///
/// Returns a [`LoggingGuard`] that must be kept alive for log flushing.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created.
pub fn init(logs_dir: Option<&Path>, default_level: &str) -> anyhow::Result<LoggingGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let Some(dir) = logs_dir else {
        let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
        return Ok(LoggingGuard { _guard: None });
    };

    std::fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("failed to create logs directory {}: {e}", dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(dir, "skald.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard {
        _guard: Some(guard),
    })
}
