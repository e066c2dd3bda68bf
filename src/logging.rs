use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "funding_etl=info";

/// Initializes the logging system with both console and file output.
///
/// The returned guard must be held until exit so buffered file logs are flushed.
pub fn init_logging(log_dir: &Path) -> WorkerGuard {
    // Ensure logs directory exists
    let _ = fs::create_dir_all(log_dir);

    // Create a non-blocking file appender for daily log rotation
    let file_appender = tracing_appender::rolling::daily(log_dir, "funding_etl.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    // JSON layer for file logging
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    // Formatted layer for console logging
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}
