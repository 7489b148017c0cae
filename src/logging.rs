//! tracing subscriber setup.
//!
//! Commands log to stderr. The TUI owns the terminal, so it logs to a daily
//! rolling file in the data directory instead.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_PREFIX: &str = "taskboard.log";

/// `RUST_LOG` wins when set; otherwise the configured level.
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

pub fn init_stderr(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to `<dir>/taskboard.log.<date>`. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init_file(level: &str, dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    guard
}
