//! Logging infrastructure.
//!
//! This module provides:
//! - Per-task loggers writing a dedicated log file plus an optional sink
//! - Compact mode that keeps external tool output out of the log body
//! - Tail buffer of tool output shown when a command fails
//! - Process-wide `tracing` subscriber setup for binaries
//!
//! # Example
//!
//! ```no_run
//! use evoclip_render::logging::{LogConfig, TaskLogger};
//!
//! let logger = TaskLogger::new("task-42", "/tmp/logs", LogConfig::default(), None).unwrap();
//! logger.phase("Render");
//! logger.command("ffmpeg -y -i source.mp4 ...");
//! logger.success("Render completed");
//! ```

mod task_logger;
mod types;

pub use task_logger::TaskLogger;
pub use types::{LogConfig, LogLevel, LogSink, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`, falling back to `default_level`. Output goes to
/// stderr so stdout stays free for machine-readable results. Safe to call
/// more than once; later calls are ignored.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .try_init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
