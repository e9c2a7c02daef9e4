//! Per-task logger with file and sink output.
//!
//! Each render invocation gets its own logger that:
//! - Writes to a dedicated log file named after the task
//! - Mirrors every line into `tracing` at the matching level
//! - Forwards formatted lines to an optional sink
//! - Keeps a bounded tail of external tool output for failure reports

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogConfig, LogLevel, LogSink, MessagePrefix};

/// Per-task logger.
pub struct TaskLogger {
    /// Task identifier.
    task_id: String,
    /// Path to the log file.
    log_path: PathBuf,
    /// File writer (None after close).
    file_writer: Mutex<Option<BufWriter<File>>>,
    /// Optional extra sink.
    sink: Option<LogSink>,
    /// Logging configuration.
    config: LogConfig,
    /// Recent external tool output lines.
    tail_buffer: Mutex<VecDeque<String>>,
}

impl TaskLogger {
    /// Create a logger writing to `<log_dir>/<task_id>.log`.
    pub fn new(
        task_id: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        sink: Option<LogSink>,
    ) -> std::io::Result<Self> {
        let task_id = task_id.into();
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)?;
        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&task_id)));
        let file = File::create(&log_path)?;

        Ok(Self {
            task_id,
            log_path,
            file_writer: Mutex::new(Some(BufWriter::new(file))),
            sink,
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }

        match level {
            LogLevel::Trace => tracing::trace!(task = %self.task_id, "{}", message),
            LogLevel::Debug => tracing::debug!(task = %self.task_id, "{}", message),
            LogLevel::Info => tracing::info!(task = %self.task_id, "{}", message),
            LogLevel::Warn => tracing::warn!(task = %self.task_id, "{}", message),
            LogLevel::Error => tracing::error!(task = %self.task_id, "{}", message),
        }

        self.output(&self.format_message(message));
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log an external command about to run.
    pub fn command(&self, command: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
    }

    /// Log a pipeline phase marker.
    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    pub fn section(&self, section_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Section.format(section_name));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Record one line of external tool output.
    ///
    /// Always kept in the tail buffer; echoed to the log only when not compact.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        {
            let mut buffer = self.tail_buffer.lock();
            if self.config.error_tail > 0 && buffer.len() >= self.config.error_tail {
                buffer.pop_front();
            }
            if self.config.error_tail > 0 {
                buffer.push_back(line.to_string());
            }
        }

        if self.config.compact {
            return;
        }

        let prefix = if is_stderr { "[stderr] " } else { "" };
        self.output(&self.format_message(&format!("{}{}", prefix, line)));
    }

    /// Write the tail buffer into the log (typically after a failure).
    pub fn show_tail(&self, header: &str) {
        let buffer = self.tail_buffer.lock();
        if buffer.is_empty() {
            return;
        }

        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in buffer.iter() {
            self.output(&self.format_message(line));
        }
    }

    pub fn clear_tail(&self) {
        self.tail_buffer.lock().clear();
    }

    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Log a filter graph one chain per line, if enabled.
    pub fn log_filter_graph(&self, graph: &str) {
        if !self.config.show_filter_graph {
            return;
        }
        self.section("filter graph");
        for chain in graph.split(';') {
            self.info(&format!("  {}", chain));
        }
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and release the log file.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }

        if let Some(ref sink) = self.sink {
            sink(formatted);
        }
    }
}

impl Drop for TaskLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Replace characters that are unsafe in file names.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn quiet_config() -> LogConfig {
        LogConfig {
            show_timestamps: false,
            ..LogConfig::default()
        }
    }

    #[test]
    fn creates_log_file_named_after_task() {
        let dir = tempdir().unwrap();
        let logger = TaskLogger::new("task/7", dir.path(), quiet_config(), None).unwrap();

        assert!(logger.log_path().exists());
        assert!(logger.log_path().ends_with("task_7.log"));
    }

    #[test]
    fn writes_prefixed_lines_to_file() {
        let dir = tempdir().unwrap();
        let logger = TaskLogger::new("task", dir.path(), quiet_config(), None).unwrap();

        logger.phase("Plan");
        logger.warn("probe unavailable");
        logger.flush();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("=== Plan ==="));
        assert!(content.contains("[WARNING] probe unavailable"));
    }

    #[test]
    fn filters_below_level() {
        let dir = tempdir().unwrap();
        let logger = TaskLogger::new("task", dir.path(), quiet_config(), None).unwrap();

        logger.debug("hidden");
        logger.flush();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(!content.contains("hidden"));
    }

    #[test]
    fn forwards_to_sink() {
        let dir = tempdir().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let sink: LogSink = Box::new(move |_line| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        let logger = TaskLogger::new("task", dir.path(), quiet_config(), Some(sink)).unwrap();
        logger.info("one");
        logger.success("two");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn tail_buffer_keeps_most_recent_lines() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            error_tail: 3,
            ..quiet_config()
        };
        let logger = TaskLogger::new("task", dir.path(), config, None).unwrap();

        for i in 0..6 {
            logger.output_line(&format!("frame={}", i), true);
        }

        assert_eq!(logger.get_tail(), vec!["frame=3", "frame=4", "frame=5"]);
        logger.clear_tail();
        assert!(logger.get_tail().is_empty());
    }

    #[test]
    fn compact_mode_keeps_tool_output_out_of_file() {
        let dir = tempdir().unwrap();
        let logger = TaskLogger::new("task", dir.path(), quiet_config(), None).unwrap();

        logger.output_line("Stream mapping:", true);
        logger.flush();
        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(!content.contains("Stream mapping"));

        logger.show_tail("ffmpeg");
        logger.flush();
        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("[ffmpeg/tail]"));
        assert!(content.contains("Stream mapping"));
    }

    #[test]
    fn filter_graph_logged_per_chain_when_enabled() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            show_filter_graph: true,
            ..quiet_config()
        };
        let logger = TaskLogger::new("task", dir.path(), config, None).unwrap();

        logger.log_filter_graph("[0:v:0]trim=start=0[v0];[v0][a0]concat=n=1:v=1:a=1[vout][aout]");
        logger.flush();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("--- filter graph ---"));
        assert!(content.contains("  [0:v:0]trim=start=0[v0]\n"));
    }
}
