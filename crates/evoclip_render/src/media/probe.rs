//! Media duration probing.

use std::path::Path;
use std::process::Command;

use crate::config::ToolSettings;

use super::types::ProbeError;

/// Reports the duration of a local media file.
pub trait MediaProbe: Send + Sync {
    /// Duration in whole milliseconds.
    fn duration_ms(&self, path: &Path) -> Result<i64, ProbeError>;
}

/// Probe backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    program: String,
}

impl FfprobeProbe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_settings(tools: &ToolSettings) -> Self {
        Self::new(tools.ffprobe())
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProbe for FfprobeProbe {
    fn duration_ms(&self, path: &Path) -> Result<i64, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::NotFound(path.to_path_buf()));
        }

        let output = Command::new(&self.program)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path)
            .output()
            .map_err(|e| ProbeError::Unavailable(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(ProbeError::Unavailable(format!(
                "{} failed on {}: {}",
                self.program,
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_duration_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse ffprobe's bare `format=duration` output (seconds) into milliseconds.
///
/// Fractional milliseconds are truncated.
pub fn parse_duration_output(stdout: &str) -> Result<i64, ProbeError> {
    let trimmed = stdout.trim();
    let seconds: f64 = trimmed
        .parse()
        .map_err(|_| ProbeError::Invalid(format!("not a duration: '{}'", trimmed)))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ProbeError::Invalid(format!("not a duration: '{}'", trimmed)));
    }

    Ok((seconds * 1000.0) as i64)
}
