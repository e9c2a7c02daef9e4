//! In-test fakes for the media collaborators.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Settings;
use crate::logging::{LogConfig, TaskLogger};
use crate::media::{
    GraphSpec, LegacyCommand, LocalMediaStore, MediaProbe, MediaTranscoder, ProbeError,
    TranscodeError, TranscodeResult,
};
use crate::models::RenderRequest;
use crate::orchestrator::{Context, Services};

/// Write a small placeholder object into a directory store.
pub fn seed_object(root: &Path, bucket: &str, key: &str) {
    let path = root.join(bucket).join(key);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, key.as_bytes()).unwrap();
}

/// Logger writing under `dir/logs` without timestamps.
pub fn test_logger(dir: &Path) -> TaskLogger {
    let config = LogConfig {
        show_timestamps: false,
        ..LogConfig::default()
    };
    TaskLogger::new("test", dir.join("logs"), config, None).unwrap()
}

/// Context over a directory store under `dir/store` with default fakes.
pub fn test_context(dir: &Path) -> Context {
    let services = Services {
        store: Arc::new(LocalMediaStore::new(dir.join("store"))),
        probe: Arc::new(ScriptedProbe::default()),
        transcoder: Arc::new(RecordingTranscoder::default()),
    };
    Context::new(
        RenderRequest::new("task"),
        Settings::default(),
        dir.join("work"),
        services,
        Arc::new(test_logger(dir)),
    )
}

/// Probe answering from a file-name table; unknown files are unavailable.
#[derive(Default)]
pub struct ScriptedProbe {
    durations: Mutex<HashMap<String, i64>>,
}

impl ScriptedProbe {
    pub fn set(&self, file_name: &str, duration_ms: i64) {
        self.durations.lock().insert(file_name.to_string(), duration_ms);
    }
}

impl MediaProbe for ScriptedProbe {
    fn duration_ms(&self, path: &Path) -> Result<i64, ProbeError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.durations
            .lock()
            .get(&name)
            .copied()
            .ok_or_else(|| ProbeError::Unavailable(format!("no duration for {}", name)))
    }
}

/// Transcoder that records every call and touches the output file.
#[derive(Default)]
pub struct RecordingTranscoder {
    pub fail_graph: bool,
    pub fail_legacy: bool,
    pub graphs: Mutex<Vec<GraphSpec>>,
    pub commands: Mutex<Vec<LegacyCommand>>,
}

impl RecordingTranscoder {
    pub fn failing_graph() -> Self {
        Self {
            fail_graph: true,
            ..Self::default()
        }
    }

    pub fn failing_all() -> Self {
        Self {
            fail_graph: true,
            fail_legacy: true,
            ..Self::default()
        }
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.lock().len()
    }

    pub fn command_count(&self) -> usize {
        self.commands.lock().len()
    }

    fn failure(detail: &str) -> TranscodeError {
        TranscodeError::Failed {
            tool: "ffmpeg".to_string(),
            exit_code: 1,
            detail: detail.to_string(),
        }
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"rendered").unwrap();
    }
}

impl MediaTranscoder for RecordingTranscoder {
    fn run_graph(&self, spec: &GraphSpec, _logger: &TaskLogger) -> TranscodeResult<()> {
        self.graphs.lock().push(spec.clone());
        if self.fail_graph {
            return Err(Self::failure("filter graph rejected"));
        }
        Self::touch(&spec.output.path);
        Ok(())
    }

    fn run_command(&self, command: &LegacyCommand, _logger: &TaskLogger) -> TranscodeResult<()> {
        self.commands.lock().push(command.clone());
        if self.fail_legacy {
            return Err(Self::failure("segment cut failed"));
        }
        Self::touch(command.output());
        Ok(())
    }
}
