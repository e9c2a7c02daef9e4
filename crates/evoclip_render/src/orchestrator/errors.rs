//! Error types for the render pipeline.
//!
//! Errors carry context that chains through layers:
//! Task → Step → Operation → Detail
//!
//! Every error maps to a stable code string via `code()`.

use std::io;

use thiserror::Error;

use crate::media::MediaError;
use crate::planning::PlanError;
use crate::render::RenderError;

/// Top-level pipeline error with task context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step failed.
    #[error("Task '{task_id}' failed at step '{step_name}': {source}")]
    StepFailed {
        task_id: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Failed to set up the task (work directory, log file).
    #[error("Task '{task_id}' setup failed: {message}")]
    SetupFailed { task_id: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        task_id: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            task_id: task_id.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn setup_failed(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            task_id: task_id.into(),
            message: message.into(),
        }
    }

    /// Stable error code.
    pub fn code(&self) -> String {
        match self {
            PipelineError::StepFailed { source, .. } => source.code(),
            PipelineError::SetupFailed { message, .. } => format!("setup_failed:{}", message),
        }
    }

    /// The step error, if a step failed.
    pub fn step_error(&self) -> Option<&StepError> {
        match self {
            PipelineError::StepFailed { source, .. } => Some(source),
            PipelineError::SetupFailed { .. } => None,
        }
    }
}

/// Error from a pipeline step with operation context.
#[derive(Error, Debug)]
pub enum StepError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// An entry starts before its predecessor.
    #[error("Timeline entry {index} starts at {start_ms}ms, before previous start {previous_start_ms}ms")]
    TimelineNonMonotonic {
        index: usize,
        previous_start_ms: i64,
        start_ms: i64,
    },

    /// Upload or bucket provisioning failed.
    #[error("Storage error in {operation}: {source}")]
    Storage {
        operation: String,
        #[source]
        source: MediaError,
    },

    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    #[error("I/O error in {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn storage(operation: impl Into<String>, source: MediaError) -> Self {
        Self::Storage {
            operation: operation.into(),
            source,
        }
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn serialize(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialize {
            what: what.into(),
            source,
        }
    }

    /// Stable error code.
    pub fn code(&self) -> String {
        match self {
            StepError::Plan(PlanError::EmptySourceVideoRefs) => "empty_source_video_refs".to_string(),
            StepError::Plan(PlanError::NoRenderableSegments) => "no_renderable_segments".to_string(),
            StepError::Plan(e @ PlanError::Storage { .. }) => format!("storage_failed:{}", e),
            StepError::Render(e) => e.code(),
            StepError::TimelineNonMonotonic { .. } => "timeline_non_monotonic".to_string(),
            StepError::Storage { .. } | StepError::Serialize { .. } => {
                format!("storage_failed:{}", self)
            }
            StepError::InvalidInput(message) => format!("invalid_input:{}", message),
            StepError::InvalidOutput(message) => format!("invalid_output:{}", message),
            StepError::IoError { .. } => format!("io_failed:{}", self),
        }
    }
}

/// Result type for step operations.
pub type StepResult<T> = Result<T, StepError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
