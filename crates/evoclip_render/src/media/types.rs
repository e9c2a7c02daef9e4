//! Shared media types and error enums.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A `bucket/object` reference into object storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaRef {
    pub bucket: String,
    pub key: String,
}

impl MediaRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Split `bucket/object/with/slashes` at the first slash.
    ///
    /// Returns None when either half would be empty.
    pub fn parse(value: &str) -> Option<Self> {
        let (bucket, key) = value.split_once('/')?;
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self::new(bucket, key))
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Object storage errors.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid media reference '{0}'")]
    InvalidRef(String),

    #[error("Storage I/O error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl MediaError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for storage operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Duration probing errors. Always recovered by the planner.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The probe tool could not be run or refused the file.
    #[error("Probe unavailable: {0}")]
    Unavailable(String),

    /// The probe ran but its output was not a duration.
    #[error("Invalid probe output: {0}")]
    Invalid(String),

    #[error("Probe input not found: {0}")]
    NotFound(PathBuf),
}

/// Transcoding errors, carrying the process exit detail.
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("{tool} not found")]
    ToolMissing { tool: String },

    #[error("{tool} exited with code {exit_code}: {detail}")]
    Failed {
        tool: String,
        exit_code: i32,
        detail: String,
    },

    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The request could not be compiled into a command.
    #[error("Invalid transcode request: {0}")]
    InvalidRequest(String),
}

impl TranscodeError {
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Result type for transcoding operations.
pub type TranscodeResult<T> = Result<T, TranscodeError>;
