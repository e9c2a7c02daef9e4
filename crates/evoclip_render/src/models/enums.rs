//! Core enums used throughout the engine.

use serde::{Deserialize, Serialize};

/// Policy used to reconcile an audio clip with a scene's fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitStrategy {
    /// Audio already matches the target.
    #[default]
    None,
    /// Audio is sped up in place so it ends exactly at the target.
    Speedup,
    /// Audio is cut at the target duration.
    Trim,
    /// Trailing silence is appended to reach the target.
    PadSilence,
}

impl FitStrategy {
    /// Wire name of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            FitStrategy::None => "none",
            FitStrategy::Speedup => "speedup",
            FitStrategy::Trim => "trim",
            FitStrategy::PadSilence => "pad_silence",
        }
    }
}

impl std::fmt::Display for FitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured rendering pipeline.
///
/// Deserialized leniently through [`PipelineMode::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PipelineMode {
    /// One ffmpeg invocation with a single filter graph.
    #[default]
    SinglePass,
    /// Per-segment cut, conform and concatenate.
    Legacy,
}

impl PipelineMode {
    /// Parse a mode name, case-insensitive. Unknown names map to `Legacy`,
    /// since anything other than single-pass runs the per-segment path.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "single_pass" => PipelineMode::SinglePass,
            _ => PipelineMode::Legacy,
        }
    }
}

impl From<String> for PipelineMode {
    fn from(value: String) -> Self {
        PipelineMode::parse(&value)
    }
}

impl std::fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineMode::SinglePass => write!(f, "single_pass"),
            PipelineMode::Legacy => write!(f, "legacy"),
        }
    }
}

/// Rendering path that actually produced the final video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineUsed {
    /// The single-pass graph succeeded.
    SinglePass,
    /// Single-pass failed and the legacy path recovered.
    LegacyFallback,
    /// Legacy path was configured directly.
    Legacy,
}

impl std::fmt::Display for PipelineUsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineUsed::SinglePass => write!(f, "single_pass"),
            PipelineUsed::LegacyFallback => write!(f, "legacy_fallback"),
            PipelineUsed::Legacy => write!(f, "legacy"),
        }
    }
}

/// Outcome of speech synthesis for one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioStatus {
    #[default]
    Ok,
    /// Anything other than `ok` is not renderable.
    #[serde(other)]
    Failed,
}
