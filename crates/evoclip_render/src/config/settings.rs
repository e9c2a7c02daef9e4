//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::fit::DEFAULT_MAX_SPEED;
use crate::logging::LogLevel;
use crate::models::PipelineMode;

/// Lowest frame rate accepted for the output video.
pub const MIN_OUTPUT_FPS: u32 = 1;

/// Lowest audio sample rate accepted for the output video.
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Configuration sections, used for section-level updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Paths,
    Logging,
    Render,
    Storage,
    Tools,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Render,
        ConfigSection::Storage,
        ConfigSection::Tools,
    ];

    /// TOML table name of the section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Render => "render",
            ConfigSection::Storage => "storage",
            ConfigSection::Tools => "tools",
        }
    }

    /// Comment written above the section in generated files.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Working directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Render => "Timeline rendering and audio fitting",
            ConfigSection::Storage => "Object storage layout",
            ConfigSection::Tools => "External tool locations (empty = search PATH)",
        }
    }
}

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub render: RenderSettings,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub tools: ToolSettings,
}

/// Path configuration for temporary files and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Root under which each render creates its private work directory.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for per-task log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level written to task logs.
    #[serde(default)]
    pub level: LogLevel,

    /// Keep ffmpeg output out of the log body (still kept in the tail).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines shown after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Log the single-pass filter graph one chain per line.
    #[serde(default)]
    pub show_filter_graph: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            error_tail: default_error_tail(),
            show_filter_graph: false,
        }
    }
}

/// Rendering and audio-fit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Preferred rendering pipeline.
    #[serde(default)]
    pub pipeline_mode: PipelineMode,

    /// Fall back to the legacy pipeline when single-pass fails.
    #[serde(default = "default_true")]
    pub allow_legacy_fallback: bool,

    /// Highest tempo factor applied to narration before trimming instead.
    #[serde(default = "default_max_speed")]
    pub audio_fit_max_speed: f64,

    /// Output frame rate.
    #[serde(default = "default_output_fps")]
    pub output_fps: u32,

    /// Output audio sample rate (mono).
    #[serde(default = "default_output_sample_rate")]
    pub output_sample_rate: u32,

    /// Video encoder for rendered output.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Audio encoder for the final output.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Output pixel format.
    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,
}

fn default_max_speed() -> f64 {
    DEFAULT_MAX_SPEED
}

fn default_output_fps() -> u32 {
    30
}

fn default_output_sample_rate() -> u32 {
    24_000
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_pixel_format() -> String {
    "yuv420p".to_string()
}

impl RenderSettings {
    /// Frame rate clamped to a usable value.
    pub fn effective_fps(&self) -> u32 {
        self.output_fps.max(MIN_OUTPUT_FPS)
    }

    /// Sample rate clamped to a usable value.
    pub fn effective_sample_rate(&self) -> u32 {
        self.output_sample_rate.max(MIN_SAMPLE_RATE)
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            pipeline_mode: PipelineMode::SinglePass,
            allow_legacy_fallback: true,
            audio_fit_max_speed: default_max_speed(),
            output_fps: default_output_fps(),
            output_sample_rate: default_output_sample_rate(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            pixel_format: default_pixel_format(),
        }
    }
}

/// Object storage layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Root directory of the local store (one sub-directory per bucket).
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Bucket holding source videos.
    #[serde(default = "default_videos_bucket")]
    pub videos_bucket: String,

    /// Bucket receiving final videos and timelines.
    #[serde(default = "default_output_bucket")]
    pub output_bucket: String,
}

fn default_storage_root() -> String {
    "storage".to_string()
}

fn default_videos_bucket() -> String {
    "videos".to_string()
}

fn default_output_bucket() -> String {
    "output".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            videos_bucket: default_videos_bucket(),
            output_bucket: default_output_bucket(),
        }
    }
}

/// External tool locations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Path to ffmpeg (empty = `ffmpeg` from PATH).
    #[serde(default)]
    pub ffmpeg_path: String,

    /// Path to ffprobe (empty = `ffprobe` from PATH).
    #[serde(default)]
    pub ffprobe_path: String,
}

impl ToolSettings {
    pub fn ffmpeg(&self) -> &str {
        non_empty_or(&self.ffmpeg_path, "ffmpeg")
    }

    pub fn ffprobe(&self) -> &str {
        non_empty_or(&self.ffprobe_path, "ffprobe")
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.render.pipeline_mode, PipelineMode::SinglePass);
        assert!(settings.render.allow_legacy_fallback);
        assert_eq!(settings.render.audio_fit_max_speed, 1.10);
        assert_eq!(settings.render.output_fps, 30);
        assert_eq!(settings.render.output_sample_rate, 24_000);
        assert_eq!(settings.storage.output_bucket, "output");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            "[render]\npipeline_mode = \"legacy\"\nallow_legacy_fallback = false\n",
        )
        .unwrap();
        assert_eq!(settings.render.pipeline_mode, PipelineMode::Legacy);
        assert!(!settings.render.allow_legacy_fallback);
        assert_eq!(settings.render.output_fps, 30);
        assert_eq!(settings.paths.temp_root, ".temp");
    }

    #[test]
    fn non_canonical_pipeline_mode_loads() {
        for (raw, expected) in [
            ("segmented", PipelineMode::Legacy),
            ("SINGLE_PASS", PipelineMode::SinglePass),
            ("Legacy", PipelineMode::Legacy),
        ] {
            let settings: Settings =
                toml::from_str(&format!("[render]\npipeline_mode = \"{}\"\n", raw)).unwrap();
            assert_eq!(settings.render.pipeline_mode, expected, "{}", raw);
        }
    }

    #[test]
    fn effective_values_are_clamped() {
        let render = RenderSettings {
            output_fps: 0,
            output_sample_rate: 4000,
            ..RenderSettings::default()
        };
        assert_eq!(render.effective_fps(), 1);
        assert_eq!(render.effective_sample_rate(), 8000);
    }

    #[test]
    fn tools_fall_back_to_path_lookup() {
        let mut tools = ToolSettings::default();
        assert_eq!(tools.ffmpeg(), "ffmpeg");
        tools.ffprobe_path = "/opt/ffmpeg/bin/ffprobe".to_string();
        assert_eq!(tools.ffprobe(), "/opt/ffmpeg/bin/ffprobe");
    }
}
