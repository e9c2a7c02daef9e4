//! Configuration management.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Defaults filled in for missing keys on load
//!
//! # Example
//!
//! ```no_run
//! use evoclip_render::config::{ConfigManager, ConfigSection};
//! use evoclip_render::models::PipelineMode;
//!
//! let mut config = ConfigManager::new("config/render.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Max speed-up: {}", config.settings().render.audio_fit_max_speed);
//!
//! config.settings_mut().render.pipeline_mode = PipelineMode::Legacy;
//! config.update_section(ConfigSection::Render).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, PathSettings, RenderSettings, Settings, StorageSettings,
    ToolSettings, MIN_OUTPUT_FPS, MIN_SAMPLE_RATE,
};
