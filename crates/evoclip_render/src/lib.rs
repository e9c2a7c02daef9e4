//! EvoClip Render - timeline synthesis and audio-fit engine.
//!
//! Assembles a narrated output video from scene clips and independently
//! synthesized narration audio. Each (scene, sentence, audio) triple is
//! fitted to the scene's fixed duration, rendered into one continuous
//! video, and described by a machine-readable timeline.
//!
//! The crate has no knowledge of where inputs come from. Storage, probing
//! and transcoding are injected through the traits in [`media`].

pub mod config;
pub mod fit;
pub mod logging;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod planning;
pub mod render;
pub mod service;

#[cfg(test)]
mod testing;

pub use service::RenderService;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
