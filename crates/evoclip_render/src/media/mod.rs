//! External media collaborators.
//!
//! Object storage ([`MediaStore`]), duration probing ([`MediaProbe`]) and
//! transcoding ([`MediaTranscoder`]) are traits injected into the render
//! service. Each has one shipped implementation:
//!
//! - [`LocalMediaStore`]: one directory per bucket under a root
//! - [`FfprobeProbe`]: `ffprobe -show_entries format=duration`
//! - [`FfmpegTranscoder`]: `ffmpeg`, argv compiled from [`GraphSpec`] / [`LegacyCommand`]

mod probe;
mod store;
mod transcoder;
mod types;

pub use probe::{parse_duration_output, FfprobeProbe, MediaProbe};
pub use store::{LocalMediaStore, MediaStore};
pub use transcoder::{
    loop_count, seconds, FfmpegTranscoder, GraphSpec, LegacyCommand, MediaTranscoder, OutputSpec,
};
pub use types::{MediaError, MediaRef, MediaResult, ProbeError, TranscodeError, TranscodeResult};
