//! Audio-fit decision.
//!
//! Maps a raw narration duration and a scene's fixed duration to the
//! strategy used to reconcile them. This is the single governing policy
//! for audio/video sync, so the branch order and the `<=` speed limit
//! boundary are fixed.

use crate::models::FitStrategy;

/// Default intelligibility limit for speeding up narration.
pub const DEFAULT_MAX_SPEED: f64 = 1.10;

/// Decide how to fit `raw_audio_ms` of audio into `target_ms` of video.
///
/// Returns the strategy and the tempo factor to apply. The factor is only
/// meaningful for [`FitStrategy::Speedup`]; every other strategy returns 1.0.
///
/// - Non-positive target: `Trim` (audio discarded to zero length)
/// - Longer audio within the speed limit: `Speedup` by `raw / target`
/// - Longer audio beyond the limit: `Trim`
/// - Shorter audio: `PadSilence`
/// - Equal: `None`
pub fn decide(raw_audio_ms: i64, target_ms: i64, max_speed: f64) -> (FitStrategy, f64) {
    if target_ms <= 0 {
        return (FitStrategy::Trim, 1.0);
    }

    if raw_audio_ms > target_ms {
        let ratio = raw_audio_ms as f64 / target_ms as f64;
        if ratio <= max_speed.max(1.0) {
            return (FitStrategy::Speedup, ratio);
        }
        return (FitStrategy::Trim, 1.0);
    }

    if raw_audio_ms < target_ms {
        return (FitStrategy::PadSilence, 1.0);
    }

    (FitStrategy::None, 1.0)
}

/// Per-strategy counters accumulated while planning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FitCounts {
    pub speedup: u32,
    pub trim: u32,
    pub pad: u32,
}

impl FitCounts {
    /// Count one decision.
    pub fn record(&mut self, strategy: FitStrategy) {
        match strategy {
            FitStrategy::Speedup => self.speedup += 1,
            FitStrategy::Trim => self.trim += 1,
            FitStrategy::PadSilence => self.pad += 1,
            FitStrategy::None => {}
        }
    }
}
