//! Segment-by-segment renderer.
//!
//! For each segment, strictly in order: conform the narration to a PCM WAV
//! of exactly the target length, then cut (or loop) the source sub-range and
//! mux it with that audio into `segment_NNNN.mov`. The intermediates are
//! then concatenated through a `segments.txt` list.

use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::TaskLogger;
use crate::media::{LegacyCommand, MediaTranscoder, OutputSpec, TranscodeError, TranscodeResult};
use crate::planning::Segment;

/// Name of the concat list written into the work directory.
pub const LIST_FILE_NAME: &str = "segments.txt";

/// Commands for one segment: audio conform, then cut and merge.
pub fn segment_commands(
    index: usize,
    segment: &Segment,
    work_dir: &Path,
    output: &OutputSpec,
) -> [LegacyCommand; 2] {
    let conformed = work_dir.join(format!("legacy_audio_{:04}.wav", index));
    [
        LegacyCommand::ConformAudio {
            input: segment.audio_path.clone(),
            output: conformed.clone(),
            duration_ms: segment.target_duration_ms,
            sample_rate: output.sample_rate,
        },
        LegacyCommand::CutMerge {
            video: segment.source_video.clone(),
            audio: conformed,
            output: segment_path(work_dir, index),
            start_ms: segment.source_start_ms,
            source_duration_ms: segment.source_duration_ms,
            target_duration_ms: segment.target_duration_ms,
            video_codec: output.video_codec.clone(),
            sample_rate: output.sample_rate,
        },
    ]
}

/// Per-segment intermediate file.
pub fn segment_path(work_dir: &Path, index: usize) -> PathBuf {
    work_dir.join(format!("segment_{:04}.mov", index))
}

/// Concat demuxer list, one `file '<path>'` line per intermediate.
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'", p.to_string_lossy().replace('\'', "'\\''")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render all segments and concatenate them into `output.path`.
pub fn render(
    transcoder: &dyn MediaTranscoder,
    logger: &TaskLogger,
    segments: &[Segment],
    work_dir: &Path,
    output: &OutputSpec,
) -> TranscodeResult<()> {
    if segments.is_empty() {
        return Err(TranscodeError::InvalidRequest("no segments".to_string()));
    }

    let mut intermediates = Vec::with_capacity(segments.len());
    for (index, segment) in segments.iter().enumerate() {
        logger.section(&format!("Segment {}/{}", index + 1, segments.len()));
        for command in segment_commands(index, segment, work_dir, output) {
            transcoder.run_command(&command, logger)?;
        }
        intermediates.push(segment_path(work_dir, index));
    }

    let list_file = work_dir.join(LIST_FILE_NAME);
    fs::write(&list_file, concat_list(&intermediates))
        .map_err(|e| TranscodeError::io("writing concat list", e))?;

    logger.section("Concat");
    transcoder.run_command(
        &LegacyCommand::Concat {
            list_file,
            output: output.path.clone(),
            audio_codec: output.audio_codec.clone(),
            sample_rate: output.sample_rate,
        },
        logger,
    )
}
