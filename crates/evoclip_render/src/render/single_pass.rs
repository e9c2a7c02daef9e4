//! Single-pass renderer: the whole segment list as one filter graph.
//!
//! Inputs are the deduplicated source videos followed by one audio input per
//! segment. Each segment contributes a video chain `[v{i}]` and an audio
//! chain `[a{i}]`; all pairs feed one `concat` into `[vout][aout]`.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::logging::TaskLogger;
use crate::media::{GraphSpec, MediaTranscoder, OutputSpec, TranscodeError, TranscodeResult};
use crate::models::FitStrategy;
use crate::planning::Segment;

/// Graph output pad for video.
pub const VIDEO_OUT: &str = "vout";
/// Graph output pad for audio.
pub const AUDIO_OUT: &str = "aout";

/// Lowest tempo factor written into `atempo`.
const MIN_SPEED_FACTOR: f64 = 0.01;

/// Compile segments into one graph spec.
pub fn build_graph(
    source_videos: &[PathBuf],
    segments: &[Segment],
    output: OutputSpec,
) -> TranscodeResult<GraphSpec> {
    if source_videos.is_empty() {
        return Err(TranscodeError::InvalidRequest("no source videos".to_string()));
    }
    if segments.is_empty() {
        return Err(TranscodeError::InvalidRequest("no segments".to_string()));
    }

    let mut inputs: Vec<PathBuf> = Vec::with_capacity(source_videos.len() + segments.len());
    let mut video_index: HashMap<&PathBuf, usize> = HashMap::new();
    for source in source_videos {
        if !video_index.contains_key(source) {
            video_index.insert(source, inputs.len());
            inputs.push(source.clone());
        }
    }
    let audio_base = inputs.len();

    let mut chains = Vec::with_capacity(segments.len() * 2 + 1);
    let mut concat_inputs = String::new();

    for (idx, segment) in segments.iter().enumerate() {
        let video_input = *video_index.get(&segment.source_video).ok_or_else(|| {
            TranscodeError::InvalidRequest(format!(
                "segment {} uses unregistered source {}",
                idx,
                segment.source_video.display()
            ))
        })?;
        inputs.push(segment.audio_path.clone());

        chains.push(video_chain(video_input, idx, segment, &output));
        chains.push(audio_chain(audio_base + idx, idx, segment, &output));
        concat_inputs.push_str(&format!("[v{}][a{}]", idx, idx));
    }

    chains.push(format!(
        "{}concat=n={}:v=1:a=1[{}][{}]",
        concat_inputs,
        segments.len(),
        VIDEO_OUT,
        AUDIO_OUT
    ));

    Ok(GraphSpec {
        inputs,
        filter_graph: chains.join(";"),
        video_label: VIDEO_OUT.to_string(),
        audio_label: AUDIO_OUT.to_string(),
        output,
    })
}

/// Build and run the graph.
pub fn render(
    transcoder: &dyn MediaTranscoder,
    logger: &TaskLogger,
    source_videos: &[PathBuf],
    segments: &[Segment],
    output: OutputSpec,
) -> TranscodeResult<()> {
    let spec = build_graph(source_videos, segments, output)?;
    logger.info(&format!(
        "Single-pass graph: {} inputs, {} segments",
        spec.inputs.len(),
        segments.len()
    ));
    transcoder.run_graph(&spec, logger)
}

fn video_chain(input: usize, idx: usize, segment: &Segment, output: &OutputSpec) -> String {
    format!(
        "[{}:v:0]trim=start={:.3}:duration={:.3},setpts=PTS-STARTPTS,fps={},format={}[v{}]",
        input,
        segment.source_start_ms.max(0) as f64 / 1000.0,
        segment.target_duration_ms.max(1) as f64 / 1000.0,
        output.fps,
        output.pixel_format,
        idx
    )
}

fn audio_chain(input: usize, idx: usize, segment: &Segment, output: &OutputSpec) -> String {
    let duration = segment.target_duration_ms.max(1) as f64 / 1000.0;
    let tempo = match segment.fit_strategy {
        FitStrategy::Speedup => format!(
            "atempo={:.6},",
            segment.speed_factor.max(MIN_SPEED_FACTOR)
        ),
        FitStrategy::None | FitStrategy::Trim | FitStrategy::PadSilence => String::new(),
    };

    format!(
        "[{input}:a:0]aresample={rate},{tempo}apad=pad_dur={duration:.3},atrim=duration={duration:.3},\
         asetpts=PTS-STARTPTS,aformat=sample_rates={rate}:channel_layouts=mono[a{idx}]",
        input = input,
        rate = output.sample_rate,
        tempo = tempo,
        duration = duration,
        idx = idx
    )
}
