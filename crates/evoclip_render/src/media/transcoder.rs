//! Transcoder adapter and the declarative command specs it executes.
//!
//! Renderers never build argv themselves: they describe a filter graph
//! ([`GraphSpec`]) or one legacy step ([`LegacyCommand`]) and hand it to a
//! [`MediaTranscoder`]. [`FfmpegTranscoder`] compiles those into `ffmpeg`
//! argument lists.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{RenderSettings, ToolSettings};
use crate::logging::TaskLogger;

use super::types::{TranscodeError, TranscodeResult};

/// Encoding parameters for a rendered file.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub path: PathBuf,
    pub fps: u32,
    pub sample_rate: u32,
    pub video_codec: String,
    pub audio_codec: String,
    pub pixel_format: String,
}

impl OutputSpec {
    /// Output spec for `path` using the configured (clamped) render settings.
    pub fn from_settings(path: impl Into<PathBuf>, render: &RenderSettings) -> Self {
        Self {
            path: path.into(),
            fps: render.effective_fps(),
            sample_rate: render.effective_sample_rate(),
            video_codec: render.video_codec.clone(),
            audio_codec: render.audio_codec.clone(),
            pixel_format: render.pixel_format.clone(),
        }
    }
}

/// One-shot filter graph render.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSpec {
    /// Input files, in input-index order.
    pub inputs: Vec<PathBuf>,
    /// `-filter_complex` body.
    pub filter_graph: String,
    /// Graph output pad carrying the video stream.
    pub video_label: String,
    /// Graph output pad carrying the audio stream.
    pub audio_label: String,
    pub output: OutputSpec,
}

impl GraphSpec {
    /// Compile into ffmpeg arguments (without the program name).
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }

        args.push("-filter_complex".to_string());
        args.push(self.filter_graph.clone());

        let output = &self.output;
        args.extend([
            "-map".to_string(),
            format!("[{}]", self.video_label),
            "-map".to_string(),
            format!("[{}]", self.audio_label),
            "-c:v".to_string(),
            output.video_codec.clone(),
            "-pix_fmt".to_string(),
            output.pixel_format.clone(),
            "-r".to_string(),
            output.fps.to_string(),
            "-c:a".to_string(),
            output.audio_codec.clone(),
            "-ar".to_string(),
            output.sample_rate.to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
            output.path.to_string_lossy().to_string(),
        ]);

        args
    }
}

/// One step of the segment-by-segment pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyCommand {
    /// Convert narration to mono PCM, padded with silence and cut to `duration_ms`.
    ConformAudio {
        input: PathBuf,
        output: PathBuf,
        duration_ms: i64,
        sample_rate: u32,
    },

    /// Cut `[start_ms, start_ms + target_ms)` from the source and mux it with
    /// the conformed audio. The source sub-range is looped when it is shorter
    /// than the target.
    CutMerge {
        video: PathBuf,
        audio: PathBuf,
        output: PathBuf,
        start_ms: i64,
        source_duration_ms: i64,
        target_duration_ms: i64,
        video_codec: String,
        sample_rate: u32,
    },

    /// Concatenate intermediates listed in `list_file`, re-encoding audio.
    Concat {
        list_file: PathBuf,
        output: PathBuf,
        audio_codec: String,
        sample_rate: u32,
    },
}

impl LegacyCommand {
    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            LegacyCommand::ConformAudio { .. } => "conform audio",
            LegacyCommand::CutMerge { .. } => "cut and merge",
            LegacyCommand::Concat { .. } => "concat",
        }
    }

    /// File this command writes.
    pub fn output(&self) -> &Path {
        match self {
            LegacyCommand::ConformAudio { output, .. }
            | LegacyCommand::CutMerge { output, .. }
            | LegacyCommand::Concat { output, .. } => output,
        }
    }

    /// Compile into ffmpeg arguments (without the program name).
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-y".to_string()];

        match self {
            LegacyCommand::ConformAudio {
                input,
                output,
                duration_ms,
                sample_rate,
            } => {
                let duration = seconds(*duration_ms);
                args.extend([
                    "-i".to_string(),
                    input.to_string_lossy().to_string(),
                    "-vn".to_string(),
                    "-ac".to_string(),
                    "1".to_string(),
                    "-ar".to_string(),
                    sample_rate.to_string(),
                    "-af".to_string(),
                    format!("apad=pad_dur={}", duration),
                    "-t".to_string(),
                    duration,
                    "-c:a".to_string(),
                    "pcm_s16le".to_string(),
                    output.to_string_lossy().to_string(),
                ]);
            }

            LegacyCommand::CutMerge {
                video,
                audio,
                output,
                start_ms,
                source_duration_ms,
                target_duration_ms,
                video_codec,
                sample_rate,
            } => {
                let looped = target_duration_ms > source_duration_ms;
                if looped {
                    args.extend([
                        "-stream_loop".to_string(),
                        loop_count(*source_duration_ms, *target_duration_ms).to_string(),
                        "-ss".to_string(),
                        seconds(*start_ms),
                        "-t".to_string(),
                        seconds(*source_duration_ms),
                    ]);
                } else {
                    args.extend(["-ss".to_string(), seconds(*start_ms)]);
                }

                args.extend([
                    "-i".to_string(),
                    video.to_string_lossy().to_string(),
                    "-i".to_string(),
                    audio.to_string_lossy().to_string(),
                    "-t".to_string(),
                    seconds(*target_duration_ms),
                    "-map".to_string(),
                    "0:v:0".to_string(),
                    "-map".to_string(),
                    "1:a:0".to_string(),
                    "-c:v".to_string(),
                    video_codec.clone(),
                    "-c:a".to_string(),
                    "pcm_s16le".to_string(),
                    "-ar".to_string(),
                    sample_rate.to_string(),
                    "-ac".to_string(),
                    "1".to_string(),
                ]);
                if !looped {
                    args.push("-shortest".to_string());
                }
                args.push(output.to_string_lossy().to_string());
            }

            LegacyCommand::Concat {
                list_file,
                output,
                audio_codec,
                sample_rate,
            } => {
                args.extend([
                    "-f".to_string(),
                    "concat".to_string(),
                    "-safe".to_string(),
                    "0".to_string(),
                    "-fflags".to_string(),
                    "+genpts".to_string(),
                    "-i".to_string(),
                    list_file.to_string_lossy().to_string(),
                    "-map".to_string(),
                    "0:v:0".to_string(),
                    "-map".to_string(),
                    "0:a:0".to_string(),
                    "-c:v".to_string(),
                    "copy".to_string(),
                    "-c:a".to_string(),
                    audio_codec.clone(),
                    "-ar".to_string(),
                    sample_rate.to_string(),
                    "-ac".to_string(),
                    "1".to_string(),
                    "-af".to_string(),
                    "aresample=async=1:first_pts=0".to_string(),
                    "-movflags".to_string(),
                    "+faststart".to_string(),
                    output.to_string_lossy().to_string(),
                ]);
            }
        }

        args
    }
}

/// Number of extra passes over a source sub-range needed to cover `target_ms`.
pub fn loop_count(source_ms: i64, target_ms: i64) -> i64 {
    (target_ms / source_ms.max(1) + 1).max(2)
}

/// Milliseconds as seconds with three decimals, at least one millisecond.
pub fn seconds(ms: i64) -> String {
    format!("{:.3}", ms.max(1) as f64 / 1000.0)
}

/// Runs media transcoding work. Both operations block until the process exits.
pub trait MediaTranscoder: Send + Sync {
    fn run_graph(&self, spec: &GraphSpec, logger: &TaskLogger) -> TranscodeResult<()>;

    fn run_command(&self, command: &LegacyCommand, logger: &TaskLogger) -> TranscodeResult<()>;
}

/// Transcoder backed by the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_settings(tools: &ToolSettings) -> Self {
        Self::new(tools.ffmpeg())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, args: &[String], output_path: &Path, logger: &TaskLogger) -> TranscodeResult<()> {
        logger.command(&format!("{} {}", self.program, args.join(" ")));

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TranscodeError::io("creating output directory", e))?;
        }

        let result = Command::new(&self.program).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TranscodeError::ToolMissing {
                    tool: self.program.clone(),
                }
            } else {
                TranscodeError::io(format!("executing {}", self.program), e)
            }
        })?;

        for line in String::from_utf8_lossy(&result.stdout).lines() {
            logger.output_line(line, false);
        }
        let stderr = String::from_utf8_lossy(&result.stderr);
        for line in stderr.lines() {
            logger.output_line(line, true);
        }

        if !result.status.success() {
            logger.show_tail("ffmpeg output");
            let detail = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no output")
                .trim()
                .to_string();
            return Err(TranscodeError::Failed {
                tool: self.program.clone(),
                exit_code: result.status.code().unwrap_or(-1),
                detail,
            });
        }

        logger.clear_tail();
        Ok(())
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl MediaTranscoder for FfmpegTranscoder {
    fn run_graph(&self, spec: &GraphSpec, logger: &TaskLogger) -> TranscodeResult<()> {
        if spec.inputs.is_empty() || spec.filter_graph.is_empty() {
            return Err(TranscodeError::InvalidRequest(
                "graph has no inputs".to_string(),
            ));
        }
        logger.log_filter_graph(&spec.filter_graph);
        self.run(&spec.to_args(), &spec.output.path, logger)
    }

    fn run_command(&self, command: &LegacyCommand, logger: &TaskLogger) -> TranscodeResult<()> {
        logger.debug(&format!("legacy step: {}", command.label()));
        self.run(&command.to_args(), command.output(), logger)
    }
}
