//! evoclip-render: run one render job from the command line.
//!
//! ## Usage
//!
//! ```bash
//! evoclip-render --job job.json                       # render with render.toml
//! evoclip-render --job job.json --pipeline-mode legacy
//! EVOCLIP_CONFIG_PATH=/etc/evoclip.toml evoclip-render --job job.json --no-fallback
//! ```
//!
//! The job file is a JSON `RenderRequest`. On success the summary JSON is
//! printed to stdout; on a render failure `{"error": "<code>"}` is printed
//! and the process exits with status 2.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use evoclip_render::config::{ConfigManager, Settings};
use evoclip_render::logging::{init_tracing, LogLevel};
use evoclip_render::media::{FfmpegTranscoder, FfprobeProbe, LocalMediaStore};
use evoclip_render::models::{PipelineMode, RenderRequest};
use evoclip_render::RenderService;

/// Render a narrated video from scenes, sentences and synthesized audio.
#[derive(Parser, Debug)]
#[command(name = "evoclip-render", version, about)]
struct Cli {
    /// Render request (JSON).
    #[arg(long)]
    job: PathBuf,

    /// Config file; created with defaults if missing.
    #[arg(long, env = "EVOCLIP_CONFIG_PATH", default_value = "render.toml")]
    config: PathBuf,

    /// Override the local store root directory.
    #[arg(long)]
    store_root: Option<PathBuf>,

    /// Override the pipeline mode (`single_pass` or `legacy`).
    #[arg(long)]
    pipeline_mode: Option<String>,

    /// Fail instead of falling back to the legacy pipeline.
    #[arg(long)]
    no_fallback: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

enum Outcome {
    Rendered(String),
    Failed(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(Outcome::Rendered(summary)) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Ok(Outcome::Failed(code)) => {
            println!("{}", serde_json::json!({ "error": code }));
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    let mut manager = ConfigManager::new(&cli.config);
    manager
        .load_or_create()
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    apply_overrides(manager.settings_mut(), cli);

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        manager.settings().logging.level
    };
    init_tracing(level);

    manager
        .ensure_dirs_exist()
        .context("creating work and log directories")?;
    let settings = manager.into_settings();

    let request = read_job(&cli.job)?;
    tracing::debug!(
        task = %request.task_id,
        sentences = request.sentences.len(),
        "Loaded job {}",
        cli.job.display()
    );

    let service = RenderService::new(
        settings.clone(),
        Arc::new(LocalMediaStore::new(&settings.storage.root)),
        Arc::new(FfprobeProbe::from_settings(&settings.tools)),
        Arc::new(FfmpegTranscoder::from_settings(&settings.tools)),
    );

    match service.render(&request) {
        Ok(summary) => {
            let json = serde_json::to_string_pretty(&summary).context("serializing summary")?;
            Ok(Outcome::Rendered(json))
        }
        Err(e) => {
            tracing::error!("{}", e);
            Ok(Outcome::Failed(e.code()))
        }
    }
}

/// Apply command-line overrides on top of the loaded config.
fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(ref root) = cli.store_root {
        settings.storage.root = root.to_string_lossy().to_string();
    }
    if let Some(ref mode) = cli.pipeline_mode {
        settings.render.pipeline_mode = PipelineMode::parse(mode);
    }
    if cli.no_fallback {
        settings.render.allow_legacy_fallback = false;
    }
    if cli.verbose {
        settings.logging.level = LogLevel::Debug;
        settings.logging.compact = false;
    }
}

fn read_job(path: &Path) -> Result<RenderRequest> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading job {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing job {}", path.display()))
}
