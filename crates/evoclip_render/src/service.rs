//! Render service: one call per task, from request to published summary.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::logging::{LogConfig, LogSink, TaskLogger};
use crate::media::{MediaProbe, MediaStore, MediaTranscoder};
use crate::models::{RenderRequest, RenderSummary};
use crate::orchestrator::{
    create_standard_pipeline, Context, PipelineError, PipelineResult, ProgressCallback, Services,
    TaskState,
};

/// Prefix of the per-render work directory.
pub const WORK_DIR_PREFIX: &str = "evoclip-render-";

/// Entry point of the engine.
///
/// Holds no per-render state, so one service can serve concurrent renders
/// from several threads.
pub struct RenderService {
    settings: Settings,
    services: Services,
}

impl RenderService {
    pub fn new(
        settings: Settings,
        store: Arc<dyn MediaStore>,
        probe: Arc<dyn MediaProbe>,
        transcoder: Arc<dyn MediaTranscoder>,
    ) -> Self {
        Self {
            settings,
            services: Services {
                store,
                probe,
                transcoder,
            },
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Render one task.
    pub fn render(&self, request: &RenderRequest) -> PipelineResult<RenderSummary> {
        self.render_with(request, None, None)
    }

    /// Render one task, forwarding log lines and step progress to callbacks.
    pub fn render_with(
        &self,
        request: &RenderRequest,
        sink: Option<LogSink>,
        progress: Option<ProgressCallback>,
    ) -> PipelineResult<RenderSummary> {
        let task_id = request.task_id.clone();
        tracing::info!(task = %task_id, "Render started");

        let temp_root = Path::new(&self.settings.paths.temp_root);
        fs::create_dir_all(temp_root).map_err(|e| {
            PipelineError::setup_failed(&task_id, format!("creating {}: {}", temp_root.display(), e))
        })?;
        let work_dir = tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir_in(temp_root)
            .map_err(|e| PipelineError::setup_failed(&task_id, format!("creating work dir: {}", e)))?;

        let logger = TaskLogger::new(
            &task_id,
            &self.settings.paths.logs_folder,
            LogConfig::from(&self.settings.logging),
            sink,
        )
        .map_err(|e| PipelineError::setup_failed(&task_id, format!("creating log file: {}", e)))?;
        let logger = Arc::new(logger);
        logger.info(&format!("Work directory: {}", work_dir.path().display()));

        let mut ctx = Context::new(
            request.clone(),
            self.settings.clone(),
            work_dir.path().to_path_buf(),
            self.services.clone(),
            Arc::clone(&logger),
        );
        if let Some(progress) = progress {
            ctx = ctx.with_progress_callback(progress);
        }

        let mut state = TaskState::new(&task_id);
        let outcome = create_standard_pipeline().run(&ctx, &mut state);
        logger.flush();

        match outcome {
            Ok(_) => {
                let summary = state.into_summary(request.voice_profile_fallback).ok_or_else(|| {
                    PipelineError::setup_failed(&task_id, "pipeline finished without a summary")
                })?;
                tracing::info!(
                    task = %task_id,
                    output = %summary.output_video_ref,
                    pipeline = %summary.render_stats.pipeline_mode_used,
                    "Render finished"
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::warn!(task = %task_id, code = %e.code(), "Render failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_tracing;
    use crate::media::{LocalMediaStore, TranscodeError};
    use crate::models::{AudioClip, FitStrategy, PipelineMode, PipelineUsed, Scene, Sentence, TimelineEntry};
    use crate::orchestrator::StepError;
    use crate::testing::{seed_object, RecordingTranscoder, ScriptedProbe};
    use tempfile::TempDir;

    struct Harness {
        dir: TempDir,
        probe: Arc<ScriptedProbe>,
        transcoder: Arc<RecordingTranscoder>,
        settings: Settings,
    }

    impl Harness {
        fn new(transcoder: RecordingTranscoder) -> Self {
            init_test_tracing();
            let dir = tempfile::tempdir().unwrap();
            let store_root = dir.path().join("store");
            seed_object(&store_root, "videos", "source.mp4");
            for id in ["s1", "s2", "s3"] {
                seed_object(&store_root, "audio", &format!("task-1/{}.mp3", id));
            }

            let mut settings = Settings::default();
            settings.paths.temp_root = dir.path().join("tmp").to_string_lossy().to_string();
            settings.paths.logs_folder = dir.path().join("logs").to_string_lossy().to_string();

            Self {
                dir,
                probe: Arc::new(ScriptedProbe::default()),
                transcoder: Arc::new(transcoder),
                settings,
            }
        }

        fn service(&self) -> RenderService {
            RenderService::new(
                self.settings.clone(),
                Arc::new(LocalMediaStore::new(self.dir.path().join("store"))),
                self.probe.clone(),
                self.transcoder.clone(),
            )
        }

        fn output_exists(&self, key: &str) -> bool {
            self.dir.path().join("store/output").join(key).exists()
        }

        fn work_dirs_left(&self) -> usize {
            fs::read_dir(self.dir.path().join("tmp"))
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    fn request() -> RenderRequest {
        let mut request = RenderRequest::new("task-1");
        request.source_video_ref = Some("source.mp4".to_string());
        request.scenes = vec![
            Scene::new("scene_a", 0, 1000),
            Scene::new("scene_b", 1000, 3000),
            Scene::new("scene_c", 3000, 4500),
        ];
        request.sentences = vec![
            Sentence::new("s1", "scene_a", "one"),
            Sentence::new("s2", "scene_b", "two"),
            Sentence::new("s3", "scene_c", "three"),
        ];
        request.audio_clips = vec![
            AudioClip::ok("s1", "audio/task-1/s1.mp3", 1000),
            AudioClip::failed("s2"),
            AudioClip::ok("s3", "audio/task-1/s3.mp3", 1500),
        ];
        request.voice_profile_fallback = true;
        request
    }

    fn step_error(err: &PipelineError) -> &StepError {
        err.step_error().unwrap()
    }

    #[test]
    fn renders_and_publishes_single_pass() {
        let harness = Harness::new(RecordingTranscoder::default());
        harness.probe.set("s1.mp3", 1050);
        harness.probe.set("s3.mp3", 9000);

        let summary = harness.service().render(&request()).unwrap();

        assert_eq!(summary.output_video_ref, "output/task-1/final.mp4");
        assert_eq!(summary.timeline_path, "output/task-1/timeline.json");
        assert_eq!(summary.render_stats.pipeline_mode_used, PipelineUsed::SinglePass);
        assert_eq!(summary.render_stats.speedup_count, 1);
        assert_eq!(summary.render_stats.trim_count, 1);
        assert!(summary.render_stats.voice_fallback_flag);
        assert!(harness.output_exists("task-1/final.mp4"));

        let persisted = fs::read(harness.dir.path().join("store/output/task-1/timeline.json")).unwrap();
        let persisted: Vec<TimelineEntry> = serde_json::from_slice(&persisted).unwrap();
        assert_eq!(persisted.len(), summary.timeline.len());
        assert_eq!(persisted[2].sentence_id, "s3");
        assert!(persisted[2].audio_trimmed);
        assert_eq!(harness.work_dirs_left(), 0);
    }

    #[test]
    fn timeline_skips_do_not_shift_following_entries() {
        let harness = Harness::new(RecordingTranscoder::default());

        let summary = harness.service().render(&request()).unwrap();
        let timeline = &summary.timeline;

        assert_eq!(timeline.len(), 3);
        assert!(timeline[1].skipped);
        assert_eq!(timeline[1].start_ms, timeline[1].end_ms);
        assert_eq!(timeline[1].start_ms, 1000);
        assert_eq!(timeline[2].start_ms, 1000);
        assert_eq!(timeline[2].end_ms, 2500);
        assert_eq!(timeline[2].target_duration_ms, 1500);
        assert!(timeline.windows(2).all(|w| w[0].start_ms <= w[1].start_ms));
    }

    #[test]
    fn single_pass_graph_only_sees_renderable_segments() {
        let harness = Harness::new(RecordingTranscoder::default());
        harness.probe.set("s1.mp3", 1050);

        harness.service().render(&request()).unwrap();

        let graphs = harness.transcoder.graphs.lock();
        assert_eq!(graphs.len(), 1);
        assert_eq!(graphs[0].inputs.len(), 3);
        assert!(graphs[0].filter_graph.contains("atempo=1.050000"));
        assert!(graphs[0].filter_graph.ends_with("concat=n=2:v=1:a=1[vout][aout]"));
    }

    #[test]
    fn all_skipped_renders_and_uploads_nothing() {
        let harness = Harness::new(RecordingTranscoder::default());
        let mut request = request();
        request.audio_clips = vec![AudioClip::failed("s1"), AudioClip::failed("s3")];

        let err = harness.service().render(&request).unwrap_err();

        assert_eq!(err.code(), "no_renderable_segments");
        assert_eq!(harness.transcoder.graph_count(), 0);
        assert!(!harness.output_exists("task-1"));
    }

    #[test]
    fn missing_source_refs_fail_fast() {
        let harness = Harness::new(RecordingTranscoder::default());
        let mut request = request();
        request.source_video_ref = None;

        let err = harness.service().render(&request).unwrap_err();
        assert_eq!(err.code(), "empty_source_video_refs");
    }

    #[test]
    fn single_pass_failure_falls_back_to_legacy() {
        let harness = Harness::new(RecordingTranscoder::failing_graph());

        let summary = harness.service().render(&request()).unwrap();

        assert_eq!(summary.render_stats.pipeline_mode_used, PipelineUsed::LegacyFallback);
        assert_eq!(summary.output_video_ref, "output/task-1/final.mp4");
        assert!(harness.output_exists("task-1/final.mp4"));
        assert_eq!(harness.transcoder.command_count(), 5);
    }

    #[test]
    fn single_pass_failure_without_fallback_uploads_nothing() {
        let mut harness = Harness::new(RecordingTranscoder::failing_graph());
        harness.settings.render.allow_legacy_fallback = false;

        let err = harness.service().render(&request()).unwrap_err();

        assert!(err.code().starts_with("single_pass_render_failed:"));
        assert!(err.code().contains("filter graph rejected"));
        assert!(matches!(
            step_error(&err),
            StepError::Render(crate::render::RenderError::SinglePassFailed(TranscodeError::Failed { .. }))
        ));
        assert!(!harness.output_exists("task-1"));
        assert_eq!(harness.transcoder.command_count(), 0);
    }

    #[test]
    fn legacy_mode_reports_legacy() {
        let mut harness = Harness::new(RecordingTranscoder::default());
        harness.settings.render.pipeline_mode = PipelineMode::Legacy;

        let summary = harness.service().render(&request()).unwrap();

        assert_eq!(summary.render_stats.pipeline_mode_used, PipelineUsed::Legacy);
        assert_eq!(harness.transcoder.graph_count(), 0);
    }

    #[test]
    fn legacy_failure_is_terminal() {
        let harness = Harness::new(RecordingTranscoder::failing_all());

        let err = harness.service().render(&request()).unwrap_err();

        assert!(err.code().starts_with("legacy_render_failed:"));
        assert!(!harness.output_exists("task-1"));
    }

    #[test]
    fn non_skipped_targets_follow_source_range() {
        let harness = Harness::new(RecordingTranscoder::default());
        let mut request = request();
        request.scenes[0] = Scene::new("scene_a", 0, 1000).with_source_range(2000, 2400);
        harness.probe.set("s1.mp3", 400);

        let summary = harness.service().render(&request).unwrap();

        let first = &summary.timeline[0];
        assert_eq!(first.target_duration_ms, 400);
        assert_eq!(first.end_ms - first.start_ms, 400);
        assert_eq!(first.audio_fit_strategy, FitStrategy::None);
    }

    #[test]
    fn progress_and_log_sink_are_forwarded() {
        let harness = Harness::new(RecordingTranscoder::default());
        let steps = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let steps_clone = Arc::clone(&steps);
        let lines = Arc::new(parking_lot::Mutex::new(0usize));
        let lines_clone = Arc::clone(&lines);

        harness
            .service()
            .render_with(
                &request(),
                Some(Box::new(move |_line: &str| *lines_clone.lock() += 1)),
                Some(Box::new(move |step: &str, _pct: u32, _msg: &str| {
                    steps_clone.lock().push(step.to_string())
                })),
            )
            .unwrap();

        assert_eq!(
            *steps.lock(),
            vec!["Plan", "Render", "Validate", "Publish", "Complete"]
        );
        assert!(*lines.lock() > 0);
        assert!(harness.dir.path().join("logs/task-1.log").exists());
    }

    #[test]
    fn service_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RenderService>();
    }
}
