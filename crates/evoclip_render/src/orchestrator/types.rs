//! Core types for the render pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::logging::TaskLogger;
use crate::media::{MediaProbe, MediaStore, MediaTranscoder};
use crate::models::{PipelineUsed, RenderRequest, RenderStats, RenderSummary};
use crate::planning::PlanOutput;

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// External collaborators used by the steps.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn MediaStore>,
    pub probe: Arc<dyn MediaProbe>,
    pub transcoder: Arc<dyn MediaTranscoder>,
}

/// Read-only context passed to pipeline steps.
///
/// Mutable results go in `TaskState`.
pub struct Context {
    pub request: RenderRequest,
    pub settings: Settings,
    pub task_id: String,
    /// Private work directory for this render.
    pub work_dir: PathBuf,
    pub services: Services,
    pub logger: Arc<TaskLogger>,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    pub fn new(
        request: RenderRequest,
        settings: Settings,
        work_dir: PathBuf,
        services: Services,
        logger: Arc<TaskLogger>,
    ) -> Self {
        Self {
            task_id: request.task_id.clone(),
            request,
            settings,
            work_dir,
            services,
            logger,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Location of the rendered video inside the work directory.
    pub fn final_video_path(&self) -> PathBuf {
        self.work_dir.join("final.mp4")
    }
}

/// Results accumulated by the steps. Each step fills its own section once.
#[derive(Debug, Default)]
pub struct TaskState {
    pub task_id: String,
    pub started_at: Option<String>,
    pub plan: Option<PlanOutput>,
    pub render: Option<RenderOutput>,
    pub publish: Option<PublishOutput>,
}

impl TaskState {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    pub fn has_render(&self) -> bool {
        self.render.is_some()
    }

    pub fn has_publish(&self) -> bool {
        self.publish.is_some()
    }

    /// Aggregate stats, once the plan and the render are recorded.
    pub fn stats(&self, voice_fallback: bool) -> Option<RenderStats> {
        let plan = self.plan.as_ref()?;
        let render = self.render.as_ref()?;
        Some(RenderStats {
            speedup_count: plan.counts.speedup,
            trim_count: plan.counts.trim,
            pad_count: plan.counts.pad,
            pipeline_mode_used: render.pipeline_used,
            voice_fallback_flag: voice_fallback,
        })
    }

    /// Final summary, once every step has recorded its output.
    pub fn into_summary(self, voice_fallback: bool) -> Option<RenderSummary> {
        let render_stats = self.stats(voice_fallback)?;
        let publish = self.publish?;
        let plan = self.plan?;
        Some(RenderSummary {
            output_video_ref: publish.output_video_ref,
            timeline_path: publish.timeline_path,
            timeline: plan.timeline,
            render_stats,
        })
    }
}

/// Output from the render step.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub final_video: PathBuf,
    pub pipeline_used: PipelineUsed,
}

/// Output from the publish step.
#[derive(Debug, Clone)]
pub struct PublishOutput {
    /// `bucket/key` of the uploaded video.
    pub output_video_ref: String,
    /// `bucket/key` of the uploaded timeline JSON.
    pub timeline_path: String,
}
