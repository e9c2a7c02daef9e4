//! Publish step - uploads the final video and the timeline JSON.

use crate::media::MediaRef;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, PublishOutput, TaskState};

/// Uploads `<task_id>/final.mp4` and `<task_id>/timeline.json` into the
/// output bucket.
pub struct PublishStep;

impl PublishStep {
    pub fn new() -> Self {
        Self
    }

    pub fn video_ref(ctx: &Context) -> MediaRef {
        MediaRef::new(
            &ctx.settings.storage.output_bucket,
            format!("{}/final.mp4", ctx.task_id),
        )
    }

    pub fn timeline_ref(ctx: &Context) -> MediaRef {
        MediaRef::new(
            &ctx.settings.storage.output_bucket,
            format!("{}/timeline.json", ctx.task_id),
        )
    }
}

impl Default for PublishStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for PublishStep {
    fn name(&self) -> &str {
        "Publish"
    }

    fn description(&self) -> &str {
        "Upload video and timeline"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.settings.storage.output_bucket.trim().is_empty() {
            return Err(StepError::invalid_input("output bucket is not configured"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut TaskState) -> StepResult<()> {
        let (plan, render) = match (state.plan.as_ref(), state.render.as_ref()) {
            (Some(plan), Some(render)) => (plan, render),
            _ => return Err(StepError::invalid_input("Plan or render output not recorded")),
        };
        let store = ctx.services.store.as_ref();

        let timeline = serde_json::to_vec(&plan.timeline)
            .map_err(|e| StepError::serialize("timeline", e))?;

        let bucket = &ctx.settings.storage.output_bucket;
        store
            .ensure_bucket(bucket)
            .map_err(|e| StepError::storage(format!("provisioning bucket {}", bucket), e))?;

        let video_ref = store
            .upload_local(&render.final_video, &Self::video_ref(ctx), "video/mp4")
            .map_err(|e| StepError::storage("uploading final video", e))?;
        ctx.logger.info(&format!("Uploaded {}", video_ref));

        let timeline_ref = store
            .upload_bytes(&timeline, &Self::timeline_ref(ctx), "application/json")
            .map_err(|e| StepError::storage("uploading timeline", e))?;
        ctx.logger.info(&format!("Uploaded {}", timeline_ref));

        state.publish = Some(PublishOutput {
            output_video_ref: video_ref.to_string(),
            timeline_path: timeline_ref.to_string(),
        });
        Ok(())
    }

    fn validate_output(&self, _ctx: &Context, state: &TaskState) -> StepResult<()> {
        if !state.has_publish() {
            return Err(StepError::invalid_output("Publish output not recorded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{MediaError, MediaResult, MediaStore};
    use crate::models::{PipelineUsed, TimelineEntry};
    use crate::orchestrator::RenderOutput;
    use crate::planning::PlanOutput;
    use crate::testing::test_context;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingStore {
        fail_video: bool,
        calls: Mutex<Vec<String>>,
        payloads: Mutex<Vec<Vec<u8>>>,
    }

    impl MediaStore for RecordingStore {
        fn ensure_bucket(&self, bucket: &str) -> MediaResult<()> {
            self.calls.lock().push(format!("bucket {}", bucket));
            Ok(())
        }

        fn download_to_local(&self, media_ref: &MediaRef, _dest: &Path) -> MediaResult<PathBuf> {
            Err(MediaError::NotFound(media_ref.to_string()))
        }

        fn upload_local(&self, _path: &Path, dest: &MediaRef, _content_type: &str) -> MediaResult<MediaRef> {
            if self.fail_video {
                return Err(MediaError::io(
                    "put",
                    std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
                ));
            }
            self.calls.lock().push(format!("file {}", dest));
            Ok(dest.clone())
        }

        fn upload_bytes(&self, data: &[u8], dest: &MediaRef, _content_type: &str) -> MediaResult<MediaRef> {
            self.calls.lock().push(format!("bytes {}", dest));
            self.payloads.lock().push(data.to_vec());
            Ok(dest.clone())
        }
    }

    fn rendered_state(dir: &Path) -> TaskState {
        let mut state = TaskState::new("task");
        state.plan = Some(PlanOutput {
            timeline: vec![TimelineEntry::skipped("s_0", "t_0", "v.mp4", 0, "hi")],
            ..PlanOutput::default()
        });
        state.render = Some(RenderOutput {
            final_video: dir.join("final.mp4"),
            pipeline_used: PipelineUsed::SinglePass,
        });
        state
    }

    #[test]
    fn object_keys_are_scoped_by_task() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());

        assert_eq!(PublishStep::video_ref(&ctx).to_string(), "output/task/final.mp4");
        assert_eq!(
            PublishStep::timeline_ref(&ctx).to_string(),
            "output/task/timeline.json"
        );
    }

    #[test]
    fn publishes_video_then_timeline() {
        let dir = tempdir().unwrap();
        let store = Arc::new(RecordingStore::default());
        let mut ctx = test_context(dir.path());
        ctx.services.store = Arc::clone(&store) as Arc<dyn MediaStore>;
        let mut state = rendered_state(dir.path());

        PublishStep::new().execute(&ctx, &mut state).unwrap();

        assert_eq!(
            *store.calls.lock(),
            vec![
                "bucket output",
                "file output/task/final.mp4",
                "bytes output/task/timeline.json",
            ]
        );
        let timeline: Vec<TimelineEntry> =
            serde_json::from_slice(&store.payloads.lock()[0]).unwrap();
        assert_eq!(timeline.len(), 1);
        let publish = state.publish.unwrap();
        assert_eq!(publish.output_video_ref, "output/task/final.mp4");
        assert_eq!(publish.timeline_path, "output/task/timeline.json");
    }

    #[test]
    fn failed_video_upload_skips_timeline() {
        let dir = tempdir().unwrap();
        let store = Arc::new(RecordingStore {
            fail_video: true,
            ..RecordingStore::default()
        });
        let mut ctx = test_context(dir.path());
        ctx.services.store = Arc::clone(&store) as Arc<dyn MediaStore>;
        let mut state = rendered_state(dir.path());

        let err = PublishStep::new().execute(&ctx, &mut state).unwrap_err();

        assert!(matches!(err, StepError::Storage { .. }));
        assert_eq!(*store.calls.lock(), vec!["bucket output"]);
        assert!(store.payloads.lock().is_empty());
        assert!(state.publish.is_none());
    }

    #[test]
    fn requires_render_output() {
        let dir = tempdir().unwrap();
        let ctx = test_context(dir.path());
        let mut state = TaskState::new("task");

        let err = PublishStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::InvalidInput(_)));
        assert!(!dir.path().join("store/output").exists());
    }
}
