//! Segment planner.
//!
//! Walks sentences in input order, binds each to its scene and audio clip,
//! fetches the media it needs and decides the audio fit. The running output
//! offset only advances for renderable sentences.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::fit::{decide, FitCounts};
use crate::logging::TaskLogger;
use crate::media::{MediaProbe, MediaRef, MediaStore};
use crate::models::{AudioClip, FitStrategy, RenderRequest, Scene, Sentence, TimelineEntry};

use super::segment::{PlanError, PlanOutput, Segment};

/// Builds the segment list and draft timeline for one request.
pub struct SegmentPlanner<'a> {
    store: &'a dyn MediaStore,
    probe: &'a dyn MediaProbe,
    videos_bucket: String,
    work_dir: PathBuf,
    max_speed: f64,
    logger: &'a TaskLogger,
}

/// Source videos known to the planner, keyed by reference.
#[derive(Default)]
struct SourceRegistry {
    order: Vec<PathBuf>,
    by_ref: HashMap<String, PathBuf>,
}

impl SourceRegistry {
    fn get(&self, source_ref: &str) -> Option<&PathBuf> {
        self.by_ref.get(source_ref)
    }

    fn insert(&mut self, source_ref: &str, path: PathBuf) {
        if self.by_ref.insert(source_ref.to_string(), path.clone()).is_none() {
            self.order.push(path);
        }
    }

    fn len(&self) -> usize {
        self.by_ref.len()
    }
}

impl<'a> SegmentPlanner<'a> {
    pub fn new(
        store: &'a dyn MediaStore,
        probe: &'a dyn MediaProbe,
        videos_bucket: impl Into<String>,
        work_dir: impl Into<PathBuf>,
        logger: &'a TaskLogger,
    ) -> Self {
        Self {
            store,
            probe,
            videos_bucket: videos_bucket.into(),
            work_dir: work_dir.into(),
            max_speed: crate::fit::DEFAULT_MAX_SPEED,
            logger,
        }
    }

    /// Override the speed-up limit passed to the fit decision.
    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = max_speed;
        self
    }

    /// Plan the request.
    pub fn plan(&self, request: &RenderRequest) -> Result<PlanOutput, PlanError> {
        let source_refs = request.normalized_source_refs();
        if source_refs.is_empty() {
            return Err(PlanError::EmptySourceVideoRefs);
        }
        let default_ref = &source_refs[0];

        let mut sources = SourceRegistry::default();
        for (idx, source_ref) in source_refs.iter().enumerate() {
            if sources.get(source_ref).is_some() {
                continue;
            }
            let name = format!("source_{}_{}", idx, file_name(source_ref));
            let local = self.fetch_source(source_ref, &name)?;
            sources.insert(source_ref, local);
        }

        let scenes: HashMap<&str, &Scene> =
            request.scenes.iter().map(|s| (s.scene_id.as_str(), s)).collect();
        let clips: HashMap<&str, &AudioClip> = request
            .audio_clips
            .iter()
            .map(|c| (c.sentence_id.as_str(), c))
            .collect();

        let mut output = PlanOutput::default();
        let mut counts = FitCounts::default();
        let mut offset_ms: i64 = 0;

        for sentence in &request.sentences {
            let Some(scene) = scenes.get(sentence.scene_id.as_str()) else {
                self.logger.debug(&format!(
                    "Sentence {} references unknown scene {}, omitted",
                    sentence.sentence_id, sentence.scene_id
                ));
                continue;
            };

            let source_ref = scene
                .source_video_ref
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or(default_ref);
            let source_video = match sources.get(source_ref) {
                Some(path) => path.clone(),
                None => {
                    let name = format!("source_extra_{}_{}", sources.len(), file_name(source_ref));
                    let local = self.fetch_source(source_ref, &name)?;
                    sources.insert(source_ref, local.clone());
                    local
                }
            };

            let clip = clips.get(sentence.sentence_id.as_str()).copied();
            let Some((clip, audio_ref)) = renderable_clip(clip) else {
                self.logger.info(&format!(
                    "Sentence {} has no usable audio, skipped",
                    sentence.sentence_id
                ));
                output.timeline.push(TimelineEntry::skipped(
                    &scene.scene_id,
                    &sentence.sentence_id,
                    source_ref,
                    offset_ms,
                    &sentence.text,
                ));
                continue;
            };

            let source_start_ms = scene.source_start();
            let target_duration_ms = scene.source_duration_ms();

            let audio_path = self.fetch_audio(sentence, &audio_ref)?;
            let raw_audio_ms = self.raw_audio_duration(&audio_path, clip, target_duration_ms);

            let (strategy, speed_factor) = decide(raw_audio_ms, target_duration_ms, self.max_speed);
            counts.record(strategy);
            self.logger.debug(&format!(
                "Sentence {}: audio {}ms -> target {}ms, {} x{:.3}",
                sentence.sentence_id, raw_audio_ms, target_duration_ms, strategy, speed_factor
            ));

            output.segments.push(Segment {
                source_video_ref: source_ref.to_string(),
                source_video,
                audio_ref: audio_ref.to_string(),
                audio_path,
                source_start_ms,
                source_duration_ms: target_duration_ms,
                target_duration_ms,
                fit_strategy: strategy,
                speed_factor,
            });

            output.timeline.push(TimelineEntry {
                scene_id: scene.scene_id.clone(),
                sentence_id: sentence.sentence_id.clone(),
                source_video_ref: source_ref.to_string(),
                start_ms: offset_ms,
                end_ms: offset_ms + target_duration_ms,
                audio_ref: clip.audio_ref.clone(),
                subtitle_text: sentence.text.clone(),
                skipped: false,
                target_duration_ms,
                raw_audio_duration_ms: raw_audio_ms,
                final_audio_duration_ms: target_duration_ms,
                audio_fit_strategy: strategy,
                speed_factor,
                audio_trimmed: strategy == FitStrategy::Trim,
            });
            offset_ms += target_duration_ms;
        }

        if output.segments.is_empty() {
            return Err(PlanError::NoRenderableSegments);
        }

        output.counts = counts;
        output.source_videos = sources.order;
        Ok(output)
    }

    fn fetch_source(&self, source_ref: &str, local_name: &str) -> Result<PathBuf, PlanError> {
        let media_ref = MediaRef::new(&self.videos_bucket, source_ref);
        let dest = self.work_dir.join(local_name);
        self.store
            .download_to_local(&media_ref, &dest)
            .map_err(|e| PlanError::storage(format!("source video {}", media_ref), e))
    }

    fn fetch_audio(&self, sentence: &Sentence, audio_ref: &MediaRef) -> Result<PathBuf, PlanError> {
        let dest = self
            .work_dir
            .join(format!("{}.mp3", sanitize_component(&sentence.sentence_id)));
        self.store
            .download_to_local(audio_ref, &dest)
            .map_err(|e| PlanError::storage(format!("audio {}", audio_ref), e))
    }

    /// Probed duration, else the clip's reported duration, else the target.
    fn raw_audio_duration(&self, path: &Path, clip: &AudioClip, target_duration_ms: i64) -> i64 {
        match self.probe.duration_ms(path) {
            Ok(duration) => duration,
            Err(e) => {
                let fallback = clip.duration_ms.unwrap_or(target_duration_ms);
                self.logger.warn(&format!(
                    "Probe failed for {} ({}), using {}ms",
                    path.display(),
                    e,
                    fallback
                ));
                fallback
            }
        }
    }
}

/// The clip and its parsed reference, if the sentence can be rendered.
fn renderable_clip(clip: Option<&AudioClip>) -> Option<(&AudioClip, MediaRef)> {
    let clip = clip?;
    if !clip.is_ok() {
        return None;
    }
    let media_ref = MediaRef::parse(clip.audio_ref.as_deref()?)?;
    Some((clip, media_ref))
}

fn file_name(source_ref: &str) -> &str {
    Path::new(source_ref)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(source_ref)
}

fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentence;
    use crate::testing::{seed_object, test_logger, ScriptedProbe};
    use crate::media::LocalMediaStore;
    use tempfile::tempdir;

    struct Fixture {
        _root: tempfile::TempDir,
        work: tempfile::TempDir,
        store: LocalMediaStore,
        probe: ScriptedProbe,
        logger: TaskLogger,
    }

    impl Fixture {
        fn new() -> Self {
            let root = tempdir().unwrap();
            let work = tempdir().unwrap();
            seed_object(root.path(), "videos", "source.mp4");
            seed_object(root.path(), "videos", "other/b-roll.mp4");
            for id in ["s1", "s2", "s3"] {
                seed_object(root.path(), "audio", &format!("task/{}.mp3", id));
            }
            let logger = test_logger(work.path());
            Self {
                store: LocalMediaStore::new(root.path()),
                _root: root,
                work,
                probe: ScriptedProbe::default(),
                logger,
            }
        }

        fn planner(&self) -> SegmentPlanner<'_> {
            SegmentPlanner::new(&self.store, &self.probe, "videos", self.work.path(), &self.logger)
        }
    }

    fn request() -> RenderRequest {
        let mut request = RenderRequest::new("task");
        request.source_video_refs = vec!["source.mp4".to_string()];
        request.scenes = vec![
            Scene::new("scene_a", 0, 1000),
            Scene::new("scene_b", 1000, 3000),
        ];
        request.sentences = vec![
            Sentence::new("s1", "scene_a", "first"),
            Sentence::new("s2", "scene_b", "second"),
        ];
        request.audio_clips = vec![
            AudioClip::ok("s1", "audio/task/s1.mp3", 1000),
            AudioClip::ok("s2", "audio/task/s2.mp3", 2000),
        ];
        request
    }

    #[test]
    fn empty_source_refs_fail_fast() {
        let fixture = Fixture::new();
        let mut request = request();
        request.source_video_refs.clear();

        let result = fixture.planner().plan(&request);
        assert!(matches!(result, Err(PlanError::EmptySourceVideoRefs)));
    }

    #[test]
    fn entries_are_contiguous_and_targets_follow_scenes() {
        let fixture = Fixture::new();
        fixture.probe.set("s1.mp3", 1050);
        fixture.probe.set("s2.mp3", 1500);

        let plan = fixture.planner().plan(&request()).unwrap();

        assert_eq!(plan.segments.len(), 2);
        assert_eq!(plan.timeline[0].start_ms, 0);
        assert_eq!(plan.timeline[0].end_ms, 1000);
        assert_eq!(plan.timeline[1].start_ms, 1000);
        assert_eq!(plan.timeline[1].end_ms, 3000);
        assert_eq!(plan.segments[1].target_duration_ms, 2000);
        assert_eq!(plan.timeline[0].audio_fit_strategy, FitStrategy::Speedup);
        assert_eq!(plan.timeline[1].audio_fit_strategy, FitStrategy::PadSilence);
        assert_eq!(plan.counts, FitCounts { speedup: 1, trim: 0, pad: 1 });
        assert_eq!(plan.total_duration_ms(), 3000);
    }

    #[test]
    fn failed_audio_is_skipped_without_advancing_offset() {
        let fixture = Fixture::new();
        let mut request = request();
        request.scenes.push(Scene::new("scene_c", 3000, 4000));
        request.sentences.insert(1, Sentence::new("s3", "scene_c", "lost"));
        request.audio_clips.push(AudioClip::failed("s3"));

        let plan = fixture.planner().plan(&request).unwrap();

        let skipped = &plan.timeline[1];
        assert!(skipped.skipped);
        assert_eq!(skipped.start_ms, 1000);
        assert_eq!(skipped.end_ms, 1000);
        assert_eq!(skipped.audio_fit_strategy, FitStrategy::None);
        assert_eq!(plan.timeline[2].start_ms, 1000);
        assert_eq!(plan.segments.len(), 2);
        assert_eq!(plan.skipped_count(), 1);
    }

    #[test]
    fn missing_clip_and_unsplittable_ref_are_skipped() {
        let fixture = Fixture::new();
        let mut request = request();
        request.audio_clips = vec![AudioClip::ok("s2", "no_bucket.mp3", 2000)];
        request.sentences.push(Sentence::new("s3", "scene_a", "third"));
        request.audio_clips.push(AudioClip::ok("s3", "audio/task/s3.mp3", 1000));

        let plan = fixture.planner().plan(&request).unwrap();

        assert!(plan.timeline[0].skipped);
        assert!(plan.timeline[1].skipped);
        assert!(!plan.timeline[2].skipped);
        assert_eq!(plan.timeline[2].start_ms, 0);
    }

    #[test]
    fn unknown_scene_is_omitted() {
        let fixture = Fixture::new();
        let mut request = request();
        request.sentences.push(Sentence::new("s3", "nowhere", "orphan"));

        let plan = fixture.planner().plan(&request).unwrap();
        assert_eq!(plan.timeline.len(), 2);
    }

    #[test]
    fn all_skipped_is_no_renderable_segments() {
        let fixture = Fixture::new();
        let mut request = request();
        request.audio_clips = vec![AudioClip::failed("s1"), AudioClip::failed("s2")];

        let result = fixture.planner().plan(&request);
        assert!(matches!(result, Err(PlanError::NoRenderableSegments)));
    }

    #[test]
    fn probe_failure_falls_back_to_reported_then_target() {
        let fixture = Fixture::new();
        let mut request = request();
        request.audio_clips[1].duration_ms = None;

        let plan = fixture.planner().plan(&request).unwrap();

        assert_eq!(plan.timeline[0].raw_audio_duration_ms, 1000);
        assert_eq!(plan.timeline[0].audio_fit_strategy, FitStrategy::None);
        assert_eq!(plan.timeline[1].raw_audio_duration_ms, 2000);
    }

    #[test]
    fn long_audio_is_trimmed_and_flagged() {
        let fixture = Fixture::new();
        fixture.probe.set("s1.mp3", 3500);

        let plan = fixture.planner().plan(&request()).unwrap();

        assert_eq!(plan.timeline[0].audio_fit_strategy, FitStrategy::Trim);
        assert!(plan.timeline[0].audio_trimmed);
        assert_eq!(plan.timeline[0].final_audio_duration_ms, 1000);
        assert_eq!(plan.counts.trim, 1);
    }

    #[test]
    fn source_range_overrides_timeline_range() {
        let fixture = Fixture::new();
        let mut request = request();
        request.scenes[0] = Scene::new("scene_a", 0, 1000).with_source_range(5000, 5750);

        let plan = fixture.planner().plan(&request).unwrap();

        assert_eq!(plan.segments[0].source_start_ms, 5000);
        assert_eq!(plan.segments[0].target_duration_ms, 750);
        assert_eq!(plan.timeline[1].start_ms, 750);
    }

    #[test]
    fn scene_bound_sources_are_fetched_once() {
        let fixture = Fixture::new();
        let mut request = request();
        request.scenes[0] = Scene::new("scene_a", 0, 1000).with_source_video("other/b-roll.mp4");
        request.scenes[1] = Scene::new("scene_b", 1000, 3000).with_source_video("other/b-roll.mp4");

        let plan = fixture.planner().plan(&request).unwrap();

        assert_eq!(plan.source_videos.len(), 2);
        assert!(plan.source_videos[0].ends_with("source_0_source.mp4"));
        assert!(plan.source_videos[1].ends_with("source_extra_1_b-roll.mp4"));
        assert_eq!(plan.segments[0].source_video, plan.segments[1].source_video);
        assert_eq!(plan.timeline[0].source_video_ref, "other/b-roll.mp4");
    }

    #[test]
    fn missing_source_video_is_storage_error() {
        let fixture = Fixture::new();
        let mut request = request();
        request.source_video_refs = vec!["absent.mp4".to_string()];

        let result = fixture.planner().plan(&request);
        assert!(matches!(result, Err(PlanError::Storage { .. })));
    }
}
