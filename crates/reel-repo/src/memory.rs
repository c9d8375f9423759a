//! In-memory repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use reel_models::{
    BrollAsset, BrollAssetId, BrollSegment, Clip, ClipId, ClipStyle, EntityType, Job, JobId,
    Transcription, TranscriptionId, TranscriptionStatus, Video, VideoAnalysis, VideoId,
};

use crate::error::{RepoError, RepoResult};
use crate::repos::{
    AnalysisRepository, BrollRepository, ClipRepository, JobRepository, StyleRepository,
    TranscriptionRepository, VideoRepository,
};

#[derive(Debug, Default)]
struct State {
    clips: HashMap<ClipId, Clip>,
    styles: HashMap<ClipId, ClipStyle>,
    videos: HashMap<VideoId, Video>,
    // Insertion-ordered so "latest" ties resolve to the newest write.
    jobs: Vec<Job>,
    transcriptions: Vec<Transcription>,
    assets: HashMap<BrollAssetId, BrollAsset>,
    segments: Vec<BrollSegment>,
    analyses: HashMap<VideoId, VideoAnalysis>,
}

/// Repository backed by process memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    state: Arc<RwLock<State>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn upsert_by<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T) -> bool) {
    match items.iter_mut().find(|existing| same(existing)) {
        Some(existing) => *existing = item,
        None => items.push(item),
    }
}

#[async_trait]
impl ClipRepository for MemoryRepo {
    async fn get_clip(&self, id: &ClipId) -> RepoResult<Option<Clip>> {
        Ok(self.state.read().await.clips.get(id).cloned())
    }

    async fn save_clip(&self, clip: &Clip) -> RepoResult<()> {
        self.state
            .write()
            .await
            .clips
            .insert(clip.id.clone(), clip.clone());
        Ok(())
    }
}

#[async_trait]
impl StyleRepository for MemoryRepo {
    async fn get_style(&self, clip_id: &ClipId) -> RepoResult<Option<ClipStyle>> {
        Ok(self.state.read().await.styles.get(clip_id).cloned())
    }

    async fn save_style(&self, style: &ClipStyle) -> RepoResult<()> {
        self.state
            .write()
            .await
            .styles
            .insert(style.clip_id.clone(), style.clone());
        Ok(())
    }
}

#[async_trait]
impl VideoRepository for MemoryRepo {
    async fn get_video(&self, id: &VideoId) -> RepoResult<Option<Video>> {
        Ok(self.state.read().await.videos.get(id).cloned())
    }

    async fn save_video(&self, video: &Video) -> RepoResult<()> {
        self.state
            .write()
            .await
            .videos
            .insert(video.id.clone(), video.clone());
        Ok(())
    }
}

#[async_trait]
impl JobRepository for MemoryRepo {
    async fn get_job(&self, id: &JobId) -> RepoResult<Option<Job>> {
        Ok(self
            .state
            .read()
            .await
            .jobs
            .iter()
            .find(|j| &j.id == id)
            .cloned())
    }

    async fn save_job(&self, job: &Job) -> RepoResult<()> {
        let mut state = self.state.write().await;
        upsert_by(&mut state.jobs, job.clone(), |j| j.id == job.id);
        debug!(job_id = %job.id, status = job.status.as_str(), progress = job.progress, "Saved job");
        Ok(())
    }

    async fn latest_job_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> RepoResult<Option<Job>> {
        Ok(self
            .state
            .read()
            .await
            .jobs
            .iter()
            .filter(|j| j.entity_type == entity_type && j.entity_id == entity_id)
            .max_by_key(|j| j.created_at)
            .cloned())
    }

    async fn cancel_job(&self, id: &JobId) -> RepoResult<Option<Job>> {
        let mut state = self.state.write().await;
        Ok(state.jobs.iter_mut().find(|j| &j.id == id).map(|job| {
            job.cancel();
            job.clone()
        }))
    }
}

#[async_trait]
impl BrollRepository for MemoryRepo {
    async fn get_broll_asset(&self, id: &BrollAssetId) -> RepoResult<Option<BrollAsset>> {
        Ok(self.state.read().await.assets.get(id).cloned())
    }

    async fn save_broll_asset(&self, asset: &BrollAsset) -> RepoResult<()> {
        self.state
            .write()
            .await
            .assets
            .insert(asset.id.clone(), asset.clone());
        Ok(())
    }

    async fn list_broll_segments(&self, clip_id: &ClipId) -> RepoResult<Vec<BrollSegment>> {
        let mut segments: Vec<BrollSegment> = self
            .state
            .read()
            .await
            .segments
            .iter()
            .filter(|s| &s.clip_id == clip_id)
            .cloned()
            .collect();
        segments.sort_by_key(|s| s.sequence_order);
        Ok(segments)
    }

    async fn insert_broll_segment(&self, mut segment: BrollSegment) -> RepoResult<BrollSegment> {
        let mut state = self.state.write().await;
        if state.segments.iter().any(|s| s.id == segment.id) {
            return Err(RepoError::AlreadyExists(segment.id.to_string()));
        }
        if segment.sequence_order == 0 {
            let existing: Vec<BrollSegment> = state
                .segments
                .iter()
                .filter(|s| s.clip_id == segment.clip_id)
                .cloned()
                .collect();
            segment.sequence_order = BrollSegment::next_sequence_order(&existing);
        }
        state.segments.push(segment.clone());
        Ok(segment)
    }
}

#[async_trait]
impl TranscriptionRepository for MemoryRepo {
    async fn get_transcription(&self, id: &TranscriptionId) -> RepoResult<Option<Transcription>> {
        Ok(self
            .state
            .read()
            .await
            .transcriptions
            .iter()
            .find(|t| &t.id == id)
            .cloned())
    }

    async fn save_transcription(&self, transcription: &Transcription) -> RepoResult<()> {
        let mut state = self.state.write().await;
        upsert_by(&mut state.transcriptions, transcription.clone(), |t| {
            t.id == transcription.id
        });
        Ok(())
    }

    async fn transcription_for_language(
        &self,
        video_id: &VideoId,
        language: &str,
    ) -> RepoResult<Option<Transcription>> {
        Ok(self
            .state
            .read()
            .await
            .transcriptions
            .iter()
            .filter(|t| {
                &t.video_id == video_id
                    && t.status == TranscriptionStatus::Completed
                    && t.language.eq_ignore_ascii_case(language)
            })
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn default_transcription(&self, video_id: &VideoId) -> RepoResult<Option<Transcription>> {
        let state = self.state.read().await;
        let for_video: Vec<&Transcription> = state
            .transcriptions
            .iter()
            .filter(|t| &t.video_id == video_id)
            .collect();

        let completed = for_video
            .iter()
            .filter(|t| t.status == TranscriptionStatus::Completed)
            .max_by_key(|t| t.created_at);
        Ok(completed
            .or_else(|| for_video.iter().max_by_key(|t| t.created_at))
            .map(|t| (*t).clone()))
    }
}

#[async_trait]
impl AnalysisRepository for MemoryRepo {
    async fn get_analysis(&self, video_id: &VideoId) -> RepoResult<Option<VideoAnalysis>> {
        Ok(self.state.read().await.analyses.get(video_id).cloned())
    }

    async fn upsert_analysis(&self, analysis: &VideoAnalysis) -> RepoResult<()> {
        let mut state = self.state.write().await;
        let mut analysis = analysis.clone();
        if let Some(existing) = state.analyses.get(&analysis.video_id) {
            analysis.created_at = existing.created_at;
        }
        state.analyses.insert(analysis.video_id.clone(), analysis);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{JobStatus, SceneRange, TranscriptSegment};

    #[tokio::test]
    async fn test_clip_roundtrip() {
        let repo = MemoryRepo::new();
        let clip = Clip::new(VideoId::from("v1"), "user-1", 1.0, 4.0);
        repo.save_clip(&clip).await.unwrap();
        assert_eq!(repo.get_clip(&clip.id).await.unwrap(), Some(clip));
        assert!(repo.get_clip(&ClipId::from("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_job_respects_terminal_states() {
        let repo = MemoryRepo::new();
        let pending = Job::new_render("user-1", "clip-1");
        let mut done = Job::new_render("user-1", "clip-2");
        done.start().unwrap();
        done.complete().unwrap();
        repo.save_job(&pending).await.unwrap();
        repo.save_job(&done).await.unwrap();

        let cancelled = repo.cancel_job(&pending.id).await.unwrap().unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);

        let unchanged = repo.cancel_job(&done.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, JobStatus::Completed);

        assert!(repo.cancel_job(&JobId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_job_for_entity() {
        let repo = MemoryRepo::new();
        let first = Job::new(
            "user-1",
            reel_models::JobType::VideoProcessing,
            EntityType::Video,
            "v1",
        );
        let second = Job::new(
            "user-1",
            reel_models::JobType::VideoProcessing,
            EntityType::Video,
            "v1",
        );
        repo.save_job(&first).await.unwrap();
        repo.save_job(&second).await.unwrap();

        let latest = repo
            .latest_job_for_entity(EntityType::Video, "v1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, second.id);
        assert!(repo
            .latest_job_for_entity(EntityType::Clip, "v1")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_broll_segments_ordered_and_numbered() {
        let repo = MemoryRepo::new();
        let clip_id = ClipId::from("clip-1");
        let a = repo
            .insert_broll_segment(BrollSegment::new(clip_id.clone(), BrollAssetId::from("a"), 0.0, 1.0))
            .await
            .unwrap();
        let b = repo
            .insert_broll_segment(BrollSegment::new(clip_id.clone(), BrollAssetId::from("b"), 1.0, 2.0))
            .await
            .unwrap();
        assert_eq!(a.sequence_order, 1);
        assert_eq!(b.sequence_order, 2);

        let mut first = BrollSegment::new(clip_id.clone(), BrollAssetId::from("c"), 0.0, 0.5);
        first.sequence_order = -1;
        repo.insert_broll_segment(first).await.unwrap();

        let listed = repo.list_broll_segments(&clip_id).await.unwrap();
        let assets: Vec<&str> = listed.iter().map(|s| s.broll_asset_id.as_str()).collect();
        assert_eq!(assets, vec!["c", "a", "b"]);

        assert!(repo.insert_broll_segment(a).await.is_err());
    }

    #[tokio::test]
    async fn test_transcription_lookup() {
        let repo = MemoryRepo::new();
        let video_id = VideoId::from("v1");

        let pending = Transcription::new(video_id.clone(), "en");
        repo.save_transcription(&pending).await.unwrap();
        assert_eq!(
            repo.default_transcription(&video_id).await.unwrap().unwrap().id,
            pending.id
        );
        assert!(repo
            .transcription_for_language(&video_id, "en")
            .await
            .unwrap()
            .is_none());

        let mut spanish = Transcription::new(video_id.clone(), "es");
        spanish.complete(vec![TranscriptSegment::new(0.0, 1.0, "hola")]);
        repo.save_transcription(&spanish).await.unwrap();

        assert_eq!(
            repo.default_transcription(&video_id).await.unwrap().unwrap().id,
            spanish.id
        );
        assert_eq!(
            repo.transcription_for_language(&video_id, "ES")
                .await
                .unwrap()
                .unwrap()
                .id,
            spanish.id
        );
    }

    #[tokio::test]
    async fn test_upsert_analysis_keeps_created_at() {
        let repo = MemoryRepo::new();
        let video_id = VideoId::from("v1");
        let first = VideoAnalysis::new(video_id.clone(), vec![]);
        repo.upsert_analysis(&first).await.unwrap();

        let second = VideoAnalysis::new(video_id.clone(), vec![SceneRange { start: 0.0, end: 10.0 }]);
        repo.upsert_analysis(&second).await.unwrap();

        let stored = repo.get_analysis(&video_id).await.unwrap().unwrap();
        assert_eq!(stored.scenes.len(), 1);
        assert_eq!(stored.created_at, first.created_at);
    }
}
