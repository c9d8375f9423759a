//! Repository traits.
//!
//! Getters return `Ok(None)` for missing records; callers decide whether
//! absence is an error. Method names are prefixed by entity so that a
//! `dyn Repository` can call any of them without disambiguation.

use async_trait::async_trait;

use reel_models::{
    BrollAsset, BrollAssetId, BrollSegment, Clip, ClipId, ClipStyle, EntityType, Job, JobId,
    Transcription, TranscriptionId, Video, VideoAnalysis, VideoId,
};

use crate::error::RepoResult;

#[async_trait]
pub trait ClipRepository: Send + Sync {
    async fn get_clip(&self, id: &ClipId) -> RepoResult<Option<Clip>>;

    /// Insert or replace a clip.
    async fn save_clip(&self, clip: &Clip) -> RepoResult<()>;
}

#[async_trait]
pub trait StyleRepository: Send + Sync {
    async fn get_style(&self, clip_id: &ClipId) -> RepoResult<Option<ClipStyle>>;

    async fn save_style(&self, style: &ClipStyle) -> RepoResult<()>;
}

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get_video(&self, id: &VideoId) -> RepoResult<Option<Video>>;

    async fn save_video(&self, video: &Video) -> RepoResult<()>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn get_job(&self, id: &JobId) -> RepoResult<Option<Job>>;

    async fn save_job(&self, job: &Job) -> RepoResult<()>;

    /// Most recently created job referencing the given entity.
    async fn latest_job_for_entity(
        &self,
        entity_type: EntityType,
        entity_id: &str,
    ) -> RepoResult<Option<Job>>;

    /// Apply an owner's cancel request atomically.
    ///
    /// Returns the job as stored after the request. Terminal jobs are
    /// returned unchanged.
    async fn cancel_job(&self, id: &JobId) -> RepoResult<Option<Job>>;
}

#[async_trait]
pub trait BrollRepository: Send + Sync {
    async fn get_broll_asset(&self, id: &BrollAssetId) -> RepoResult<Option<BrollAsset>>;

    async fn save_broll_asset(&self, asset: &BrollAsset) -> RepoResult<()>;

    /// Segments placed on a clip, ordered by `sequence_order`.
    async fn list_broll_segments(&self, clip_id: &ClipId) -> RepoResult<Vec<BrollSegment>>;

    /// Insert a segment. A zero `sequence_order` is replaced with the next
    /// free value for the clip. Returns the stored segment.
    async fn insert_broll_segment(&self, segment: BrollSegment) -> RepoResult<BrollSegment>;
}

#[async_trait]
pub trait TranscriptionRepository: Send + Sync {
    async fn get_transcription(&self, id: &TranscriptionId) -> RepoResult<Option<Transcription>>;

    async fn save_transcription(&self, transcription: &Transcription) -> RepoResult<()>;

    /// Latest completed transcription of a video in the given language.
    async fn transcription_for_language(
        &self,
        video_id: &VideoId,
        language: &str,
    ) -> RepoResult<Option<Transcription>>;

    /// Latest completed transcription of a video, falling back to the
    /// latest one in any state.
    async fn default_transcription(&self, video_id: &VideoId) -> RepoResult<Option<Transcription>>;
}

#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn get_analysis(&self, video_id: &VideoId) -> RepoResult<Option<VideoAnalysis>>;

    /// Insert or replace the analysis for a video.
    async fn upsert_analysis(&self, analysis: &VideoAnalysis) -> RepoResult<()>;
}

/// Every repository a worker needs, as one object.
pub trait Repository:
    ClipRepository
    + StyleRepository
    + VideoRepository
    + JobRepository
    + BrollRepository
    + TranscriptionRepository
    + AnalysisRepository
{
}

impl<T> Repository for T where
    T: ClipRepository
        + StyleRepository
        + VideoRepository
        + JobRepository
        + BrollRepository
        + TranscriptionRepository
        + AnalysisRepository
{
}
