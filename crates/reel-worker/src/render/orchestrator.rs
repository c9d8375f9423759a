//! Clip rendering: source download through final upload.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use reel_media::{
    build_blocks, to_ass, AspectKind, CaptionWindow, CropTarget, OutputSize, OverlaySpec,
    Transcoder,
};
use reel_models::{
    BrollSegment, CaptionBlock, Clip, ClipId, ClipStyle, PresetCatalog, Transcription, Video,
};
use reel_repo::Repository;
use reel_storage::ObjectStorage;

use crate::context::WorkerContext;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics::record_broll_skipped;
use crate::render::pipeline::RenderPipeline;

/// Content type of rendered output.
pub const RENDER_CONTENT_TYPE: &str = "video/mp4";

/// Deterministic storage key of a clip's rendered output.
pub fn render_key(clip_id: &ClipId) -> String {
    format!("renders/{}/output.mp4", clip_id)
}

/// Repository state a render works from.
#[derive(Debug, Clone)]
pub struct RenderInputs {
    pub clip: Clip,
    pub style: ClipStyle,
    pub video: Video,
}

/// Produces a clip's output video and publishes it.
pub struct RenderOrchestrator {
    repo: Arc<dyn Repository>,
    storage: Arc<dyn ObjectStorage>,
    transcoder: Arc<dyn Transcoder>,
    presets: PresetCatalog,
    work_dir: PathBuf,
}

impl RenderOrchestrator {
    pub fn new(ctx: &WorkerContext) -> Self {
        Self {
            repo: Arc::clone(&ctx.repo),
            storage: Arc::clone(&ctx.storage),
            transcoder: Arc::clone(&ctx.transcoder),
            presets: ctx.presets.clone(),
            work_dir: ctx.config.work_dir.clone(),
        }
    }

    /// Load and validate everything a render of `clip_id` reads from the
    /// repository.
    pub async fn load_inputs(&self, clip_id: &ClipId) -> WorkerResult<RenderInputs> {
        let clip = self
            .repo
            .get_clip(clip_id)
            .await?
            .ok_or_else(|| WorkerError::not_found("Clip", clip_id.as_str()))?;
        let style = self
            .repo
            .get_style(clip_id)
            .await?
            .ok_or_else(|| WorkerError::not_found("ClipStyle", clip_id.as_str()))?;
        let video = self
            .repo
            .get_video(&clip.video_id)
            .await?
            .ok_or_else(|| WorkerError::not_found("Video", clip.video_id.as_str()))?;
        clip.validate()?;
        Ok(RenderInputs { clip, style, video })
    }

    /// Render the clip, upload the result to [`render_key`] and mark the
    /// clip ready. `preset` selects an export preset by id.
    ///
    /// Any stage failure aborts the render. The scratch workspace is removed
    /// on every exit path and nothing is written to the output key unless
    /// every stage succeeded.
    pub async fn render(&self, inputs: RenderInputs, preset: Option<&str>) -> WorkerResult<String> {
        let RenderInputs {
            mut clip,
            style,
            video,
        } = inputs;
        let clip_id = &clip.id.clone();

        let mut pipeline =
            RenderPipeline::create(&self.work_dir, &format!("render-{}", clip_id)).await?;

        let source = pipeline.source_path();
        let bytes = self.storage.download_file(&video.storage_path, &source).await?;
        debug!(clip_id = %clip_id, "Downloaded source ({} bytes)", bytes);

        let trimmed = pipeline.next_output("trim");
        self.transcoder
            .trim(pipeline.current(), &trimmed, clip.start_time, clip.end_time)
            .await?;
        pipeline.advance(trimmed);

        let segments = self.repo.list_broll_segments(clip_id).await?;
        for segment in &segments {
            if let Err(e) = self.apply_broll(&mut pipeline, segment).await {
                record_broll_skipped();
                warn!(
                    clip_id = %clip_id,
                    segment_id = %segment.id,
                    "Skipping B-roll segment: {}", e
                );
            }
        }

        let target = self.crop_target(&clip, preset);
        let cropped = pipeline.next_output("crop");
        self.transcoder
            .crop(pipeline.current(), &cropped, &target)
            .await?;
        pipeline.advance(cropped);

        if style.caption_enabled {
            self.burn_captions(&mut pipeline, &clip, &style).await?;
        }

        let output = pipeline.file("output.mp4");
        self.transcoder.finalize(pipeline.current(), &output).await?;

        let key = render_key(clip_id);
        self.storage
            .upload_file(&output, &key, RENDER_CONTENT_TYPE)
            .await?;
        pipeline.close();

        clip.mark_ready(key.clone());
        self.repo.save_clip(&clip).await?;
        info!(clip_id = %clip_id, key = %key, "Render uploaded");
        Ok(key)
    }

    /// Overlay one B-roll segment onto the current intermediate.
    async fn apply_broll(
        &self,
        pipeline: &mut RenderPipeline,
        segment: &BrollSegment,
    ) -> WorkerResult<()> {
        let asset = match &segment.asset {
            Some(asset) => asset.clone(),
            None => self
                .repo
                .get_broll_asset(&segment.broll_asset_id)
                .await?
                .ok_or_else(|| {
                    WorkerError::not_found("BrollAsset", segment.broll_asset_id.as_str())
                })?,
        };

        let local = pipeline.file(&format!("broll_{}.mp4", segment.id));
        self.storage.download_file(&asset.storage_path, &local).await?;

        let spec = OverlaySpec::new(
            segment.start_time,
            segment.end_time,
            segment.effective_scale(),
            segment.effective_opacity(),
        );
        let composited = pipeline.next_output("broll");
        self.transcoder
            .overlay(pipeline.current(), &local, &composited, &spec)
            .await?;
        pipeline.advance(composited);
        Ok(())
    }

    fn crop_target(&self, clip: &Clip, preset: Option<&str>) -> CropTarget {
        if let Some(id) = preset.filter(|p| !p.is_empty()) {
            match self.presets.get(id).and_then(OutputSize::from_preset) {
                Some(size) => return CropTarget::Size(size),
                None => warn!(
                    clip_id = %clip.id,
                    preset = id,
                    "Unknown export preset, using clip aspect ratio"
                ),
            }
        }
        CropTarget::Aspect(AspectKind::from_label(&clip.aspect_ratio))
    }

    async fn burn_captions(
        &self,
        pipeline: &mut RenderPipeline,
        clip: &Clip,
        style: &ClipStyle,
    ) -> WorkerResult<()> {
        let Some(transcript) = self.resolve_transcript(clip, style).await? else {
            warn!(clip_id = %clip.id, "Captions enabled but no transcript, skipping");
            return Ok(());
        };

        let window = CaptionWindow::from_bounds(clip.start_time, clip.end_time);
        let blocks = build_blocks(&transcript.segments, style.effective_max_words(), window);
        if blocks.is_empty() {
            debug!(clip_id = %clip.id, "No caption blocks inside clip window");
            return Ok(());
        }
        let blocks = rebase_blocks(blocks, clip.start_time);

        let subtitles = pipeline.file("captions.ass");
        tokio::fs::write(&subtitles, to_ass(&blocks, style)).await?;

        let burned = pipeline.next_output("captions");
        self.transcoder
            .burn_captions(pipeline.current(), &subtitles, &burned)
            .await?;
        pipeline.advance(burned);
        Ok(())
    }

    /// The style's caption language when it has a completed transcript,
    /// otherwise the video's default transcript.
    async fn resolve_transcript(
        &self,
        clip: &Clip,
        style: &ClipStyle,
    ) -> WorkerResult<Option<Transcription>> {
        if let Some(lang) = style.caption_language.as_deref().filter(|l| !l.is_empty()) {
            if let Some(t) = self
                .repo
                .transcription_for_language(&clip.video_id, lang)
                .await?
            {
                return Ok(Some(t));
            }
        }
        Ok(self.repo.default_transcription(&clip.video_id).await?)
    }
}

/// Shift absolute source times onto the trimmed clip's timeline.
fn rebase_blocks(blocks: Vec<CaptionBlock>, clip_start: f64) -> Vec<CaptionBlock> {
    blocks
        .into_iter()
        .map(|b| {
            CaptionBlock::new(
                (b.start - clip_start).max(0.0),
                (b.end - clip_start).max(0.0),
                b.text,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_key_is_deterministic() {
        let id = ClipId::from("clip-1");
        assert_eq!(render_key(&id), "renders/clip-1/output.mp4");
        assert_eq!(render_key(&id), render_key(&ClipId::from("clip-1")));
    }

    #[test]
    fn test_rebase_blocks() {
        let blocks = vec![
            CaptionBlock::new(2.0, 3.0, "This is a"),
            CaptionBlock::new(3.0, 5.0, "longer test sentence"),
        ];
        let rebased = rebase_blocks(blocks, 2.0);
        assert_eq!(rebased[0].start, 0.0);
        assert_eq!(rebased[0].end, 1.0);
        assert_eq!(rebased[1].start, 1.0);
        assert_eq!(rebased[1].end, 3.0);
        assert_eq!(rebased[1].text, "longer test sentence");
    }
}
