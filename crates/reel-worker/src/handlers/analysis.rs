//! Scene analysis handler.

use tracing::Instrument;

use reel_models::VideoAnalysis;
use reel_queue::{AnalysisPayload, TYPE_ANALYSIS};

use crate::context::WorkerContext;
use crate::error::{WorkerError, WorkerResult};
use crate::handlers::video::load_video;
use crate::logging::JobLogger;
use crate::workspace::Workspace;

/// Detect scene changes in the source and upsert the video's analysis.
///
/// Detection problems yield an analysis with no scenes rather than an
/// error.
pub async fn handle_analysis(ctx: &WorkerContext, payload: &AnalysisPayload) -> WorkerResult<()> {
    let logger = JobLogger::new(TYPE_ANALYSIS, &payload.video_id);
    let span = logger.create_span();
    async {
        let video = load_video(ctx, &payload.video_id).await?;
        logger.log_start(&video.storage_path);

        let workspace =
            Workspace::create(&ctx.config.work_dir, &format!("analysis-{}", video.id)).await?;
        let source = workspace.file("source.mp4");
        ctx.storage.download_file(&video.storage_path, &source).await?;

        let scenes = ctx.tools.detect_scenes(&source).await;
        workspace.close();

        let count = scenes.len();
        ctx.repo
            .upsert_analysis(&VideoAnalysis::new(video.id.clone(), scenes))
            .await?;
        logger.log_completion(&format!("{} scenes", count));
        Ok::<(), WorkerError>(())
    }
    .instrument(span)
    .await
}
