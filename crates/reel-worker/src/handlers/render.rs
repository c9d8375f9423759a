//! Render task handler.

use tracing::{info, warn, Instrument};

use reel_models::{Job, JobStatus, JobTransitionError};
use reel_queue::{RenderPayload, TYPE_RENDER};

use crate::context::WorkerContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::render::{RenderInputs, RenderOrchestrator};

/// Run a render job end to end.
///
/// Cancelled or already finished jobs are skipped without work. Missing
/// inputs fail the task before the job is started. A render failure is
/// recorded on both the job and the clip, after which the returned
/// [`WorkerError::JobFailed`] tells the pool not to retry.
pub async fn handle_render(ctx: &WorkerContext, payload: &RenderPayload) -> WorkerResult<()> {
    let logger = JobLogger::new(TYPE_RENDER, &payload.clip_id);
    let span = logger.create_span();
    run(ctx, payload, &logger).instrument(span).await
}

async fn run(ctx: &WorkerContext, payload: &RenderPayload, logger: &JobLogger) -> WorkerResult<()> {
    let mut job = ctx
        .repo
        .get_job(&payload.job_id)
        .await?
        .ok_or_else(|| WorkerError::not_found("Job", payload.job_id.as_str()))?;

    if job.status == JobStatus::Cancelled {
        logger.log_progress(&format!("job {} was cancelled, skipping", job.id));
        return Ok(());
    }
    if job.is_terminal() {
        logger.log_progress(&format!(
            "job {} already {}, skipping",
            job.id,
            job.status.as_str()
        ));
        return Ok(());
    }

    let orchestrator = RenderOrchestrator::new(ctx);
    let inputs = orchestrator.load_inputs(&payload.clip_id).await?;

    job.start()?;
    ctx.repo.save_job(&job).await?;
    ctx.notifier.notify_job(&job).await;
    logger.log_start(&format!("job {} preset {:?}", job.id, payload.preset));

    match render_clip(ctx, &orchestrator, inputs, payload).await {
        Ok(key) => {
            finish_job(ctx, job, |job| job.complete()).await?;
            logger.log_completion(&format!("uploaded {}", key));
            Ok(())
        }
        Err(e) => {
            let message = e.to_string();
            logger.log_error(&message);
            mark_clip_failed(ctx, payload).await;
            finish_job(ctx, job, |job| job.fail(message.clone())).await?;
            Err(WorkerError::job_failed(message))
        }
    }
}

async fn render_clip(
    ctx: &WorkerContext,
    orchestrator: &RenderOrchestrator,
    mut inputs: RenderInputs,
    payload: &RenderPayload,
) -> WorkerResult<String> {
    inputs.clip.mark_rendering();
    ctx.repo.save_clip(&inputs.clip).await?;

    orchestrator.render(inputs, payload.preset.as_deref()).await
}

/// Apply a terminal transition to the stored job, unless it was cancelled
/// while the render ran.
async fn finish_job<F>(ctx: &WorkerContext, job: Job, transition: F) -> WorkerResult<()>
where
    F: FnOnce(&mut Job) -> Result<(), JobTransitionError>,
{
    let id = job.id.clone();
    let mut job = ctx.repo.get_job(&id).await?.unwrap_or(job);
    if job.status == JobStatus::Cancelled {
        info!(job_id = %job.id, "Job cancelled during render, leaving it cancelled");
        return Ok(());
    }
    transition(&mut job)?;
    ctx.repo.save_job(&job).await?;
    ctx.notifier.notify_job(&job).await;
    Ok(())
}

async fn mark_clip_failed(ctx: &WorkerContext, payload: &RenderPayload) {
    match ctx.repo.get_clip(&payload.clip_id).await {
        Ok(Some(mut clip)) => {
            clip.mark_failed();
            if let Err(e) = ctx.repo.save_clip(&clip).await {
                warn!(clip_id = %clip.id, "Failed to mark clip failed: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => warn!(clip_id = %payload.clip_id, "Failed to load clip: {}", e),
    }
}
