//! Task executor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use reel_queue::{Delivery, TaskQueue};

use crate::context::WorkerContext;
use crate::error::{WorkerError, WorkerResult};
use crate::handlers::process_task;
use crate::metrics::{record_task, TaskOutcome};

/// Tasks fetched per queue read.
const MAX_BATCH: usize = 5;

/// How long a queue read blocks waiting for work.
const CONSUME_BLOCK_MS: u64 = 1000;

/// Fixed-size pool that pulls tasks from the queue and runs their handlers.
///
/// A handled task is acked. A failed one stays pending so the queue can
/// redeliver it, until it has failed `max_retries` times or its error is
/// not retryable; then it is dead-lettered.
pub struct JobExecutor {
    ctx: Arc<WorkerContext>,
    queue: Arc<dyn TaskQueue>,
    job_semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    pub fn new(ctx: WorkerContext, queue: Arc<dyn TaskQueue>) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(ctx.config.concurrency));
        let (shutdown, _) = watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            ctx: Arc::new(ctx),
            queue,
            job_semaphore,
            shutdown,
            consumer_name,
        }
    }

    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }

    /// Run until [`shutdown`](Self::shutdown) is called, then wait for
    /// in-flight tasks up to the configured shutdown timeout.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting executor '{}' with {} concurrent tasks",
            self.consumer_name, self.ctx.config.concurrency
        );

        self.queue.init().await?;

        let mut shutdown_rx = self.shutdown.subscribe();
        let claim_task = self.spawn_claimer();

        loop {
            if *shutdown_rx.borrow() {
                info!("Shutdown signal received, stopping executor");
                break;
            }
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                result = self.consume_tasks() => {
                    if let Err(e) = result {
                        error!("Error consuming tasks: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("Waiting for in-flight tasks to complete...");
        if tokio::time::timeout(self.ctx.config.shutdown_timeout, self.wait_for_tasks())
            .await
            .is_err()
        {
            warn!("Shutdown timeout elapsed with tasks still running");
        }

        info!("Executor stopped");
        Ok(())
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Read one batch and run it to completion on the current task.
    ///
    /// Returns how many tasks were handled.
    pub async fn run_once(&self, block_ms: u64) -> WorkerResult<usize> {
        let deliveries = self
            .queue
            .consume(&self.consumer_name, block_ms, self.ctx.config.concurrency)
            .await?;
        let count = deliveries.len();
        for delivery in deliveries {
            Self::execute_task(Arc::clone(&self.ctx), Arc::clone(&self.queue), delivery).await;
        }
        Ok(count)
    }

    /// Claim tasks idle for at least `min_idle_ms` and run them to
    /// completion on the current task.
    pub async fn reclaim_once(&self, min_idle_ms: u64) -> WorkerResult<usize> {
        let deliveries = self
            .queue
            .claim_pending(&self.consumer_name, min_idle_ms, MAX_BATCH)
            .await?;
        let count = deliveries.len();
        for delivery in deliveries {
            Self::execute_task(Arc::clone(&self.ctx), Arc::clone(&self.queue), delivery).await;
        }
        Ok(count)
    }

    /// Reclaim tasks left pending by crashed consumers.
    fn spawn_claimer(&self) -> tokio::task::JoinHandle<()> {
        let ctx = Arc::clone(&self.ctx);
        let queue = Arc::clone(&self.queue);
        let semaphore = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let mut shutdown_rx = self.shutdown.subscribe();
        let min_idle_ms = ctx.config.claim_min_idle.as_millis() as u64;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(ctx.config.claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue.claim_pending(&consumer_name, min_idle_ms, MAX_BATCH).await {
                            Ok(deliveries) if !deliveries.is_empty() => {
                                info!("Claimed {} pending tasks", deliveries.len());
                                for delivery in deliveries {
                                    let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                                        break;
                                    };
                                    let ctx = Arc::clone(&ctx);
                                    let queue = Arc::clone(&queue);
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        Self::execute_task(ctx, queue, delivery).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => warn!("Failed to claim pending tasks: {}", e),
                        }
                    }
                }
            }
        })
    }

    async fn consume_tasks(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let deliveries = self
            .queue
            .consume(&self.consumer_name, CONSUME_BLOCK_MS, available.min(MAX_BATCH))
            .await?;
        if deliveries.is_empty() {
            return Ok(());
        }
        debug!("Consumed {} tasks from queue", deliveries.len());

        for delivery in deliveries {
            let permit = Arc::clone(&self.job_semaphore)
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::job_failed("Semaphore closed"))?;
            let ctx = Arc::clone(&self.ctx);
            let queue = Arc::clone(&self.queue);

            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_task(ctx, queue, delivery).await;
            });
        }
        Ok(())
    }

    /// Run one delivery and settle it with the queue.
    async fn execute_task(ctx: Arc<WorkerContext>, queue: Arc<dyn TaskQueue>, delivery: Delivery) {
        let Delivery { message_id, task } = delivery;
        let task_type = task.task_type();
        let key = task.idempotency_key();
        info!(task_type, "Executing task {}", key);

        let started = Instant::now();
        let result = process_task(&ctx, &task).await;
        let elapsed = started.elapsed().as_secs_f64();

        let outcome = match result {
            Ok(()) => {
                info!(task_type, "Task {} completed", key);
                if let Err(e) = queue.ack(&message_id).await {
                    error!("Failed to ack task {}: {}", key, e);
                }
                TaskOutcome::Succeeded
            }
            Err(e) => {
                error!(task_type, kind = ?e.kind(), "Task {} failed: {}", key, e);

                let max_retries = queue.max_retries();
                let exhausted = if e.is_retryable() {
                    let retry_count = queue.increment_retry(&message_id).await.unwrap_or(u32::MAX);
                    if retry_count < max_retries {
                        info!(
                            "Task {} will be retried (attempt {}/{})",
                            key, retry_count, max_retries
                        );
                    }
                    retry_count >= max_retries
                } else {
                    true
                };

                if exhausted {
                    warn!("Moving task {} to DLQ", key);
                    if let Err(dlq_err) = queue.dlq(&message_id, &task, &e.to_string()).await {
                        error!("Failed to move task {} to DLQ: {}", key, dlq_err);
                    }
                    TaskOutcome::DeadLettered
                } else {
                    TaskOutcome::Retrying
                }
            }
        };

        // Allow the same work to be enqueued again once this delivery is settled.
        if outcome != TaskOutcome::Retrying {
            if let Err(e) = queue.clear_dedup(&task).await {
                warn!("Failed to clear dedup key for task {}: {}", key, e);
            }
        }
        record_task(task_type, outcome, elapsed);
    }

    async fn wait_for_tasks(&self) {
        while self.job_semaphore.available_permits() < self.ctx.config.concurrency {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
