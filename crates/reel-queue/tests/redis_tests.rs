//! Redis Streams queue tests against a live server.

use reel_models::{ClipId, JobId, VideoId};
use reel_queue::{
    QueueError, QueueTask, RedisQueue, RenderPayload, TaskQueue, VideoMetadataPayload,
};

fn queue() -> RedisQueue {
    dotenvy::dotenv().ok();
    RedisQueue::from_env().expect("Failed to create queue")
}

/// Connection and stream/group creation.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_connection() {
    let queue = queue();
    queue.init().await.expect("Failed to initialize queue");
    // A second init must tolerate the existing group.
    queue.init().await.expect("Failed to re-initialize queue");

    let len = queue.len().await.expect("Failed to get queue length");
    println!("Queue length: {}", len);
}

/// Enqueue, consume and ack one render task.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_task_enqueue_consume_ack() {
    let queue = queue();
    queue.init().await.expect("Failed to initialize queue");

    let task = QueueTask::Render(RenderPayload::new(ClipId::new(), JobId::new()));
    let message_id = queue.enqueue(&task).await.expect("Failed to enqueue");
    println!("Enqueued {} as {}", task.idempotency_key(), message_id);

    let deliveries = queue
        .consume("test-consumer", 1000, 10)
        .await
        .expect("Failed to consume");
    let delivery = deliveries
        .iter()
        .find(|d| d.task == task)
        .expect("Task not delivered");

    queue.ack(&delivery.message_id).await.expect("Failed to ack");
    queue.clear_dedup(&task).await.expect("Failed to clear dedup");
}

/// The same idempotency key is refused while the first task is live.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_duplicate_task_rejected() {
    let queue = queue();
    queue.init().await.expect("Failed to initialize queue");

    let task = QueueTask::VideoMetadata(VideoMetadataPayload {
        video_id: VideoId::new(),
    });
    queue.enqueue(&task).await.expect("Failed to enqueue");

    let second = queue.enqueue(&task).await;
    assert!(matches!(second, Err(QueueError::Duplicate(_))));

    queue.clear_dedup(&task).await.expect("Failed to clear dedup");
}

/// Dead-lettering grows the DLQ stream.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_dlq() {
    let queue = queue();
    queue.init().await.expect("Failed to initialize queue");

    let task = QueueTask::Render(RenderPayload::new(ClipId::new(), JobId::new()));
    queue.enqueue(&task).await.expect("Failed to enqueue");

    let deliveries = queue
        .consume("test-dlq-consumer", 1000, 10)
        .await
        .expect("Failed to consume");
    let delivery = deliveries
        .iter()
        .find(|d| d.task == task)
        .expect("Task not delivered");

    let before = queue.dlq_len().await.expect("Failed to get DLQ length");
    queue
        .dlq(&delivery.message_id, &task, "Test error")
        .await
        .expect("Failed to move to DLQ");
    let after = queue.dlq_len().await.expect("Failed to get DLQ length");
    assert_eq!(after, before + 1);

    queue.clear_dedup(&task).await.expect("Failed to clear dedup");
}
