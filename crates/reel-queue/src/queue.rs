//! Task queue using Redis Streams.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::task::QueueTask;

const DEDUP_TTL_SECS: u64 = 3600;
const RETRY_TTL_SECS: i64 = 86_400;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for tasks
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Dead letter queue stream name
    pub dlq_stream_name: String,
    /// Max retries before DLQ
    pub max_retries: u32,
    /// Prefix for dedup and retry keys
    pub key_prefix: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "reel:tasks".to_string(),
            consumer_group: "reel:workers".to_string(),
            dlq_stream_name: "reel:dlq".to_string(),
            max_retries: 3,
            key_prefix: "reel".to_string(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            stream_name: std::env::var("QUEUE_STREAM").unwrap_or(defaults.stream_name),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
            dlq_stream_name: std::env::var("QUEUE_DLQ_STREAM").unwrap_or(defaults.dlq_stream_name),
            max_retries: std::env::var("QUEUE_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            key_prefix: defaults.key_prefix,
        }
    }

    fn dedup_key(&self, task: &QueueTask) -> String {
        format!("{}:dedup:{}", self.key_prefix, task.idempotency_key())
    }

    fn retry_key(&self, message_id: &str) -> String {
        format!("{}:retry:{}", self.key_prefix, message_id)
    }
}

/// A task handed to a consumer, with the id needed to ack it.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub message_id: String,
    pub task: QueueTask,
}

/// Durable at-least-once task dispatch.
///
/// A delivered task stays pending until acked. Unacked tasks are handed
/// out again by [`TaskQueue::claim_pending`] once idle long enough.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Create the stream and consumer group if needed.
    async fn init(&self) -> QueueResult<()>;

    /// Schedule a task. Returns the message id.
    async fn enqueue(&self, task: &QueueTask) -> QueueResult<String>;

    /// Read up to `count` new tasks, blocking up to `block_ms`.
    async fn consume(&self, consumer: &str, block_ms: u64, count: usize) -> QueueResult<Vec<Delivery>>;

    /// Take over tasks left unacked for at least `min_idle_ms`.
    async fn claim_pending(
        &self,
        consumer: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<Delivery>>;

    /// Acknowledge a task (mark as done).
    async fn ack(&self, message_id: &str) -> QueueResult<()>;

    /// Increment and return the failure count of a message.
    async fn increment_retry(&self, message_id: &str) -> QueueResult<u32>;

    /// Move a task to the dead letter queue and ack the original.
    async fn dlq(&self, message_id: &str, task: &QueueTask, error: &str) -> QueueResult<()>;

    /// Forget the dedup marker so the same task can be enqueued again.
    async fn clear_dedup(&self, task: &QueueTask) -> QueueResult<()>;

    fn max_retries(&self) -> u32;

    /// Schedule a task given as a type name and JSON payload.
    async fn enqueue_parts(&self, task_type: &str, payload: serde_json::Value) -> QueueResult<String> {
        let task = QueueTask::from_parts(task_type, payload)?;
        self.enqueue(&task).await
    }
}

/// Task queue client backed by a Redis stream and consumer group.
pub struct RedisQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl RedisQueue {
    /// Create a new task queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    async fn connection(&self) -> QueueResult<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }

    /// Get DLQ length.
    pub async fn dlq_len(&self) -> QueueResult<u64> {
        let mut conn = self.connection().await?;
        let len: u64 = conn.xlen(&self.config.dlq_stream_name).await?;
        Ok(len)
    }

    /// Parse stream entries, acking the ones that cannot be decoded.
    async fn decode_entries(&self, entries: Vec<redis::streams::StreamId>) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        for entry in entries {
            let message_id = entry.id.clone();
            let Some(payload) = entry.get::<String>("task") else {
                warn!("Message {} has no task field, dropping", message_id);
                self.ack(&message_id).await.ok();
                continue;
            };
            match serde_json::from_str::<QueueTask>(&payload) {
                Ok(task) => deliveries.push(Delivery { message_id, task }),
                Err(e) => {
                    warn!("Failed to parse task payload of {}: {}", message_id, e);
                    // Ack the malformed message to prevent reprocessing
                    self.ack(&message_id).await.ok();
                }
            }
        }
        deliveries
    }
}

#[async_trait]
impl TaskQueue for RedisQueue {
    async fn init(&self) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    async fn enqueue(&self, task: &QueueTask) -> QueueResult<String> {
        let mut conn = self.connection().await?;

        let payload = serde_json::to_string(task)?;
        let dedup_key = self.config.dedup_key(task);

        // SET NX doubles as the duplicate check
        let fresh: bool = redis::cmd("SET")
            .arg(&dedup_key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(DEDUP_TTL_SECS)
            .query_async::<Option<String>>(&mut conn)
            .await?
            .is_some();
        if !fresh {
            warn!("Duplicate task rejected: {}", task.idempotency_key());
            return Err(QueueError::Duplicate(task.idempotency_key()));
        }

        let message_id: String = match redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("type")
            .arg(task.task_type())
            .arg("task")
            .arg(&payload)
            .query_async(&mut conn)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                conn.del::<_, ()>(&dedup_key).await.ok();
                return Err(QueueError::Redis(e));
            }
        };

        info!(
            task_type = task.task_type(),
            entity_id = task.entity_id(),
            "Enqueued task with message ID {}",
            message_id
        );

        Ok(message_id)
    }

    async fn consume(&self, consumer: &str, block_ms: u64, count: usize) -> QueueResult<Vec<Delivery>> {
        let mut conn = self.connection().await?;

        let result: redis::streams::StreamReadReply = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(consumer)
            .arg("COUNT")
            .arg(count)
            .arg("BLOCK")
            .arg(block_ms)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">") // Only new messages
            .query_async(&mut conn)
            .await?;

        let entries = result.keys.into_iter().flat_map(|k| k.ids).collect();
        let deliveries = self.decode_entries(entries).await;
        if !deliveries.is_empty() {
            debug!("Consumed {} tasks from stream", deliveries.len());
        }
        Ok(deliveries)
    }

    async fn claim_pending(
        &self,
        consumer: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<Delivery>> {
        let mut conn = self.connection().await?;

        let pending: redis::streams::StreamPendingCountReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("-")
            .arg("+")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let idle_ids: Vec<String> = pending
            .ids
            .into_iter()
            .filter(|p| p.last_delivered_ms as u64 >= min_idle_ms)
            .map(|p| p.id)
            .collect();
        if idle_ids.is_empty() {
            return Ok(Vec::new());
        }

        let result: redis::streams::StreamClaimReply = redis::cmd("XCLAIM")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(consumer)
            .arg(min_idle_ms)
            .arg(&idle_ids)
            .query_async(&mut conn)
            .await?;

        let deliveries = self.decode_entries(result.ids).await;
        if !deliveries.is_empty() {
            info!("Claimed {} pending tasks from stream", deliveries.len());
        }
        Ok(deliveries)
    }

    async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        conn.del::<_, ()>(self.config.retry_key(message_id)).await?;

        debug!("Acknowledged task: {}", message_id);
        Ok(())
    }

    async fn increment_retry(&self, message_id: &str) -> QueueResult<u32> {
        let mut conn = self.connection().await?;

        let key = self.config.retry_key(message_id);
        let count: u32 = conn.incr(&key, 1).await?;
        conn.expire::<_, ()>(&key, RETRY_TTL_SECS).await?;
        Ok(count)
    }

    async fn dlq(&self, message_id: &str, task: &QueueTask, error: &str) -> QueueResult<()> {
        let mut conn = self.connection().await?;

        let payload = serde_json::to_string(task)?;

        redis::cmd("XADD")
            .arg(&self.config.dlq_stream_name)
            .arg("*")
            .arg("type")
            .arg(task.task_type())
            .arg("task")
            .arg(&payload)
            .arg("error")
            .arg(error)
            .arg("original_id")
            .arg(message_id)
            .query_async::<()>(&mut conn)
            .await?;

        self.ack(message_id).await?;

        warn!("Moved task {} to DLQ: {}", task.idempotency_key(), error);
        Ok(())
    }

    async fn clear_dedup(&self, task: &QueueTask) -> QueueResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(self.config.dedup_key(task)).await?;
        Ok(())
    }

    fn max_retries(&self) -> u32 {
        self.config.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.stream_name, "reel:tasks");
        assert_eq!(config.consumer_group, "reel:workers");
        assert_eq!(config.dlq_stream_name, "reel:dlq");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_key("1-0"), "reel:retry:1-0");
    }
}
