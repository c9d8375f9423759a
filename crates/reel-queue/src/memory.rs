//! In-memory task queue with stream-like delivery semantics.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use crate::error::{QueueError, QueueResult};
use crate::queue::{Delivery, TaskQueue};
use crate::task::QueueTask;

#[derive(Debug)]
struct PendingEntry {
    task: QueueTask,
    consumer: String,
    delivered_at: Instant,
}

/// A dead-lettered task.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadLetter {
    pub original_id: String,
    pub task: QueueTask,
    pub error: String,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    ready: VecDeque<(String, QueueTask)>,
    pending: HashMap<String, PendingEntry>,
    retries: HashMap<String, u32>,
    dedup: HashSet<String>,
    dead: Vec<DeadLetter>,
}

/// Task queue held in process memory.
///
/// Delivered tasks stay pending until acked, like a stream consumer group.
#[derive(Debug)]
pub struct MemoryQueue {
    state: Mutex<State>,
    notify: Notify,
    max_retries: u32,
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new(3)
    }
}

impl MemoryQueue {
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            max_retries,
        }
    }

    /// Tasks waiting for first delivery.
    pub async fn ready_len(&self) -> usize {
        self.state.lock().await.ready.len()
    }

    /// Tasks delivered but not yet acked.
    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn dead_letters(&self) -> Vec<DeadLetter> {
        self.state.lock().await.dead.clone()
    }

    fn take_ready(state: &mut State, consumer: &str, count: usize) -> Vec<Delivery> {
        let n = count.min(state.ready.len());
        state
            .ready
            .drain(..n)
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(message_id, task)| {
                state.pending.insert(
                    message_id.clone(),
                    PendingEntry {
                        task: task.clone(),
                        consumer: consumer.to_string(),
                        delivered_at: Instant::now(),
                    },
                );
                Delivery { message_id, task }
            })
            .collect()
    }
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    async fn init(&self) -> QueueResult<()> {
        Ok(())
    }

    async fn enqueue(&self, task: &QueueTask) -> QueueResult<String> {
        let key = task.idempotency_key();
        let message_id = {
            let mut state = self.state.lock().await;
            if !state.dedup.insert(key.clone()) {
                warn!("Duplicate task rejected: {}", key);
                return Err(QueueError::Duplicate(key));
            }
            state.next_id += 1;
            let message_id = format!("{}-0", state.next_id);
            state.ready.push_back((message_id.clone(), task.clone()));
            message_id
        };
        self.notify.notify_waiters();
        debug!(task_type = task.task_type(), "Enqueued task {}", message_id);
        Ok(message_id)
    }

    async fn consume(&self, consumer: &str, block_ms: u64, count: usize) -> QueueResult<Vec<Delivery>> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(block_ms);
        loop {
            // Register interest before checking so an enqueue in between is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if !state.ready.is_empty() {
                    return Ok(Self::take_ready(&mut state, consumer, count));
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn claim_pending(
        &self,
        consumer: &str,
        min_idle_ms: u64,
        count: usize,
    ) -> QueueResult<Vec<Delivery>> {
        let min_idle = Duration::from_millis(min_idle_ms);
        let mut state = self.state.lock().await;

        let mut idle: Vec<(&String, &mut PendingEntry)> = state
            .pending
            .iter_mut()
            .filter(|(_, p)| p.delivered_at.elapsed() >= min_idle)
            .collect();
        idle.sort_by(|a, b| a.0.cmp(b.0));

        Ok(idle
            .into_iter()
            .take(count)
            .map(|(id, entry)| {
                debug!("Reclaiming task {} from {}", id, entry.consumer);
                entry.consumer = consumer.to_string();
                entry.delivered_at = Instant::now();
                Delivery {
                    message_id: id.clone(),
                    task: entry.task.clone(),
                }
            })
            .collect())
    }

    async fn ack(&self, message_id: &str) -> QueueResult<()> {
        let mut state = self.state.lock().await;
        state.retries.remove(message_id);
        if state.pending.remove(message_id).is_none() {
            return Err(QueueError::UnknownMessage(message_id.to_string()));
        }
        Ok(())
    }

    async fn increment_retry(&self, message_id: &str) -> QueueResult<u32> {
        let mut state = self.state.lock().await;
        let count = state.retries.entry(message_id.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn dlq(&self, message_id: &str, task: &QueueTask, error: &str) -> QueueResult<()> {
        {
            let mut state = self.state.lock().await;
            state.dead.push(DeadLetter {
                original_id: message_id.to_string(),
                task: task.clone(),
                error: error.to_string(),
            });
        }
        self.ack(message_id).await?;
        warn!("Moved task {} to DLQ: {}", task.idempotency_key(), error);
        Ok(())
    }

    async fn clear_dedup(&self, task: &QueueTask) -> QueueResult<()> {
        self.state.lock().await.dedup.remove(&task.idempotency_key());
        Ok(())
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }
}
