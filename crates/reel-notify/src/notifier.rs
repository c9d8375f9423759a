//! Notifier capability exposed to workers.

use async_trait::async_trait;

use reel_models::Job;

use crate::hub::Hub;

/// Publishes job state changes to interested clients.
///
/// Notification is fire-and-forget; delivery failures never fail the job.
#[async_trait]
pub trait JobNotifier: Send + Sync {
    async fn notify_job(&self, job: &Job);
}

#[async_trait]
impl JobNotifier for Hub {
    async fn notify_job(&self, job: &Job) {
        Hub::notify_job(self, job).await;
    }
}

/// Notifier that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl JobNotifier for NoopNotifier {
    async fn notify_job(&self, _job: &Job) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_hub_as_notifier() {
        let hub = Arc::new(Hub::default());
        let mut conn = hub.register("user-1").await;

        let notifier: Arc<dyn JobNotifier> = hub.clone();
        notifier.notify_job(&Job::new_render("user-1", "clip-1")).await;

        assert!(conn.receiver.recv().await.unwrap().contains("job_updated"));
    }
}
