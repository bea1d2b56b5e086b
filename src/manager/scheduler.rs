// Poll timing abstraction
use async_trait::async_trait;
use std::time::Duration;

/// Sits between the poll loop and real time so tests can run the loop
/// without waiting.
#[async_trait]
pub trait PollScheduler: Send + Sync {
    async fn wait(&self, interval: Duration);
}

pub struct TokioScheduler;

#[async_trait]
impl PollScheduler for TokioScheduler {
    async fn wait(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}
