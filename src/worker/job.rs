//! `DistributeJob`: one event fanned out to one event source's subscriber
//! snapshot.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use tokio::io::AsyncWrite;

// Layer 3: Internal module imports
use crate::framing::Event;
use crate::metrics::MetricsSink;
use crate::subscriber::Subscriber;

/// Work item: write one event to every non-corrupt subscriber in a
/// snapshot taken at submission time.
pub struct DistributeJob<S> {
    pub topic: String,
    pub event: Event,
    pub subscribers: Vec<Subscriber<S>>,
    pub metrics: Arc<dyn MetricsSink>,
}

impl<S> DistributeJob<S>
where
    S: AsyncWrite + Unpin + Send,
{
    /// Writes the event to every non-corrupt subscriber, marking any
    /// subscriber corrupt whose write fails and continuing with the
    /// rest. Never returns an error: write failures are per-subscriber,
    /// not per-job.
    pub async fn run(self) {
        for subscriber in &self.subscribers {
            if subscriber.is_corrupt() {
                continue;
            }

            if let Err(err) = subscriber.write_event(&self.event).await {
                tracing::warn!(
                    topic = %self.topic,
                    subscriber_id = %subscriber.id(),
                    error = %err,
                    "failed to write event to subscriber, marking corrupt"
                );
                subscriber.mark_corrupt();
                self.metrics.dec_subscriber(&self.topic);
            }
        }

        self.metrics.inc_distributed(&self.topic);
        self.metrics.dec_pending(&self.topic);
    }
}
