//! `EventSource`: per-topic fan-out hub and its three background tasks.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::{Mutex as SyncMutex, RwLock};
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::framing::Event;
use crate::metrics::MetricsSink;
use crate::subscriber::Subscriber;
use crate::worker::{DistributeJob, WorkerPool};

/// Per-topic fan-out state. Holds an ingress channel for publish payloads,
/// an incoming channel for newly admitted subscribers, the live subscriber
/// list, and the waiting list the admitter fills while a cleaning pass is
/// underway.
///
/// Only the cleaner mutates `subscribers`; only the admitter writes to
/// `incoming`/`waiting`; the cleaner merges `waiting` into `subscribers`
/// between passes (spec §4.2, §5). `start` takes ownership of both channel
/// receivers the first time it runs; a second call is a no-op.
pub struct EventSource<S> {
    topic: String,
    cleaning_interval: Duration,
    ingress_tx: mpsc::Sender<Vec<u8>>,
    ingress_rx: AsyncMutex<Option<mpsc::Receiver<Vec<u8>>>>,
    incoming_tx: mpsc::UnboundedSender<Subscriber<S>>,
    incoming_rx: AsyncMutex<Option<mpsc::UnboundedReceiver<Subscriber<S>>>>,
    subscribers: RwLock<Vec<Subscriber<S>>>,
    waiting: SyncMutex<Vec<Subscriber<S>>>,
    cleaning: AtomicBool,
    started: AtomicBool,
    pool: Arc<WorkerPool<S>>,
    metrics: Arc<dyn MetricsSink>,
}

impl<S> EventSource<S>
where
    S: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(
        topic: impl Into<String>,
        ingress_queue_size: usize,
        cleaning_interval: Duration,
        pool: Arc<WorkerPool<S>>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let (ingress_tx, ingress_rx) = mpsc::channel(ingress_queue_size);
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        Self {
            topic: topic.into(),
            cleaning_interval,
            ingress_tx,
            ingress_rx: AsyncMutex::new(Some(ingress_rx)),
            incoming_tx,
            incoming_rx: AsyncMutex::new(Some(incoming_rx)),
            subscribers: RwLock::new(Vec::new()),
            waiting: SyncMutex::new(Vec::new()),
            cleaning: AtomicBool::new(false),
            started: AtomicBool::new(false),
            pool,
            metrics,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of live (pre-compaction) subscribers. Includes entries not
    /// yet evicted by the cleaner even if already marked corrupt.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Best-effort enqueue of a publish payload. Suspends only when the
    /// ingress channel is full — the per-source backpressure point named
    /// in spec §5.
    pub async fn publish(&self, bytes: Vec<u8>) {
        if self.ingress_tx.send(bytes).await.is_err() {
            tracing::warn!(topic = %self.topic, "ingress channel closed, dropping publish");
        }
    }

    /// Admits a subscriber. Never suspends: the incoming channel is
    /// unbounded because admission is not the named backpressure
    /// mechanism (that's `publish`/the distribute worker queue).
    pub fn admit(&self, subscriber: Subscriber<S>) {
        if self.incoming_tx.send(subscriber).is_err() {
            tracing::warn!(topic = %self.topic, "incoming channel closed, dropping admission");
        }
    }

    /// Launches the distributor, admitter, and cleaner tasks. Idempotent:
    /// a second call finds `started` already set, logs, and returns an
    /// empty list of handles instead of spawning a duplicate set of tasks
    /// against receivers the first call already took ownership of.
    pub fn start(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        if self.started.swap(true, Ordering::AcqRel) {
            tracing::warn!(topic = %self.topic, "EventSource::start called more than once, ignoring");
            return Vec::new();
        }

        vec![
            tokio::spawn(Arc::clone(self).run_distributor()),
            tokio::spawn(Arc::clone(self).run_admitter()),
            tokio::spawn(Arc::clone(self).run_cleaner()),
        ]
    }

    async fn run_distributor(self: Arc<Self>) {
        let Some(mut rx) = self.ingress_rx.lock().await.take() else {
            return;
        };

        while let Some(bytes) = rx.recv().await {
            let event = Event::new(self.topic.clone(), bytes);
            let subscribers = self.subscribers.read().clone();

            let job = DistributeJob {
                topic: self.topic.clone(),
                event,
                subscribers,
                metrics: Arc::clone(&self.metrics),
            };

            if self.pool.submit_distribute(job).await.is_err() {
                tracing::warn!(topic = %self.topic, "distribute worker pool closed, stopping distributor");
                break;
            }
        }
    }

    async fn run_admitter(self: Arc<Self>) {
        let Some(mut rx) = self.incoming_rx.lock().await.take() else {
            return;
        };

        while let Some(subscriber) = rx.recv().await {
            if self.cleaning.load(Ordering::Acquire) {
                self.waiting.lock().push(subscriber);
            } else {
                self.subscribers.write().push(subscriber);
            }
        }
    }

    async fn run_cleaner(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.cleaning_interval);
        interval.tick().await; // first tick fires immediately; skip it

        loop {
            interval.tick().await;
            self.run_cleaning_pass();
        }
    }

    /// One cleaning pass, factored out so tests can drive it without
    /// waiting on the interval.
    fn run_cleaning_pass(&self) {
        self.cleaning.store(true, Ordering::Release);

        let evicted = {
            let mut subscribers = self.subscribers.write();
            let before = subscribers.len();
            subscribers.retain(|s| !s.is_corrupt());
            before - subscribers.len()
        };

        {
            let mut waiting = self.waiting.lock();
            let admitted = waiting.len();
            self.subscribers.write().append(&mut waiting);
            if admitted > 0 {
                tracing::debug!(topic = %self.topic, admitted, "cleaning pass admitted waiting subscribers");
            }
        }

        self.cleaning.store(false, Ordering::Release);

        if evicted > 0 {
            tracing::debug!(topic = %self.topic, evicted, "cleaning pass evicted corrupt subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{AtomicMetricsSink, NoopMetricsSink};
    use crate::util::ConnectionId;
    use crate::worker::WorkerPoolConfig;
    use std::time::Duration as StdDuration;

    fn pool() -> Arc<WorkerPool<Vec<u8>>> {
        Arc::new(WorkerPool::new(WorkerPoolConfig {
            distributor_concurrency: 1,
            distributor_queue_size: 8,
            acceptor_concurrency: 1,
            acceptor_queue_size: 1,
        }))
    }

    fn source(interval: Duration) -> Arc<EventSource<Vec<u8>>> {
        Arc::new(EventSource::new(
            "a",
            8,
            interval,
            pool(),
            Arc::new(NoopMetricsSink),
        ))
    }

    #[tokio::test]
    async fn admit_before_first_cleaning_pass_is_immediately_visible() {
        let source = source(Duration::from_secs(3600));
        let sub = Subscriber::new(ConnectionId::new(), Vec::new());
        source.admit(sub);

        // give the admitter task a chance to run
        tokio::time::sleep(StdDuration::from_millis(20)).await;
        assert_eq!(source.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn publish_delivers_exact_framed_event_to_subscriber() {
        let source = source(Duration::from_secs(3600));
        let _handles = source.start();

        let sub = Subscriber::new(ConnectionId::new(), Vec::new());
        let sub_for_read = sub.clone();
        source.admit(sub);
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        source.publish(vec![0x01]).await;
        tokio::time::sleep(StdDuration::from_millis(50)).await;

        let stream = sub_for_read.stream_for_test().lock().await;
        assert_eq!(stream.last(), Some(&crate::framing::DELIMITER));

        let record = &stream[..stream.len() - 1];
        let decoded = crate::framing::decode_event(record).unwrap();
        assert_eq!(decoded.topic, "a");
        assert_eq!(decoded.data, vec![0x01]);
    }

    #[tokio::test]
    async fn published_payloads_are_delivered_in_publish_order() {
        let source = source(Duration::from_secs(3600));
        let _handles = source.start();

        let sub = Subscriber::new(ConnectionId::new(), Vec::new());
        let sub_for_read = sub.clone();
        source.admit(sub);
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        for payload in [vec![0x01], vec![0x02], vec![0x03]] {
            source.publish(payload).await;
        }
        tokio::time::sleep(StdDuration::from_millis(100)).await;

        let stream = sub_for_read.stream_for_test().lock().await;
        let records: Vec<crate::framing::Event> = stream
            .split(|&b| b == crate::framing::DELIMITER)
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| crate::framing::decode_event(chunk).unwrap())
            .collect();

        let received: Vec<u8> = records.iter().map(|event| event.data[0]).collect();
        assert_eq!(received, vec![0x01, 0x02, 0x03]);
    }

    #[tokio::test]
    async fn start_called_twice_does_not_spawn_a_second_task_set() {
        let source = source(Duration::from_secs(3600));
        let first = source.start();
        assert_eq!(first.len(), 3);

        let second = source.start();
        assert!(second.is_empty());
    }

    #[test]
    fn cleaning_pass_evicts_corrupt_and_admits_waiting() {
        let source = Arc::new(EventSource::new(
            "a",
            8,
            Duration::from_secs(3600),
            pool(),
            Arc::new(AtomicMetricsSink::new()) as Arc<dyn MetricsSink>,
        ));

        let good = Subscriber::new(ConnectionId::new(), Vec::new());
        let bad = Subscriber::new(ConnectionId::new(), Vec::new());
        bad.mark_corrupt();

        source.subscribers.write().push(good.clone());
        source.subscribers.write().push(bad);

        let waiting_sub = Subscriber::new(ConnectionId::new(), Vec::new());
        source.waiting.lock().push(waiting_sub.clone());

        source.run_cleaning_pass();

        assert_eq!(source.subscriber_count(), 2);
        assert!(source.waiting.lock().is_empty());
    }

    #[tokio::test]
    async fn admitter_routes_to_waiting_while_cleaning_flag_is_set() {
        let source = source(Duration::from_secs(3600));
        let _handles = source.start();
        source.cleaning.store(true, Ordering::Release);

        let sub = Subscriber::new(ConnectionId::new(), Vec::new());
        source.admit(sub);
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        assert_eq!(source.subscriber_count(), 0);
        assert_eq!(source.waiting.lock().len(), 1);
    }
}
