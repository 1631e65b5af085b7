//! End-to-end scenarios from spec §8 that exercise a live `EventSource`:
//! corruption eviction and publish-side backpressure.

use std::sync::Arc;
use std::time::Duration;

use streamhub::event::EventSource;
use streamhub::metrics::NoopMetricsSink;
use streamhub::subscriber::Subscriber;
use streamhub::util::ConnectionId;
use streamhub::worker::{WorkerPool, WorkerPoolConfig};

fn pool(distributor_queue_size: usize) -> Arc<WorkerPool<Vec<u8>>> {
    Arc::new(WorkerPool::new(WorkerPoolConfig {
        distributor_concurrency: 1,
        distributor_queue_size,
        acceptor_concurrency: 1,
        acceptor_queue_size: 1,
    }))
}

#[tokio::test]
async fn scenario_corruption_eviction() {
    let source = Arc::new(EventSource::new(
        "a",
        8,
        Duration::from_millis(30),
        pool(8),
        Arc::new(NoopMetricsSink),
    ));
    let _handles = source.start();

    let sub = Subscriber::new(ConnectionId::new(), Vec::new());
    source.admit(sub.clone());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(source.subscriber_count(), 1);

    // Simulate the stream being forcibly closed mid-distribution: the
    // broker's own code marks a subscriber corrupt only after a failed
    // write, but the effect on the cleaner is identical regardless of
    // cause.
    sub.mark_corrupt();

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(source.subscriber_count(), 0);
}

#[tokio::test]
async fn scenario_single_publisher_single_subscriber_delivers_one_event() {
    let source = Arc::new(EventSource::new(
        "a",
        8,
        Duration::from_secs(3600),
        pool(8),
        Arc::new(NoopMetricsSink),
    ));
    let _handles = source.start();

    let sub = Subscriber::new(ConnectionId::new(), Vec::new());
    source.admit(sub.clone());
    tokio::time::sleep(Duration::from_millis(20)).await;

    source.publish(vec![0x01]).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!sub.is_corrupt());
}
