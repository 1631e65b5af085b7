//! The worker pool: two named worker groups with bounded queues.
//!
//! `Distribute` runs [`super::job::DistributeJob`]s with a fixed number
//! of concurrent workers pulling from one bounded queue; submissions
//! block the caller when the queue is full, which is the broker's
//! dominant backpressure mechanism. `Accept` is not a job queue in the
//! same sense — spec §4.3 describes it as N long-lived acceptor loops —
//! so only its concurrency/queue-size configuration lives here;
//! [`crate::server::BrokerServer`] owns the actual acceptor tasks.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use thiserror::Error;
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use super::job::DistributeJob;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolConfig {
    pub distributor_concurrency: usize,
    pub distributor_queue_size: usize,
    pub acceptor_concurrency: usize,
    pub acceptor_queue_size: usize,
}

#[derive(Debug, Error)]
pub enum WorkerPoolError {
    #[error("distribute worker pool is closed")]
    Closed,
}

type DistributeItem<S> = (DistributeJob<S>, oneshot::Sender<()>);

/// Owns the bounded distribute queue and its fixed-size worker group.
pub struct WorkerPool<S> {
    distribute_tx: mpsc::Sender<DistributeItem<S>>,
    distribute_workers: Vec<JoinHandle<()>>,
    acceptor_concurrency: usize,
    acceptor_queue_size: usize,
}

impl<S> WorkerPool<S>
where
    S: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(config: WorkerPoolConfig) -> Self {
        let (tx, rx) = mpsc::channel::<DistributeItem<S>>(config.distributor_queue_size);
        let rx = Arc::new(AsyncMutex::new(rx));

        let distribute_workers = (0..config.distributor_concurrency)
            .map(|_| {
                let rx = Arc::clone(&rx);
                tokio::spawn(async move {
                    loop {
                        let next = {
                            let mut guard = rx.lock().await;
                            guard.recv().await
                        };

                        match next {
                            Some((job, done)) => {
                                job.run().await;
                                let _ = done.send(());
                            }
                            None => break,
                        }
                    }
                })
            })
            .collect();

        Self {
            distribute_tx: tx,
            distribute_workers,
            acceptor_concurrency: config.acceptor_concurrency,
            acceptor_queue_size: config.acceptor_queue_size,
        }
    }

    /// Submits a job and waits for it to complete.
    ///
    /// Waiting for completion (rather than fire-and-forget) is what
    /// gives a single event source's distributor task per-source FIFO
    /// ordering even when `distributor_concurrency > 1`: the distributor
    /// never submits its next job until the previous one has finished,
    /// so two jobs from the same source can never run concurrently on
    /// two different workers. Jobs from *different* sources are free to
    /// run in parallel across the worker group.
    pub async fn submit_distribute(&self, job: DistributeJob<S>) -> Result<(), WorkerPoolError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.distribute_tx
            .send((job, done_tx))
            .await
            .map_err(|_| WorkerPoolError::Closed)?;
        done_rx.await.map_err(|_| WorkerPoolError::Closed)
    }

    pub fn acceptor_concurrency(&self) -> usize {
        self.acceptor_concurrency
    }

    pub fn acceptor_queue_size(&self) -> usize {
        self.acceptor_queue_size
    }
}

impl<S> Drop for WorkerPool<S> {
    fn drop(&mut self) {
        for worker in &self.distribute_workers {
            worker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::Event;
    use crate::metrics::{AtomicMetricsSink, MetricsSink};
    use crate::subscriber::Subscriber;
    use crate::util::ConnectionId;
    use std::sync::Arc;

    fn config() -> WorkerPoolConfig {
        WorkerPoolConfig {
            distributor_concurrency: 2,
            distributor_queue_size: 4,
            acceptor_concurrency: 1,
            acceptor_queue_size: 1,
        }
    }

    #[tokio::test]
    async fn submit_distribute_runs_job_to_completion() {
        let pool: WorkerPool<Vec<u8>> = WorkerPool::new(config());
        let metrics: Arc<dyn MetricsSink> = Arc::new(AtomicMetricsSink::new());
        let sub = Subscriber::new(ConnectionId::new(), Vec::new());

        let job = DistributeJob {
            topic: "a".to_string(),
            event: Event::new("a", vec![1]),
            subscribers: vec![sub],
            metrics,
        };

        pool.submit_distribute(job).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_submissions_from_different_sources_all_complete() {
        let pool: Arc<WorkerPool<Vec<u8>>> = Arc::new(WorkerPool::new(config()));
        let metrics = Arc::new(AtomicMetricsSink::new());

        let mut handles = Vec::new();
        for i in 0..5u64 {
            let pool = Arc::clone(&pool);
            let metrics: Arc<dyn MetricsSink> = metrics.clone();
            handles.push(tokio::spawn(async move {
                let sub = Subscriber::new(ConnectionId::new(), Vec::new());
                let job = DistributeJob {
                    topic: format!("topic-{i}"),
                    event: Event::new(format!("topic-{i}"), vec![i as u8]),
                    subscribers: vec![sub],
                    metrics,
                };
                pool.submit_distribute(job).await.unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..5u64 {
            assert_eq!(metrics.distributed(&format!("topic-{i}")), 1);
        }
    }
}
