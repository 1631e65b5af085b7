//! Narrow metrics interface.
//!
//! Per spec's Out-of-scope section the broker core never owns a metrics
//! backend; it only emits counter increments/decrements through this
//! trait. Compare to the teacher runtime's much richer generic
//! `Monitor<E>`/`MonitoringEvent` system, which records arbitrary typed
//! events with severities and snapshots — that breadth isn't needed here,
//! so the interface is trimmed down to exactly the six operations the
//! event-distribution pipeline calls.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

// Layer 2: Third-party crate imports
use dashmap::DashMap;

/// Sink for the broker's per-topic counters and gauges.
///
/// Implementations must be cheap to call from the hot distribute path;
/// [`NoopMetricsSink`] compiles away entirely and [`AtomicMetricsSink`]
/// uses lock-free atomics.
pub trait MetricsSink: Send + Sync {
    /// A publish was enqueued for `topic` (pending-event gauge += 1).
    fn inc_pending(&self, topic: &str);

    /// A distribute job for `topic` finished (pending-event gauge -= 1).
    fn dec_pending(&self, topic: &str);

    /// A subscriber was admitted to `topic` (subscriber gauge += 1).
    fn inc_subscriber(&self, topic: &str);

    /// A subscriber was evicted from `topic` (subscriber gauge -= 1).
    fn dec_subscriber(&self, topic: &str);

    /// A distribute job for `topic` ran (monotonic counter += 1).
    fn inc_distributed(&self, topic: &str);
}

/// Zero-overhead metrics sink, used when no observability backend is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    #[inline(always)]
    fn inc_pending(&self, _topic: &str) {}

    #[inline(always)]
    fn dec_pending(&self, _topic: &str) {}

    #[inline(always)]
    fn inc_subscriber(&self, _topic: &str) {}

    #[inline(always)]
    fn dec_subscriber(&self, _topic: &str) {}

    #[inline(always)]
    fn inc_distributed(&self, _topic: &str) {}
}

/// In-process, lock-free metrics sink keyed by topic. Useful for tests
/// and for hosts that want to poll counters without wiring up a real
/// metrics exporter.
#[derive(Debug, Default)]
pub struct AtomicMetricsSink {
    pending: DashMap<String, AtomicI64>,
    subscribers: DashMap<String, AtomicI64>,
    distributed: DashMap<String, AtomicI64>,
}

impl AtomicMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(map: &DashMap<String, AtomicI64>, topic: &str, delta: i64) {
        map.entry(topic.to_string())
            .or_insert_with(|| AtomicI64::new(0))
            .fetch_add(delta, Ordering::Relaxed);
    }

    pub fn pending(&self, topic: &str) -> i64 {
        self.pending
            .get(topic)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn subscribers(&self, topic: &str) -> i64 {
        self.subscribers
            .get(topic)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn distributed(&self, topic: &str) -> i64 {
        self.distributed
            .get(topic)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Snapshot all distributed counters, keyed by topic. Intended for
    /// exposing over whatever out-of-band surface the host chooses.
    pub fn snapshot_distributed(&self) -> HashMap<String, i64> {
        self.distributed
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect()
    }
}

impl MetricsSink for AtomicMetricsSink {
    fn inc_pending(&self, topic: &str) {
        Self::bump(&self.pending, topic, 1);
    }

    fn dec_pending(&self, topic: &str) {
        Self::bump(&self.pending, topic, -1);
    }

    fn inc_subscriber(&self, topic: &str) {
        Self::bump(&self.subscribers, topic, 1);
    }

    fn dec_subscriber(&self, topic: &str) {
        Self::bump(&self.subscribers, topic, -1);
    }

    fn inc_distributed(&self, topic: &str) {
        Self::bump(&self.distributed, topic, 1);
    }
}
