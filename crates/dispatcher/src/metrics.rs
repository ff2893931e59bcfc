//! Per-sink delivery counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Snapshots waiting in the queue
    queue_len: AtomicUsize,
    /// Successful deliveries
    delivered_count: AtomicU64,
    /// Failed deliveries
    failure_count: AtomicU64,
    /// Snapshots dropped because the queue was full
    dropped_count: AtomicU64,
    /// Sum of delivery durations, in microseconds
    delivery_micros: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    pub fn inc_delivered_count(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record how long one delivery attempt took
    pub fn add_delivery_time(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.delivery_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let delivered = self.delivered_count();
        let failed = self.failure_count();
        let attempts = delivered + failed;
        let avg_delivery_ms = if attempts == 0 {
            0.0
        } else {
            self.delivery_micros.load(Ordering::Relaxed) as f64 / attempts as f64 / 1000.0
        };

        MetricsSnapshot {
            queue_len: self.queue_len(),
            delivered_count: delivered,
            failure_count: failed,
            dropped_count: self.dropped_count(),
            avg_delivery_ms,
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub delivered_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub avg_delivery_ms: f64,
}
