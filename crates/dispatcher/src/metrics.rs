//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Lines fully written
    delivered_count: AtomicU64,
    /// Publishes overwritten before this sink read them
    skipped_count: AtomicU64,
    /// Writes that did not complete
    failure_count: AtomicU64,
    /// Connections accepted (network only)
    accepted_count: AtomicU64,
    /// Connections refused because the pool was full
    rejected_count: AtomicU64,
    /// Writer tasks currently alive
    active_connections: AtomicUsize,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    pub fn inc_delivered_count(&self) {
        self.delivered_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped_count.load(Ordering::Relaxed)
    }

    pub fn add_skipped_count(&self, skipped: u64) {
        self.skipped_count.fetch_add(skipped, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }

    pub fn inc_accepted_count(&self) {
        self.accepted_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    pub fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Count a new writer task, returning the new total
    pub fn inc_active_connections(&self) -> usize {
        self.active_connections.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count a finished writer task, returning the new total
    pub fn dec_active_connections(&self) -> usize {
        self.active_connections
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            delivered_count: self.delivered_count(),
            skipped_count: self.skipped_count(),
            failure_count: self.failure_count(),
            accepted_count: self.accepted_count(),
            rejected_count: self.rejected_count(),
            active_connections: self.active_connections(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub delivered_count: u64,
    pub skipped_count: u64,
    pub failure_count: u64,
    pub accepted_count: u64,
    pub rejected_count: u64,
    pub active_connections: usize,
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "delivered={}, skipped={}, failures={}",
            self.delivered_count, self.skipped_count, self.failure_count
        )?;
        if self.accepted_count > 0 || self.rejected_count > 0 {
            write!(
                f,
                ", connections accepted={} rejected={}",
                self.accepted_count, self.rejected_count
            )?;
        }
        Ok(())
    }
}
