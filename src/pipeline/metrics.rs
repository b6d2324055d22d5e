//! Ingestion counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by producers and the worker
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    rejected: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
    hits: AtomicU64,
}

impl PipelineMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// An event was queued
    pub fn increment_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// A queued event was discarded by overflow or shutdown
    pub fn add_dropped(&self, n: u64) {
        self.dropped.fetch_add(n, Ordering::Relaxed);
    }

    /// An event arrived after shutdown
    pub fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// An event was evaluated, producing `hits` hits
    pub fn record_processed(&self, hits: usize) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.hits.fetch_add(hits as u64, Ordering::Relaxed);
    }

    /// Evaluating an event panicked
    pub fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self, queue_depth: usize) -> PipelineMetricsSnapshot {
        PipelineMetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            queue_depth,
        }
    }
}

/// Copy of [`PipelineMetrics`] at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetricsSnapshot {
    /// Events accepted into the queue
    pub enqueued: u64,
    /// Queued events discarded before evaluation
    pub dropped: u64,
    /// Events refused because the pipeline was shut down
    pub rejected: u64,
    /// Events evaluated
    pub processed: u64,
    /// Events whose evaluation panicked
    pub failed: u64,
    /// Hits recorded
    pub hits: u64,
    /// Events waiting in the queue
    pub queue_depth: usize,
}
