//! Shutdown bookkeeping for the ingestion pipeline

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::info;

/// Tracks whether shutdown has begun and how long it took
#[derive(Debug, Default)]
pub struct ShutdownState {
    shutting_down: AtomicBool,
    shutdown_complete: AtomicBool,
    shutdown_start: Mutex<Option<Instant>>,
}

impl ShutdownState {
    /// Create a new shutdown state
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin shutting down; only the first caller gets `true`
    pub fn begin_shutdown(&self) -> bool {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return false;
        }
        *self.shutdown_start.lock() = Some(Instant::now());
        info!("Shutdown initiated");
        true
    }

    /// Check if shutdown is in progress or done
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Mark shutdown as finished
    pub fn complete_shutdown(&self) {
        self.shutdown_complete.store(true, Ordering::Release);
        if let Some(duration) = self.shutdown_duration() {
            info!("Shutdown completed in {:?}", duration);
        }
    }

    /// Check if shutdown is complete
    pub fn is_shutdown_complete(&self) -> bool {
        self.shutdown_complete.load(Ordering::Acquire)
    }

    /// Time since shutdown began
    pub fn shutdown_duration(&self) -> Option<Duration> {
        self.shutdown_start.lock().map(|start| start.elapsed())
    }
}
