//! Asynchronous event ingestion
//!
//! Producers hand events to [`IngestionPipeline::ingest_event`], which only
//! enqueues and returns. A single named worker thread dequeues events in
//! arrival order and hands each to an [`EventProcessor`]. A panic while
//! processing one event is logged and counted; the worker carries on with
//! the next one.

pub mod config;
pub mod metrics;
pub mod processor;
pub mod queue;
pub mod shutdown;

pub use config::{
    PipelineConfig, PipelineConfigBuilder, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_NAME,
};
pub use metrics::{PipelineMetrics, PipelineMetricsSnapshot};
pub use processor::{EventProcessor, InterceptorMatcher};
pub use queue::{DropOldestQueue, PushOutcome};
pub use shutdown::ShutdownState;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{InterceptorError, Result};
use crate::event::{ChatEvent, InterceptorEventType};

/// Single-worker ingestion pipeline
pub struct IngestionPipeline {
    config: PipelineConfig,
    queue: Arc<DropOldestQueue<ChatEvent>>,
    metrics: Arc<PipelineMetrics>,
    shutdown: ShutdownState,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("config", &self.config)
            .field("queue_depth", &self.queue.len())
            .field("shutting_down", &self.shutdown.is_shutting_down())
            .finish()
    }
}

impl IngestionPipeline {
    /// Validate the config and spawn the worker thread
    pub fn start(config: PipelineConfig, processor: Arc<dyn EventProcessor>) -> Result<Self> {
        config.validate().map_err(InterceptorError::InvalidConfiguration)?;

        let queue = Arc::new(DropOldestQueue::new(config.queue_capacity));
        let metrics = Arc::new(PipelineMetrics::new());

        let worker = {
            let queue = queue.clone();
            let metrics = metrics.clone();
            thread::Builder::new()
                .name(config.worker_name.clone())
                .spawn(move || run_worker(&queue, processor.as_ref(), &metrics))?
        };

        info!(
            worker = %config.worker_name,
            queue_capacity = config.queue_capacity,
            "Ingestion pipeline started"
        );

        Ok(Self {
            config,
            queue,
            metrics,
            shutdown: ShutdownState::new(),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Build an event from its parts and enqueue it without blocking
    ///
    /// Identifiers are trimmed; the text is kept verbatim. After shutdown
    /// the event is discarded and counted as rejected.
    pub fn ingest_event(
        &self,
        server_id: &str,
        channel: &str,
        from_nick: &str,
        from_hostmask: &str,
        text: &str,
        event_type: InterceptorEventType,
    ) {
        let event = ChatEvent::new(server_id, channel, from_nick, from_hostmask, text, event_type);
        if let Err(e) = self.submit(event) {
            debug!(error = %e, "Event discarded");
        }
    }

    /// Enqueue a prepared event without blocking
    ///
    /// Fails with [`InterceptorError::PipelineClosed`] after shutdown.
    pub fn submit(&self, event: ChatEvent) -> Result<()> {
        match self.queue.push(event) {
            PushOutcome::Accepted => {
                self.metrics.increment_enqueued();
                Ok(())
            }
            PushOutcome::DroppedOldest => {
                self.metrics.increment_enqueued();
                self.metrics.add_dropped(1);
                warn!(
                    capacity = self.queue.capacity(),
                    "Ingestion queue full; dropped oldest event"
                );
                Ok(())
            }
            PushOutcome::Closed => {
                self.metrics.increment_rejected();
                Err(InterceptorError::PipelineClosed)
            }
        }
    }

    /// Wait until every queued event has been processed; `false` on timeout
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.queue.wait_idle(timeout)
    }

    /// Stop accepting events and join the worker
    ///
    /// Queued events are processed first when `drain_on_shutdown` is set.
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        if !self.shutdown.begin_shutdown() {
            return;
        }

        let discarded = self.queue.close(self.config.drain_on_shutdown);
        if discarded > 0 {
            self.metrics.add_dropped(discarded as u64);
            warn!(discarded, "Discarded queued events at shutdown");
        }

        let worker = self.worker.lock().take();
        if let Some(handle) = worker {
            if handle.thread().id() == thread::current().id() {
                // Called from the worker itself; it exits once the queue drains
                warn!("Shutdown requested from the ingestion worker; not joining");
            } else if handle.join().is_err() {
                error!("Ingestion worker terminated abnormally");
            }
        }

        self.shutdown.complete_shutdown();
    }

    /// Whether events are still accepted
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_shutting_down()
    }

    /// Events waiting for the worker
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Current counters
    pub fn metrics(&self) -> PipelineMetricsSnapshot {
        self.metrics.snapshot(self.queue.len())
    }

    /// Configuration the pipeline was started with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(
    queue: &DropOldestQueue<ChatEvent>,
    processor: &dyn EventProcessor,
    metrics: &PipelineMetrics,
) {
    debug!(processor = processor.name(), "Ingestion worker running");
    while let Some(event) = queue.pop_blocking() {
        match panic::catch_unwind(AssertUnwindSafe(|| processor.process(&event))) {
            Ok(hits) => metrics.record_processed(hits),
            Err(_) => {
                metrics.increment_failed();
                error!(
                    processor = processor.name(),
                    server_id = %event.server_id,
                    channel = %event.channel,
                    "Event processing panicked; continuing with next event"
                );
            }
        }
        queue.task_done();
    }
    debug!("Ingestion worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    #[derive(Default)]
    struct Recorder {
        seen: PlMutex<Vec<String>>,
    }

    impl EventProcessor for Recorder {
        fn process(&self, event: &ChatEvent) -> usize {
            if event.text == "boom" {
                panic!("processor failure");
            }
            self.seen.lock().push(event.text.clone());
            1
        }
    }

    fn ingest(pipeline: &IngestionPipeline, text: &str) {
        pipeline.ingest_event(
            "srv",
            "#one",
            "alice",
            "alice!i@h",
            text,
            InterceptorEventType::Message,
        );
    }

    #[test]
    fn test_events_processed_in_order() {
        let recorder = Arc::new(Recorder::default());
        let pipeline =
            IngestionPipeline::start(PipelineConfig::default(), recorder.clone()).unwrap();
        for i in 0..50 {
            ingest(&pipeline, &format!("{}", i));
        }
        assert!(pipeline.wait_idle(Duration::from_secs(5)));

        let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        assert_eq!(*recorder.seen.lock(), expected);
        assert_eq!(pipeline.metrics().processed, 50);
        assert_eq!(pipeline.metrics().hits, 50);
    }

    #[test]
    fn test_panic_does_not_stop_worker() {
        let recorder = Arc::new(Recorder::default());
        let pipeline =
            IngestionPipeline::start(PipelineConfig::default(), recorder.clone()).unwrap();
        ingest(&pipeline, "before");
        ingest(&pipeline, "boom");
        ingest(&pipeline, "after");
        assert!(pipeline.wait_idle(Duration::from_secs(5)));

        assert_eq!(*recorder.seen.lock(), vec!["before", "after"]);
        let metrics = pipeline.metrics();
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.processed, 2);
    }

    #[test]
    fn test_shutdown_drains_and_rejects_later_events() {
        let recorder = Arc::new(Recorder::default());
        let pipeline =
            IngestionPipeline::start(PipelineConfig::default(), recorder.clone()).unwrap();
        for i in 0..10 {
            ingest(&pipeline, &format!("{}", i));
        }
        pipeline.shutdown();
        assert_eq!(recorder.seen.lock().len(), 10);
        assert!(!pipeline.is_running());

        ingest(&pipeline, "late");
        assert!(matches!(
            pipeline.submit(ChatEvent::new("s", "c", "n", "h", "t", InterceptorEventType::Message)),
            Err(InterceptorError::PipelineClosed)
        ));
        assert_eq!(pipeline.metrics().rejected, 2);

        pipeline.shutdown();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig::builder().queue_capacity(0).build();
        let err = IngestionPipeline::start(config, Arc::new(Recorder::default())).unwrap_err();
        assert!(matches!(err, InterceptorError::InvalidConfiguration(_)));
    }
}
