//! Ingestion pipeline configuration

use serde::{Deserialize, Serialize};

/// Default number of events buffered between producers and the worker
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Default name of the worker thread
pub const DEFAULT_WORKER_NAME: &str = "interceptor-ingest";

/// Configuration for the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum queued events; beyond it the oldest queued event is dropped
    pub queue_capacity: usize,
    /// Name given to the worker thread
    pub worker_name: String,
    /// Process events still queued at shutdown instead of discarding them
    pub drain_on_shutdown: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
            drain_on_shutdown: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline config builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be greater than 0".to_string());
        }

        if self.worker_name.trim().is_empty() {
            return Err("Worker name cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Builder for [`PipelineConfig`]
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Set the queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Set the worker thread name
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.config.worker_name = name.into();
        self
    }

    /// Choose whether queued events are processed at shutdown
    pub fn drain_on_shutdown(mut self, drain: bool) -> Self {
        self.config.drain_on_shutdown = drain;
        self
    }

    /// Build the pipeline configuration
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.drain_on_shutdown);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_and_validation() {
        let config = PipelineConfig::builder().queue_capacity(0).worker_name("w").build();
        assert_eq!(config.validate().unwrap_err(), "Queue capacity must be greater than 0");

        let config = PipelineConfig::builder().worker_name(" ").build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: PipelineConfig = serde_yaml::from_str("queue_capacity: 16\n").unwrap();
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.worker_name, DEFAULT_WORKER_NAME);
    }
}
