//! Engine-wide configuration and builder

use serde::{Deserialize, Serialize};

use crate::bus::DEFAULT_CHANGE_BUS_CAPACITY;
use crate::error::{InterceptorError, Result};
use crate::history::DEFAULT_HIT_HISTORY_CAPACITY;
use crate::pipeline::PipelineConfig;
use crate::service::InterceptorEngine;

/// Configuration for an [`InterceptorEngine`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ingestion queue and worker settings
    pub pipeline: PipelineConfig,
    /// Hits retained per interceptor
    pub hit_history_capacity: usize,
    /// Undelivered change signals buffered per subscriber
    pub change_bus_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            hit_history_capacity: DEFAULT_HIT_HISTORY_CAPACITY,
            change_bus_capacity: DEFAULT_CHANGE_BUS_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml(data: &[u8]) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate().map_err(InterceptorError::InvalidConfiguration)?;

        if self.hit_history_capacity == 0 {
            return Err(InterceptorError::InvalidConfiguration(
                "Hit history capacity must be greater than 0".to_string(),
            ));
        }

        if self.change_bus_capacity == 0 {
            return Err(InterceptorError::InvalidConfiguration(
                "Change bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for configuring the interceptor engine
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
}

impl EngineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the ingestion queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.pipeline.queue_capacity = capacity;
        self
    }

    /// Set the worker thread name
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.config.pipeline.worker_name = name.into();
        self
    }

    /// Choose whether queued events are processed at shutdown
    pub fn drain_on_shutdown(mut self, drain: bool) -> Self {
        self.config.pipeline.drain_on_shutdown = drain;
        self
    }

    /// Set the number of hits retained per interceptor
    pub fn hit_history_capacity(mut self, capacity: usize) -> Self {
        self.config.hit_history_capacity = capacity;
        self
    }

    /// Set the change bus buffer per subscriber
    pub fn change_bus_capacity(mut self, capacity: usize) -> Self {
        self.config.change_bus_capacity = capacity;
        self
    }

    /// Configuration built so far
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the engine and start its ingestion worker
    pub fn build(self) -> Result<InterceptorEngine> {
        InterceptorEngine::new(self.config)
    }
}
