//! The interceptor engine facade
//!
//! [`InterceptorEngine`] owns every piece of state (definitions, hit
//! histories, change bus, ingestion worker) and is the only type external
//! collaborators need. Several engines can coexist in one process.

pub mod config;

pub use config::{EngineBuilder, EngineConfig};

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::bus::{ChangeBus, ChangeKind, ChangeSubscription, InterceptorChange};
use crate::error::{ErrorContext, Result};
use crate::event::{ChatEvent, InterceptorEventType};
use crate::history::HitHistory;
use crate::pipeline::{IngestionPipeline, InterceptorMatcher, PipelineMetricsSnapshot};
use crate::result::InterceptorHit;
use crate::rule::{CompiledInterceptor, InterceptorDefinition};
use crate::ruleset::DefinitionRegistry;

/// Interceptor definitions, their hits, and the worker that produces them
#[derive(Debug)]
pub struct InterceptorEngine {
    config: EngineConfig,
    registry: Arc<DefinitionRegistry>,
    history: Arc<HitHistory>,
    bus: Arc<ChangeBus>,
    pipeline: IngestionPipeline,
}

impl InterceptorEngine {
    /// Create an engine and start its ingestion worker
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(DefinitionRegistry::new());
        let history = Arc::new(HitHistory::new(config.hit_history_capacity));
        let bus = Arc::new(ChangeBus::new(config.change_bus_capacity));

        let matcher = InterceptorMatcher::new(registry.clone(), history.clone(), bus.clone());
        let pipeline = IngestionPipeline::start(config.pipeline.clone(), Arc::new(matcher))?;

        info!(
            hit_history_capacity = config.hit_history_capacity,
            change_bus_capacity = config.change_bus_capacity,
            "Interceptor engine started"
        );

        Ok(Self {
            config,
            registry,
            history,
            bus,
            pipeline,
        })
    }

    /// Create a new engine builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Definitions

    /// Create an enabled, rule-less definition; blank owner means any server
    pub fn create_interceptor(
        &self,
        owner_server_id: &str,
        requested_name: &str,
    ) -> InterceptorDefinition {
        let definition = self.registry.create_interceptor(owner_server_id, requested_name);
        self.notify(owner_server_id, &definition.id, ChangeKind::Created);
        definition
    }

    /// Replace a definition's mutable fields
    ///
    /// `Ok(false)` when the owner has no such definition; an error when a
    /// pattern or rule fails validation, in which case nothing changes.
    pub fn save_interceptor(
        &self,
        owner_server_id: &str,
        definition: InterceptorDefinition,
    ) -> Result<bool> {
        let interceptor_id = definition.id.clone();
        let saved = self.registry.save_interceptor(owner_server_id, definition)?;
        if saved {
            self.notify(owner_server_id, &interceptor_id, ChangeKind::Updated);
        }
        Ok(saved)
    }

    /// Rename a definition; collisions are suffixed as on creation
    pub fn rename_interceptor(
        &self,
        owner_server_id: &str,
        interceptor_id: &str,
        new_name: &str,
    ) -> bool {
        let renamed = self.registry.rename_interceptor(owner_server_id, interceptor_id, new_name);
        if renamed {
            self.notify(owner_server_id, interceptor_id, ChangeKind::Updated);
        }
        renamed
    }

    /// Enable or disable a definition
    pub fn set_interceptor_enabled(
        &self,
        owner_server_id: &str,
        interceptor_id: &str,
        enabled: bool,
    ) -> bool {
        let updated = self
            .registry
            .set_interceptor_enabled(owner_server_id, interceptor_id, enabled);
        if updated {
            self.notify(owner_server_id, interceptor_id, ChangeKind::Updated);
        }
        updated
    }

    /// Remove a definition together with its hit history
    pub fn remove_interceptor(&self, owner_server_id: &str, interceptor_id: &str) -> bool {
        let removed = self.registry.remove_interceptor(owner_server_id, interceptor_id);
        if removed {
            self.history.remove(owner_server_id, interceptor_id);
            self.notify(owner_server_id, interceptor_id, ChangeKind::Removed);
        }
        removed
    }

    /// Create and save a batch of externally stored definitions
    ///
    /// Every definition is validated before any is created, so an invalid
    /// entry leaves the engine unchanged. Ids are regenerated; the returned
    /// definitions carry the ids and resolved names actually stored.
    pub fn import_definitions(
        &self,
        definitions: Vec<InterceptorDefinition>,
    ) -> Result<Vec<InterceptorDefinition>> {
        for definition in &definitions {
            CompiledInterceptor::compile(definition.clone())
                .with_context(|| format!("interceptor '{}'", definition.name))?;
        }

        let mut imported = Vec::with_capacity(definitions.len());
        for mut definition in definitions {
            let owner = definition.server_id.clone();
            let created = self.create_interceptor(&owner, &definition.name);
            definition.id = created.id.clone();
            definition.name = created.name;
            self.save_interceptor(&owner, definition)?;
            if let Some(stored) = self.registry.interceptor(&owner, &created.id) {
                imported.push(stored);
            }
        }
        debug!(count = imported.len(), "Definitions imported");
        Ok(imported)
    }

    /// Current display name
    pub fn interceptor_name(&self, owner_server_id: &str, interceptor_id: &str) -> Option<String> {
        self.registry.interceptor_name(owner_server_id, interceptor_id)
    }

    /// Current definition
    pub fn interceptor(
        &self,
        owner_server_id: &str,
        interceptor_id: &str,
    ) -> Option<InterceptorDefinition> {
        self.registry.interceptor(owner_server_id, interceptor_id)
    }

    /// Definitions of one owner, in creation order
    pub fn list_definitions(&self, owner_server_id: &str) -> Vec<InterceptorDefinition> {
        self.registry.list_definitions(owner_server_id)
    }

    /// Definitions across all owners
    pub fn list_all_definitions(&self) -> Vec<InterceptorDefinition> {
        self.registry.list_all_definitions()
    }

    // Hits

    /// Up to `limit` most recent hits, newest first
    pub fn list_hits(
        &self,
        owner_server_id: &str,
        interceptor_id: &str,
        limit: usize,
    ) -> Vec<InterceptorHit> {
        self.history.list_hits(owner_server_id, interceptor_id, limit)
    }

    /// Drop an interceptor's hits and reset its total
    pub fn clear_hits(&self, owner_server_id: &str, interceptor_id: &str) -> bool {
        let cleared = self.history.clear_hits(owner_server_id, interceptor_id);
        if self.registry.contains(owner_server_id, interceptor_id) {
            self.notify(owner_server_id, interceptor_id, ChangeKind::HitsCleared);
        }
        cleared
    }

    /// Hits recorded since creation or the last clear, including evicted ones
    pub fn total_hit_count(&self, owner_server_id: &str, interceptor_id: &str) -> u64 {
        self.history.total_hit_count(owner_server_id, interceptor_id)
    }

    /// Subscribe to change signals published from now on
    pub fn changes(&self) -> ChangeSubscription {
        self.bus.subscribe()
    }

    // Ingestion

    /// Queue an event for matching; never blocks
    pub fn ingest_event(
        &self,
        server_id: &str,
        channel: &str,
        from_nick: &str,
        from_hostmask: &str,
        text: &str,
        event_type: InterceptorEventType,
    ) {
        self.pipeline
            .ingest_event(server_id, channel, from_nick, from_hostmask, text, event_type);
    }

    /// Queue a prepared event; fails once the engine is shut down
    pub fn submit(&self, event: ChatEvent) -> Result<()> {
        self.pipeline.submit(event)
    }

    /// Wait until all queued events are matched; `false` on timeout
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.pipeline.wait_idle(timeout)
    }

    /// Ingestion counters
    pub fn metrics(&self) -> PipelineMetricsSnapshot {
        self.pipeline.metrics()
    }

    /// Stop ingesting and join the worker; idempotent, also run on drop
    pub fn shutdown(&self) {
        self.pipeline.shutdown();
    }

    fn notify(&self, owner_server_id: &str, interceptor_id: &str, kind: ChangeKind) {
        self.bus
            .publish(InterceptorChange::new(owner_server_id, interceptor_id, kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::InterceptorRule;

    fn engine() -> InterceptorEngine {
        InterceptorEngine::builder().hit_history_capacity(3).build().unwrap()
    }

    fn ingest(engine: &InterceptorEngine, text: &str) {
        engine.ingest_event(
            "srv",
            "#one",
            "alice",
            "alice!i@h",
            text,
            InterceptorEventType::Message,
        );
    }

    #[test]
    fn test_mutations_publish_changes() {
        let engine = engine();
        let mut sub = engine.changes();

        let def = engine.create_interceptor("srv", "Watcher");
        let edited = def.clone().with_rule(InterceptorRule::new("all"));
        assert!(engine.save_interceptor("srv", edited).unwrap());
        assert!(!engine.save_interceptor("other", def.clone()).unwrap());
        assert!(engine.rename_interceptor("srv", &def.id, "Spotter"));
        assert!(engine.set_interceptor_enabled("srv", &def.id, false));
        assert!(engine.remove_interceptor("srv", &def.id));
        assert!(!engine.remove_interceptor("srv", &def.id));

        let kinds: Vec<_> = sub.drain().into_iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Created,
                ChangeKind::Updated,
                ChangeKind::Updated,
                ChangeKind::Updated,
                ChangeKind::Removed,
            ]
        );
    }

    #[test]
    fn test_history_is_bounded_but_total_is_cumulative() {
        let engine = engine();
        let mut def = engine.create_interceptor("srv", "Watcher");
        def.rules.push(InterceptorRule::new("all"));
        assert!(engine.save_interceptor("srv", def.clone()).unwrap());

        for i in 0..5 {
            ingest(&engine, &format!("m{}", i));
        }
        assert!(engine.wait_idle(Duration::from_secs(5)));

        let texts: Vec<_> = engine
            .list_hits("srv", &def.id, 10)
            .into_iter()
            .map(|h| h.text)
            .collect();
        assert_eq!(texts, vec!["m4", "m3", "m2"]);
        assert_eq!(engine.total_hit_count("srv", &def.id), 5);
        assert!(engine.list_hits("srv", &def.id, 0).is_empty());
    }

    #[test]
    fn test_remove_drops_history() {
        let engine = engine();
        let mut def = engine.create_interceptor("srv", "Watcher");
        def.rules.push(InterceptorRule::new("all"));
        engine.save_interceptor("srv", def.clone()).unwrap();
        ingest(&engine, "hello");
        assert!(engine.wait_idle(Duration::from_secs(5)));
        assert_eq!(engine.total_hit_count("srv", &def.id), 1);

        assert!(engine.remove_interceptor("srv", &def.id));
        assert_eq!(engine.total_hit_count("srv", &def.id), 0);
        assert!(engine.list_hits("srv", &def.id, 10).is_empty());
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let engine = engine();
        let good = InterceptorDefinition::new("ignored", "srv", "Good")
            .with_rule(InterceptorRule::new("r"));
        let bad = InterceptorDefinition::new("ignored", "srv", "Bad").with_rule(
            InterceptorRule::new("r").with_message(crate::pattern::MatchMode::Regex, "(unclosed"),
        );

        let err = engine.import_definitions(vec![good.clone(), bad]).unwrap_err();
        assert!(err.to_string().contains("interceptor 'Bad'"));
        assert!(engine.list_all_definitions().is_empty());

        let imported = engine.import_definitions(vec![good.clone(), good]).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[1].name, "Good (2)");
        assert_ne!(imported[0].id, "ignored");
        assert_eq!(imported[0].rules.len(), 1);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let engine = engine();
        engine.shutdown();
        engine.shutdown();
        ingest(&engine, "late");
        assert_eq!(engine.metrics().rejected, 1);
    }
}
