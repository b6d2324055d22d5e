//! Event processors run by the ingestion worker

use std::sync::Arc;

use tracing::{debug, trace};

use crate::bus::{ChangeBus, ChangeKind, InterceptorChange};
use crate::event::ChatEvent;
use crate::history::HitHistory;
use crate::result::InterceptorHit;
use crate::rule::first_matching_rule;
use crate::ruleset::DefinitionRegistry;
use crate::scope::in_scope;

/// Handles one dequeued event at a time
///
/// Called only from the worker thread, in arrival order.
pub trait EventProcessor: Send + Sync + 'static {
    /// Evaluate an event; returns the number of hits it produced
    fn process(&self, event: &ChatEvent) -> usize;

    /// Get the processor name for logging
    fn name(&self) -> &str {
        "EventProcessor"
    }
}

/// Matches events against every registered definition and records hits
#[derive(Debug, Clone)]
pub struct InterceptorMatcher {
    registry: Arc<DefinitionRegistry>,
    history: Arc<HitHistory>,
    bus: Arc<ChangeBus>,
}

impl InterceptorMatcher {
    /// Create a matcher over shared engine state
    pub fn new(
        registry: Arc<DefinitionRegistry>,
        history: Arc<HitHistory>,
        bus: Arc<ChangeBus>,
    ) -> Self {
        Self {
            registry,
            history,
            bus,
        }
    }

    /// Record a hit unless the definition vanished while it was evaluated
    fn record(&self, owner_server_id: &str, hit: InterceptorHit) -> bool {
        let interceptor_id = hit.interceptor_id.clone();
        self.history.append(owner_server_id, hit);
        if !self.registry.contains(owner_server_id, &interceptor_id) {
            self.history.remove(owner_server_id, &interceptor_id);
            debug!(
                server_id = owner_server_id,
                interceptor_id = %interceptor_id,
                "Discarded hit for removed interceptor"
            );
            return false;
        }
        self.bus.publish(InterceptorChange::new(
            owner_server_id,
            interceptor_id,
            ChangeKind::HitRecorded,
        ));
        true
    }
}

impl EventProcessor for InterceptorMatcher {
    fn process(&self, event: &ChatEvent) -> usize {
        let mut hits = 0;
        for interceptor in self.registry.snapshot() {
            if !in_scope(&interceptor, event) {
                continue;
            }
            let Some(rule) = first_matching_rule(&interceptor, event) else {
                continue;
            };
            trace!(
                server_id = %event.server_id,
                channel = %event.channel,
                interceptor_id = %interceptor.id(),
                rule = %rule.label(),
                "Rule matched"
            );
            let hit = InterceptorHit::from_event(
                event,
                interceptor.id(),
                interceptor.name(),
                rule.label(),
            );
            if self.record(interceptor.server_id(), hit) {
                hits += 1;
            }
        }
        hits
    }

    fn name(&self) -> &str {
        "InterceptorMatcher"
    }
}
