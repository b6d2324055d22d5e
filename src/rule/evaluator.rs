//! First-match rule evaluation

use crate::event::ChatEvent;
use crate::rule::compiled::{CompiledInterceptor, CompiledRule};
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// Find the first rule, in stored order, that matches the event
///
/// Disabled rules and rules whose event type filter excludes the event are
/// skipped. There is no scoring: list order is the only tie-break. A rule that
/// panics while matching is logged and treated as a non-match so the rest of
/// the list is still evaluated.
pub fn first_matching_rule<'a>(
    interceptor: &'a CompiledInterceptor,
    event: &ChatEvent,
) -> Option<&'a CompiledRule> {
    interceptor
        .rules()
        .iter()
        .filter(|rule| rule.is_enabled())
        .filter(|rule| rule.accepts_event_type(event.event_type))
        .find(|rule| guarded_match(interceptor, rule, event))
}

fn guarded_match(
    interceptor: &CompiledInterceptor,
    rule: &CompiledRule,
    event: &ChatEvent,
) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| rule.matches(event))) {
        Ok(matched) => matched,
        Err(_) => {
            error!(
                interceptor_id = %interceptor.id(),
                rule = %rule.label(),
                "Rule evaluation panicked; skipping rule"
            );
            false
        }
    }
}
