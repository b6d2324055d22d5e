//! Validated, ready-to-evaluate forms of definitions and rules

use crate::error::{ErrorContext, InterceptorError, Result};
use crate::event::{ChatEvent, InterceptorEventType};
use crate::pattern::{compile_matcher, split_csv, PatternMatcher, StringMatcher};
use crate::rule::{normalize_label, normalize_name, InterceptorDefinition, InterceptorRule};
use crate::scope::ChannelScope;

/// A rule whose patterns have been compiled
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: InterceptorRule,
    /// Empty means every event type
    event_types: Vec<InterceptorEventType>,
    message: PatternMatcher,
    nick: PatternMatcher,
    hostmask: PatternMatcher,
}

impl CompiledRule {
    /// Validate and compile a rule, normalizing its label
    pub fn compile(rule: &InterceptorRule) -> Result<Self> {
        let mut rule = rule.clone();
        rule.label = normalize_label(&rule.label);

        let event_types = split_csv(&rule.event_types_csv)
            .map(|token| {
                token.parse::<InterceptorEventType>().map_err(|e| {
                    InterceptorError::InvalidRule(format!(
                        "{} in event types '{}'",
                        e, rule.event_types_csv
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let message = compile_matcher("message", rule.message_mode, &rule.message_pattern)?;
        let nick = compile_matcher("nick", rule.nick_mode, &rule.nick_pattern)?;
        let hostmask = compile_matcher("hostmask", rule.hostmask_mode, &rule.hostmask_pattern)?;

        Ok(Self {
            rule,
            event_types,
            message,
            nick,
            hostmask,
        })
    }

    /// The (normalized) rule this was compiled from
    pub fn rule(&self) -> &InterceptorRule {
        &self.rule
    }

    /// Rule label, used as the hit reason
    pub fn label(&self) -> &str {
        &self.rule.label
    }

    /// Whether the rule takes part in evaluation at all
    pub fn is_enabled(&self) -> bool {
        self.rule.enabled
    }

    /// Whether the rule's event type filter admits this type
    pub fn accepts_event_type(&self, event_type: InterceptorEventType) -> bool {
        self.event_types.is_empty() || self.event_types.contains(&event_type)
    }

    /// Whether all three dimensions match the event
    ///
    /// Ignores `enabled` and the event type filter; see
    /// [`crate::rule::first_matching_rule`] for the full evaluation.
    pub fn matches(&self, event: &ChatEvent) -> bool {
        self.message.string_match(&event.text)
            && self.nick.string_match(&event.from_nick)
            && self.hostmask.string_match(&event.from_hostmask)
    }
}

/// A definition together with its compiled scope and rules
///
/// Immutable once built; the registry swaps whole instances on save so a
/// reader never observes a half-applied definition.
#[derive(Debug, Clone)]
pub struct CompiledInterceptor {
    definition: InterceptorDefinition,
    channels: ChannelScope,
    rules: Vec<CompiledRule>,
}

impl CompiledInterceptor {
    /// Validate and compile a definition
    ///
    /// The name is normalized to a non-blank value and rule labels likewise;
    /// the stored definition reflects those normalizations.
    pub fn compile(mut definition: InterceptorDefinition) -> Result<Self> {
        definition.name = normalize_name(&definition.name);

        let channels = ChannelScope::compile(&definition)?;

        let rules = definition
            .rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                CompiledRule::compile(rule).with_context(|| {
                    format!("rule #{} '{}'", idx + 1, normalize_label(&rule.label))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        definition.rules = rules.iter().map(|r| r.rule().clone()).collect();

        Ok(Self {
            definition,
            channels,
            rules,
        })
    }

    /// Wrap a rule-less definition that listens to every channel
    ///
    /// Infallible counterpart of [`compile`](Self::compile) for freshly
    /// created definitions; rules and channel patterns are ignored.
    pub fn unrestricted(mut definition: InterceptorDefinition) -> Self {
        definition.name = normalize_name(&definition.name);
        definition.channel_include_pattern.clear();
        definition.channel_exclude_pattern.clear();
        definition.rules.clear();
        Self {
            definition,
            channels: ChannelScope::unrestricted(),
            rules: Vec::new(),
        }
    }

    /// The normalized definition
    pub fn definition(&self) -> &InterceptorDefinition {
        &self.definition
    }

    /// Definition id
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Owning server
    pub fn server_id(&self) -> &str {
        &self.definition.server_id
    }

    /// Compiled channel scope
    pub fn channels(&self) -> &ChannelScope {
        &self.channels
    }

    /// Compiled rules in evaluation order
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Copy with a different display name; patterns are reused as-is
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.definition.name = normalize_name(&name.into());
        next
    }

    /// Copy with the enabled flag changed
    pub fn with_enabled(&self, enabled: bool) -> Self {
        let mut next = self.clone();
        next.definition.enabled = enabled;
        next
    }
}
