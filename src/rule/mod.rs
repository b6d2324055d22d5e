//! Interceptor definitions and rules
//!
//! This module holds the user-editable configuration records. They are plain
//! serde data so external collaborators can persist and reload them; the
//! engine only ever evaluates their compiled form (see [`compiled`]).
//!
//! # Example
//!
//! ```
//! use interceptor_engine::rule::definitions_from_yaml;
//!
//! # fn example() -> interceptor_engine::Result<()> {
//! let yaml = r##"
//! - id: swear-watch
//!   name: Swear watch
//!   serverId: libera
//!   channelIncludePattern: "#one,#two"
//!   rules:
//!     - label: swearing
//!       eventTypesCsv: message
//!       messageMode: REGEX
//!       messagePattern: "(damn|heck)"
//! "##;
//!
//! let defs = definitions_from_yaml(yaml.as_bytes())?;
//! assert_eq!(defs[0].rules[0].label, "swearing");
//! # Ok(())
//! # }
//! ```

use crate::error::{ErrorContext, Result};
use serde::{Deserialize, Serialize};

pub mod compiled;
pub mod evaluator;

pub use crate::pattern::MatchMode;
pub use compiled::{CompiledInterceptor, CompiledRule};
pub use evaluator::first_matching_rule;

/// Name given to definitions created or saved with a blank name
pub const DEFAULT_INTERCEPTOR_NAME: &str = "Interceptor";

/// Label given to rules saved with a blank label
pub const DEFAULT_RULE_LABEL: &str = "Rule";

/// One alerting rule inside an interceptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterceptorRule {
    /// Disabled rules are skipped entirely
    pub enabled: bool,
    /// Human label, recorded as the hit reason
    pub label: String,
    /// Comma-separated event type tokens; blank means every type
    pub event_types_csv: String,
    /// Match mode for the message text
    pub message_mode: MatchMode,
    /// Pattern for the message text
    pub message_pattern: String,
    /// Match mode for the sender nick
    pub nick_mode: MatchMode,
    /// Pattern for the sender nick
    pub nick_pattern: String,
    /// Match mode for the sender hostmask
    pub hostmask_mode: MatchMode,
    /// Pattern for the sender hostmask
    pub hostmask_pattern: String,
}

impl Default for InterceptorRule {
    fn default() -> Self {
        Self {
            enabled: true,
            label: DEFAULT_RULE_LABEL.to_string(),
            event_types_csv: String::new(),
            message_mode: MatchMode::All,
            message_pattern: String::new(),
            nick_mode: MatchMode::All,
            nick_pattern: String::new(),
            hostmask_mode: MatchMode::All,
            hostmask_pattern: String::new(),
        }
    }
}

impl InterceptorRule {
    /// Create an enabled rule that matches everything
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Restrict the rule to a comma-separated list of event types
    pub fn with_event_types(mut self, csv: impl Into<String>) -> Self {
        self.event_types_csv = csv.into();
        self
    }

    /// Set the message dimension
    pub fn with_message(mut self, mode: MatchMode, pattern: impl Into<String>) -> Self {
        self.message_mode = mode;
        self.message_pattern = pattern.into();
        self
    }

    /// Set the nick dimension
    pub fn with_nick(mut self, mode: MatchMode, pattern: impl Into<String>) -> Self {
        self.nick_mode = mode;
        self.nick_pattern = pattern.into();
        self
    }

    /// Set the hostmask dimension
    pub fn with_hostmask(mut self, mode: MatchMode, pattern: impl Into<String>) -> Self {
        self.hostmask_mode = mode;
        self.hostmask_pattern = pattern.into();
        self
    }

    /// Enable or disable the rule
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Notification wiring carried alongside a definition
///
/// The engine stores and returns these untouched; delivery belongs to the
/// notification collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterceptorActions {
    /// Show a status-bar notice on hit
    pub status_bar: bool,
    /// Show a desktop toast on hit
    pub toast: bool,
    /// Sound to play, if any
    pub sound_id: String,
    /// Whether `sound_custom_path` overrides `sound_id`
    pub sound_use_custom: bool,
    /// Custom sound file
    pub sound_custom_path: String,
    /// Script to run on hit
    pub script_path: String,
    /// Free-form operator notes / custom notification text
    pub notes: String,
}

/// A named interceptor: scope plus an ordered rule list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterceptorDefinition {
    /// Generated id, immutable after creation
    pub id: String,
    /// Display name, unique among siblings of the same owner
    pub name: String,
    /// Disabled definitions are never in scope
    pub enabled: bool,
    /// Owning server (registry key); blank means the definition listens to every server
    pub server_id: String,
    /// Listen to every server even though an owner is set
    pub any_server: bool,
    /// Channel include mode
    pub channel_include_mode: MatchMode,
    /// Channel include pattern (comma-separated list for `GLOB` and `LIKE`)
    pub channel_include_pattern: String,
    /// Channel exclude mode
    pub channel_exclude_mode: MatchMode,
    /// Channel exclude pattern, subtracted from the include set
    pub channel_exclude_pattern: String,
    /// Notification wiring, not interpreted by the engine
    pub actions: InterceptorActions,
    /// Rules in evaluation order
    pub rules: Vec<InterceptorRule>,
}

impl Default for InterceptorDefinition {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: DEFAULT_INTERCEPTOR_NAME.to_string(),
            enabled: true,
            server_id: String::new(),
            any_server: false,
            channel_include_mode: MatchMode::Glob,
            channel_include_pattern: String::new(),
            channel_exclude_mode: MatchMode::Glob,
            channel_exclude_pattern: String::new(),
            actions: InterceptorActions::default(),
            rules: Vec::new(),
        }
    }
}

impl InterceptorDefinition {
    /// Create an enabled, rule-less definition scoped to its owner
    pub fn new(
        id: impl Into<String>,
        server_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            server_id: server_id.into(),
            ..Default::default()
        }
    }

    /// Whether this definition listens to every server
    pub fn is_any_server(&self) -> bool {
        self.any_server || self.server_id.trim().is_empty()
    }

    /// Set the channel include list
    pub fn with_channel_include(mut self, mode: MatchMode, pattern: impl Into<String>) -> Self {
        self.channel_include_mode = mode;
        self.channel_include_pattern = pattern.into();
        self
    }

    /// Set the channel exclude list
    pub fn with_channel_exclude(mut self, mode: MatchMode, pattern: impl Into<String>) -> Self {
        self.channel_exclude_mode = mode;
        self.channel_exclude_pattern = pattern.into();
        self
    }

    /// Append a rule
    pub fn with_rule(mut self, rule: InterceptorRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// Replace a blank name with the placeholder, trimming otherwise
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_INTERCEPTOR_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Replace a blank label with the placeholder, trimming otherwise
pub fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        DEFAULT_RULE_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse a YAML list of definitions and validate every one of them
pub fn definitions_from_yaml(data: &[u8]) -> Result<Vec<InterceptorDefinition>> {
    let defs: Vec<InterceptorDefinition> = serde_yaml::from_slice(data)?;
    for def in &defs {
        CompiledInterceptor::compile(def.clone())
            .with_context(|| format!("interceptor '{}'", def.name))?;
    }
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_definitions_from_yaml() {
        let yaml = r##"
- id: watch-1
  name: Watcher
  serverId: libera
  channelIncludePattern: "#one,#two"
  channelExcludePattern: "#two-ops"
  actions:
    toast: true
    soundId: ding
  rules:
    - label: swearing
      eventTypesCsv: "message, action"
      messageMode: REGEX
      messagePattern: "(damn|heck)"
      nickMode: LIKE
      nickPattern: ali
"##;

        let defs = definitions_from_yaml(yaml.as_bytes()).expect("valid definitions");
        assert_eq!(defs.len(), 1);
        let def = &defs[0];
        assert_eq!(def.server_id, "libera");
        assert!(def.enabled);
        assert!(def.actions.toast);
        assert_eq!(def.actions.sound_id, "ding");
        assert_eq!(def.rules[0].message_mode, MatchMode::Regex);
        assert_eq!(def.rules[0].hostmask_mode, MatchMode::All);
        assert!(def.rules[0].enabled);
    }

    #[test]
    fn test_definitions_from_yaml_rejects_bad_regex() {
        let yaml = r#"
- id: broken
  name: Broken
  rules:
    - label: oops
      messageMode: REGEX
      messagePattern: "(damn"
"#;

        let err = definitions_from_yaml(yaml.as_bytes()).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("interceptor 'Broken'"));
    }

    #[test]
    fn test_new_definition_scoped_to_owner() {
        let mut def = InterceptorDefinition::new("id-1", "srv", "Watcher");
        assert!(!def.is_any_server());
        def.any_server = true;
        assert!(def.is_any_server());
        assert!(InterceptorDefinition::new("id-2", "", "Any").is_any_server());
    }

    #[test]
    fn test_normalize_placeholders() {
        assert_eq!(normalize_name("   "), DEFAULT_INTERCEPTOR_NAME);
        assert_eq!(normalize_name(" Watcher "), "Watcher");
        assert_eq!(normalize_label(""), DEFAULT_RULE_LABEL);
    }

    #[test]
    fn test_rule_builder() {
        let rule = InterceptorRule::new("r1")
            .with_message(MatchMode::Like, "heck")
            .with_enabled(false);
        assert_eq!(rule.label, "r1");
        assert_eq!(rule.message_mode, MatchMode::Like);
        assert!(!rule.enabled);
        assert_eq!(rule.nick_mode, MatchMode::All);
    }
}
