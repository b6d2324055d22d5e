//! Definition registry: storage and CRUD for interceptor definitions
//!
//! Definitions are grouped by owning server. Each stored entry is an
//! immutable [`CompiledInterceptor`] behind an `Arc`; every mutation builds a
//! replacement and swaps it in under the write lock, so readers (including
//! the ingestion worker) only ever see whole definitions.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::rule::{normalize_name, CompiledInterceptor, InterceptorDefinition};

/// Owner-keyed store of compiled interceptor definitions
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    /// Owner server id -> definitions in creation order
    owners: RwLock<BTreeMap<String, Vec<Arc<CompiledInterceptor>>>>,
}

impl DefinitionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an enabled, rule-less definition under `owner_server_id`
    ///
    /// A name that collides case-insensitively with a sibling gets a numeric
    /// suffix (`"Watcher"`, `"Watcher (2)"`, ...). Id generation and name
    /// resolution happen under one write lock, so concurrent creators never
    /// race each other.
    pub fn create_interceptor(
        &self,
        owner_server_id: &str,
        requested_name: &str,
    ) -> InterceptorDefinition {
        let mut owners = self.owners.write();
        let siblings = owners.entry(owner_server_id.to_string()).or_default();

        let id = loop {
            let candidate = Uuid::new_v4().simple().to_string();
            if !siblings.iter().any(|s| s.id() == candidate) {
                break candidate;
            }
        };
        let name = unique_name(siblings, requested_name, None);

        let definition = InterceptorDefinition::new(id, owner_server_id, name);
        siblings.push(Arc::new(CompiledInterceptor::unrestricted(definition.clone())));

        debug!(
            server_id = owner_server_id,
            interceptor_id = %definition.id,
            name = %definition.name,
            "Interceptor created"
        );
        definition
    }

    /// Replace a definition's mutable fields
    ///
    /// Returns `Ok(false)` when no definition with that id exists for the
    /// owner (or the definition names another owner). Validation errors leave
    /// the registry untouched.
    pub fn save_interceptor(
        &self,
        owner_server_id: &str,
        definition: InterceptorDefinition,
    ) -> Result<bool> {
        if definition.server_id != owner_server_id {
            return Ok(false);
        }
        if !self.contains(owner_server_id, &definition.id) {
            return Ok(false);
        }

        let compiled = CompiledInterceptor::compile(definition)?;

        let mut owners = self.owners.write();
        let Some(siblings) = owners.get_mut(owner_server_id) else {
            return Ok(false);
        };
        let Some(idx) = siblings.iter().position(|s| s.id() == compiled.id()) else {
            return Ok(false);
        };
        let name = unique_name(siblings, compiled.name(), Some(compiled.id()));
        let compiled = if name == compiled.name() { compiled } else { compiled.renamed(name) };

        debug!(
            server_id = owner_server_id,
            interceptor_id = %compiled.id(),
            rules = compiled.rules().len(),
            "Interceptor saved"
        );
        siblings[idx] = Arc::new(compiled);
        Ok(true)
    }

    /// Rename a definition, applying the same placeholder and suffix rules as creation
    pub fn rename_interceptor(
        &self,
        owner_server_id: &str,
        interceptor_id: &str,
        new_name: &str,
    ) -> bool {
        self.update(owner_server_id, interceptor_id, |siblings, current| {
            let name = unique_name(siblings, new_name, Some(interceptor_id));
            current.renamed(name)
        })
    }

    /// Enable or disable a definition
    pub fn set_interceptor_enabled(
        &self,
        owner_server_id: &str,
        interceptor_id: &str,
        enabled: bool,
    ) -> bool {
        self.update(owner_server_id, interceptor_id, |_, current| current.with_enabled(enabled))
    }

    /// Remove a definition; hit history is dropped by the caller
    pub fn remove_interceptor(&self, owner_server_id: &str, interceptor_id: &str) -> bool {
        let mut owners = self.owners.write();
        let Some(siblings) = owners.get_mut(owner_server_id) else {
            return false;
        };
        let before = siblings.len();
        siblings.retain(|s| s.id() != interceptor_id);
        let removed = siblings.len() != before;
        if siblings.is_empty() {
            owners.remove(owner_server_id);
        }
        if removed {
            debug!(server_id = owner_server_id, interceptor_id, "Interceptor removed");
        }
        removed
    }

    /// Current display name
    pub fn interceptor_name(&self, owner_server_id: &str, interceptor_id: &str) -> Option<String> {
        self.compiled(owner_server_id, interceptor_id).map(|c| c.name().to_string())
    }

    /// Current definition
    pub fn interceptor(
        &self,
        owner_server_id: &str,
        interceptor_id: &str,
    ) -> Option<InterceptorDefinition> {
        self.compiled(owner_server_id, interceptor_id).map(|c| c.definition().clone())
    }

    /// Whether the definition exists
    pub fn contains(&self, owner_server_id: &str, interceptor_id: &str) -> bool {
        self.compiled(owner_server_id, interceptor_id).is_some()
    }

    /// Definitions of one owner, in creation order
    pub fn list_definitions(&self, owner_server_id: &str) -> Vec<InterceptorDefinition> {
        self.owners
            .read()
            .get(owner_server_id)
            .map(|siblings| siblings.iter().map(|s| s.definition().clone()).collect())
            .unwrap_or_default()
    }

    /// Every definition across all owners
    pub fn list_all_definitions(&self) -> Vec<InterceptorDefinition> {
        self.snapshot().iter().map(|c| c.definition().clone()).collect()
    }

    /// Compiled form of one definition
    pub fn compiled(
        &self,
        owner_server_id: &str,
        interceptor_id: &str,
    ) -> Option<Arc<CompiledInterceptor>> {
        self.owners
            .read()
            .get(owner_server_id)
            .and_then(|siblings| siblings.iter().find(|s| s.id() == interceptor_id).cloned())
    }

    /// All compiled definitions, ordered by owner then creation
    ///
    /// The returned handles are immutable, so callers can evaluate them
    /// without holding any lock.
    pub fn snapshot(&self) -> Vec<Arc<CompiledInterceptor>> {
        self.owners.read().values().flatten().cloned().collect()
    }

    /// Total number of definitions
    pub fn len(&self) -> usize {
        self.owners.read().values().map(Vec::len).sum()
    }

    /// Whether the registry holds no definitions
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update<F>(&self, owner_server_id: &str, interceptor_id: &str, f: F) -> bool
    where
        F: FnOnce(&[Arc<CompiledInterceptor>], &CompiledInterceptor) -> CompiledInterceptor,
    {
        let mut owners = self.owners.write();
        let Some(siblings) = owners.get_mut(owner_server_id) else {
            return false;
        };
        let Some(idx) = siblings.iter().position(|s| s.id() == interceptor_id) else {
            return false;
        };
        let next = f(siblings.as_slice(), &siblings[idx]);
        siblings[idx] = Arc::new(next);
        true
    }
}

/// Resolve a sibling-unique display name
///
/// `exclude_id` is the definition being edited, which never collides with
/// itself.
fn unique_name(
    siblings: &[Arc<CompiledInterceptor>],
    requested: &str,
    exclude_id: Option<&str>,
) -> String {
    let base = normalize_name(requested);
    let taken = |candidate: &str| {
        siblings
            .iter()
            .filter(|s| Some(s.id()) != exclude_id)
            .any(|s| s.name().to_lowercase() == candidate.to_lowercase())
    };
    if !taken(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{} ({})", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::MatchMode;
    use crate::rule::{InterceptorRule, DEFAULT_INTERCEPTOR_NAME};
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_create_defaults() {
        let registry = DefinitionRegistry::new();
        let def = registry.create_interceptor("srv", "Watcher");
        assert!(def.enabled);
        assert!(def.rules.is_empty());
        assert_eq!(def.server_id, "srv");
        assert!(!def.id.is_empty());
        assert_eq!(registry.interceptor("srv", &def.id), Some(def));
    }

    #[test]
    fn test_create_suffixes_colliding_names() {
        let registry = DefinitionRegistry::new();
        let first = registry.create_interceptor("srv", "Watcher");
        let second = registry.create_interceptor("srv", "watcher");
        let third = registry.create_interceptor("srv", "Watcher");
        assert_ne!(first.id, second.id);
        assert_eq!(first.name, "Watcher");
        assert_eq!(second.name, "watcher (2)");
        assert_eq!(third.name, "Watcher (3)");

        let other_owner = registry.create_interceptor("other", "Watcher");
        assert_eq!(other_owner.name, "Watcher");
    }

    #[test]
    fn test_blank_name_gets_placeholder() {
        let registry = DefinitionRegistry::new();
        assert_eq!(registry.create_interceptor("srv", "  ").name, DEFAULT_INTERCEPTOR_NAME);
    }

    #[test]
    fn test_concurrent_create_unique() {
        let registry = Arc::new(DefinitionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|_| registry.create_interceptor("srv", "Watcher"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let defs: Vec<_> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();

        let ids: HashSet<_> = defs.iter().map(|d| d.id.clone()).collect();
        let names: HashSet<_> = defs.iter().map(|d| d.name.to_lowercase()).collect();
        assert_eq!(ids.len(), 200);
        assert_eq!(names.len(), 200);
        assert_eq!(registry.len(), 200);
    }

    #[test]
    fn test_save_replaces_and_preserves_rule_order() {
        let registry = DefinitionRegistry::new();
        let mut def = registry.create_interceptor("srv", "Watcher");
        def.rules = vec![
            InterceptorRule::new("b"),
            InterceptorRule::new("a"),
            InterceptorRule::new("c"),
        ];
        def.channel_include_pattern = "#one".into();
        assert!(registry.save_interceptor("srv", def.clone()).unwrap());

        let stored = registry.interceptor("srv", &def.id).unwrap();
        let labels: Vec<_> = stored.rules.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["b", "a", "c"]);
        assert_eq!(stored.channel_include_pattern, "#one");
    }

    #[test]
    fn test_save_unknown_returns_false() {
        let registry = DefinitionRegistry::new();
        let def = registry.create_interceptor("srv", "Watcher");

        let mut unknown = def.clone();
        unknown.id = "nope".into();
        assert!(!registry.save_interceptor("srv", unknown).unwrap());
        assert!(!registry.save_interceptor("other", def.clone()).unwrap());

        let mut moved = def;
        moved.server_id = "other".into();
        assert!(!registry.save_interceptor("srv", moved).unwrap());
    }

    #[test]
    fn test_save_invalid_regex_leaves_state() {
        let registry = DefinitionRegistry::new();
        let def = registry.create_interceptor("srv", "Watcher");
        let mut broken = def.clone();
        broken.rules.push(InterceptorRule::new("bad").with_message(MatchMode::Regex, "(heck"));

        let err = registry.save_interceptor("srv", broken).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(registry.interceptor("srv", &def.id), Some(def));
    }

    #[test]
    fn test_save_keeps_names_unique() {
        let registry = DefinitionRegistry::new();
        registry.create_interceptor("srv", "Alpha");
        let mut beta = registry.create_interceptor("srv", "Beta");
        beta.name = "ALPHA".into();
        assert!(registry.save_interceptor("srv", beta.clone()).unwrap());
        assert_eq!(registry.interceptor_name("srv", &beta.id).unwrap(), "ALPHA (2)");

        // Saving under its own name is not a collision
        let current = registry.interceptor("srv", &beta.id).unwrap();
        assert!(registry.save_interceptor("srv", current).unwrap());
        assert_eq!(registry.interceptor_name("srv", &beta.id).unwrap(), "ALPHA (2)");
    }

    #[test]
    fn test_rename_enable_remove() {
        let registry = DefinitionRegistry::new();
        let def = registry.create_interceptor("srv", "Watcher");

        assert!(registry.rename_interceptor("srv", &def.id, "Spotter"));
        assert_eq!(registry.interceptor_name("srv", &def.id).unwrap(), "Spotter");
        assert!(!registry.rename_interceptor("srv", "missing", "x"));

        assert!(registry.set_interceptor_enabled("srv", &def.id, false));
        assert!(!registry.interceptor("srv", &def.id).unwrap().enabled);
        assert!(!registry.set_interceptor_enabled("other", &def.id, true));

        assert!(registry.remove_interceptor("srv", &def.id));
        assert!(!registry.remove_interceptor("srv", &def.id));
        assert!(registry.interceptor("srv", &def.id).is_none());
        assert!(registry.list_definitions("srv").is_empty());
    }

    #[test]
    fn test_snapshot_spans_owners() {
        let registry = DefinitionRegistry::new();
        registry.create_interceptor("b", "x");
        registry.create_interceptor("", "y");
        registry.create_interceptor("a", "z");
        let owners: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|c| c.server_id().to_string())
            .collect();
        assert_eq!(owners, vec!["", "a", "b"]);
        assert_eq!(registry.list_all_definitions().len(), 3);
    }
}
