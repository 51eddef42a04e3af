//! Plugin-type resolution: rejects a topology naming a `plugin_type` no one
//! registered, before any runner is constructed. Concrete input/filter/output
//! implementations are external collaborators; this crate only validates that
//! a configured `plugin_type` string names something the embedding binary has
//! registered.

use std::collections::HashSet;

/// The set of plugin-type names a binary has wired up constructors for, kept
/// separate per input/filter/output role since the same name may mean
/// different things in each.
#[derive(Debug, Clone, Default)]
pub struct PluginTypeRegistry(HashSet<String>);

impl PluginTypeRegistry {
    pub fn new() -> Self {
        PluginTypeRegistry(HashSet::new())
    }

    pub fn register(mut self, plugin_type: impl Into<String>) -> Self {
        self.0.insert(plugin_type.into());
        self
    }

    pub fn contains(&self, plugin_type: &str) -> bool {
        self.0.contains(plugin_type)
    }
}
