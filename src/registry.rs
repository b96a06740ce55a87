//! Registry — owned name-to-entry map shared by the hub and the bus.
//!
//! Each component owns its own `Registry`; there is no global instance.
//! Only keyed operations are exposed so the owning component stays in
//! charge of its invariants.

use std::collections::HashMap;

/// A string-keyed store of entries.
///
/// The [`DispatchHub`](crate::mediator::DispatchHub) keeps participants in
/// a `Registry`, the [`NotificationBus`](crate::observer::NotificationBus)
/// keeps per-topic listener lists in one.
#[derive(Debug, Clone)]
pub struct Registry<V> {
    entries: HashMap<String, V>,
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Registry<V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert an entry, returning whatever was previously stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Look up an entry mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    /// Get the entry for `key`, creating it with `V::default()` if absent.
    pub fn get_or_default(&mut self, key: &str) -> &mut V
    where
        V: Default,
    {
        self.entries.entry(key.to_string()).or_default()
    }

    /// Remove an entry.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key)
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted snapshot of the registered keys, for diagnostics.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drop every entry for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &mut V) -> bool) {
        self.entries.retain(|k, v| keep(k.as_str(), v));
    }
}
