//! Per-query memoization cache.
//!
//! Scoped to one `execute` call and zeroed on executor reuse. Evaluators
//! use it to avoid re-reading schema entities the same query already
//! fetched through its transaction.

use std::collections::HashMap;

use serde_json::Value;

/// The kind of entity a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Table definitions.
    Table,
}

#[derive(Default)]
pub struct QueryCache {
    entries: HashMap<(CacheKind, String), Option<Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a memoized entity. The outer `Option` is a cache miss; the
    /// inner one memoizes absence, so a known-missing entity is not
    /// re-fetched either.
    pub fn get(&self, kind: CacheKind, key: &str) -> Option<Option<Value>> {
        self.entries.get(&(kind, key.to_string())).cloned()
    }

    pub fn set(&mut self, kind: CacheKind, key: impl Into<String>, value: Option<Value>) {
        self.entries.insert((kind, key.into()), value);
    }

    pub fn evict(&mut self, kind: CacheKind, key: &str) {
        self.entries.remove(&(kind, key.to_string()));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memoizes_presence_and_absence() {
        let mut cache = QueryCache::new();
        assert_eq!(cache.get(CacheKind::Table, "person"), None);

        cache.set(CacheKind::Table, "person", Some(json!({"name": "person"})));
        cache.set(CacheKind::Table, "ghost", None);

        assert_eq!(
            cache.get(CacheKind::Table, "person"),
            Some(Some(json!({"name": "person"})))
        );
        assert_eq!(cache.get(CacheKind::Table, "ghost"), Some(None));

        cache.evict(CacheKind::Table, "person");
        assert_eq!(cache.get(CacheKind::Table, "person"), None);
    }
}
