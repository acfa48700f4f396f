//! Last-write-wins key/value stores for run params and tags.
//!
//! Params and tags live beside metric aggregation but never feed into it; a
//! run's entries are a plain string map where the latest write per key wins.

use std::collections::BTreeMap;

use dashmap::DashMap;
use rustc_hash::{FxBuildHasher, FxHashMap};

/// In-memory, per-run key/value store using a concurrent hashmap.
///
/// Thread-safe; writes for different runs never contend. Within a run, a
/// later `set` for the same key overwrites the earlier value.
///
/// # Example
///
/// ```rust
/// use trueno_metrics::run::ParamStore;
///
/// let params = ParamStore::new();
/// params.set("run-001", "learning_rate", "0.01");
/// params.set("run-001", "learning_rate", "0.001");
/// assert_eq!(params.get("run-001", "learning_rate").as_deref(), Some("0.001"));
/// ```
pub struct KeyValueStore {
    runs: DashMap<String, FxHashMap<String, String>, FxBuildHasher>,
}

/// Store for run params.
pub type ParamStore = KeyValueStore;

/// Store for run tags.
pub type TagStore = KeyValueStore;

impl KeyValueStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Set `key` to `value` for a run, overwriting any previous value.
    pub fn set(&self, run_id: &str, key: impl Into<String>, value: impl Into<String>) {
        self.runs
            .entry(run_id.to_string())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Get the value of `key` for a run.
    #[must_use]
    pub fn get(&self, run_id: &str, key: &str) -> Option<String> {
        self.runs
            .get(run_id)
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Snapshot of every entry of a run, ordered by key.
    #[must_use]
    pub fn entries(&self, run_id: &str) -> BTreeMap<String, String> {
        self.runs
            .get(run_id)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of runs with at least one entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get() {
        let store = KeyValueStore::new();
        store.set("run-1", "lr", "0.1");
        assert_eq!(store.get("run-1", "lr").as_deref(), Some("0.1"));
        assert_eq!(store.get("run-1", "missing"), None);
        assert_eq!(store.get("run-2", "lr"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let store = KeyValueStore::new();
        store.set("run-1", "lr", "0.1");
        store.set("run-1", "lr", "0.2");
        assert_eq!(store.get("run-1", "lr").as_deref(), Some("0.2"));
        assert_eq!(store.entries("run-1").len(), 1);
    }

    #[test]
    fn test_runs_are_isolated() {
        let store = KeyValueStore::new();
        store.set("run-1", "owner", "a");
        store.set("run-2", "owner", "b");
        assert_eq!(store.len(), 2);
        assert_eq!(store.entries("run-1")["owner"], "a");
        assert_eq!(store.entries("run-2")["owner"], "b");
    }

    #[test]
    fn test_entries_of_unknown_run_is_empty() {
        let store = KeyValueStore::default();
        assert!(store.is_empty());
        assert!(store.entries("nope").is_empty());
    }

    #[test]
    fn test_concurrent_writers() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(KeyValueStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..50 {
                        store.set("run-1", format!("key{i}-{j}"), format!("{j}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.entries("run-1").len(), 400);
    }
}
