//! Run registry - which run IDs may receive metrics.

use dashmap::DashSet;
use rustc_hash::FxBuildHasher;

/// Source of truth for which runs exist.
///
/// Run lifecycle is owned elsewhere; the metric store only asks whether a run
/// is known and, when it owns registration itself, registers new runs.
pub trait RunRegistry: Send + Sync {
    /// Whether the run is known.
    fn contains(&self, run_id: &str) -> bool;

    /// Register a run. Returns `true` if it was not known before.
    fn register(&self, run_id: &str) -> bool;
}

/// In-memory registry backed by a concurrent set.
pub struct MemoryRunRegistry {
    runs: DashSet<String, FxBuildHasher>,
}

impl MemoryRunRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs: DashSet::with_hasher(FxBuildHasher),
        }
    }

    /// Number of registered runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Check if no run is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl Default for MemoryRunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RunRegistry for MemoryRunRegistry {
    fn contains(&self, run_id: &str) -> bool {
        self.runs.contains(run_id)
    }

    fn register(&self, run_id: &str) -> bool {
        self.runs.insert(run_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_once() {
        let registry = MemoryRunRegistry::new();
        assert!(!registry.contains("run-1"));
        assert!(registry.register("run-1"));
        assert!(!registry.register("run-1"));
        assert!(registry.contains("run-1"));
        assert_eq!(registry.len(), 1);
    }
}
