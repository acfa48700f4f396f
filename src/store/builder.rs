//! Builder for [`RunMetricStore`].

use std::sync::Arc;

use super::{MetricSink, NullSink, RunMetricStore, StoreConfig};
use crate::run::{MemoryRunRegistry, RunRegistry};

/// Store builder
///
/// ```rust
/// use std::sync::Arc;
/// use trueno_metrics::store::{MemorySink, RunMetricStore};
///
/// let sink = Arc::new(MemorySink::new());
/// let store = RunMetricStore::builder()
///     .allow_negative(true)
///     .expected_runs(64)
///     .sink(sink)
///     .build();
/// assert!(store.config().allow_negative);
/// ```
#[derive(Default)]
pub struct RunMetricStoreBuilder {
    config: StoreConfig,
    registry: Option<Arc<dyn RunRegistry>>,
    sink: Option<Arc<dyn MetricSink>>,
}

impl RunMetricStoreBuilder {
    /// Replace the whole configuration
    #[must_use]
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Accept negative timestamps and steps
    #[must_use]
    pub const fn allow_negative(mut self, allow: bool) -> Self {
        self.config.allow_negative = allow;
        self
    }

    /// Pre-allocate slots for this many runs
    #[must_use]
    pub const fn expected_runs(mut self, runs: usize) -> Self {
        self.config.expected_runs = runs;
        self
    }

    /// Consult an external run registry instead of an internal one
    ///
    /// The store then treats the registry as read-only for restores:
    /// [`RunMetricStore::restore`] and
    /// [`RunMetricStore::import_parquet`] only replay runs it already knows.
    /// [`RunMetricStore::register_run`] still delegates to it.
    #[must_use]
    pub fn registry<R: RunRegistry + 'static>(mut self, registry: Arc<R>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Persist every recorded sample through `sink`
    #[must_use]
    pub fn sink<S: MetricSink + 'static>(mut self, sink: Arc<S>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the store
    #[must_use]
    pub fn build(self) -> RunMetricStore {
        let owns_registry = self.registry.is_none();
        let registry: Arc<dyn RunRegistry> = match self.registry {
            Some(registry) => registry,
            None => Arc::new(MemoryRunRegistry::new()),
        };
        let sink: Arc<dyn MetricSink> = match self.sink {
            Some(sink) => sink,
            None => Arc::new(NullSink),
        };
        RunMetricStore::from_parts(self.config, registry, owns_registry, sink)
    }
}
