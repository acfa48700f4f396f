//! Run Metric Store - histories and summaries for every (run, key)
//!
//! ## Design
//!
//! ```text
//! runs: DashMap<run_id, RunSlot>
//!         └── keys: DashMap<metric_key, Arc<RwLock<KeyState>>>
//!                                             ├── history (append-only)
//!                                             └── summary (latest/min/max)
//! ```
//!
//! A `record` takes the per-key write lock, persists through the configured
//! [`MetricSink`], appends to the history and folds the sample into the
//! summary before releasing the lock. Readers take the same lock shared, so
//! they see either none or all of a given `record`. Different keys and runs
//! never share a lock.
//!
//! ## Example
//!
//! ```rust
//! use trueno_metrics::metric::MetricSample;
//! use trueno_metrics::store::RunMetricStore;
//!
//! let store = RunMetricStore::new();
//! store.register_run("run-001");
//!
//! store.record("run-001", MetricSample::new("loss", 0.9, 100, 0))?;
//! store.record("run-001", MetricSample::new("loss", 0.5, 200, 1))?;
//!
//! let summary = store.summary("run-001", "loss")?.expect("recorded");
//! assert_eq!(summary.current_value(), 0.5);
//! assert_eq!(summary.min_value(), Some(0.5));
//! assert_eq!(summary.max_value(), Some(0.9));
//! # Ok::<(), trueno_metrics::Error>(())
//! ```

mod builder;
mod config;
mod sink;

pub use builder::RunMetricStoreBuilder;
pub use config::StoreConfig;
pub use sink::{MemorySink, MetricSink, NullSink};

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxBuildHasher;
use tracing::{debug, info, warn};

use crate::metric::{MetricHistory, MetricSample, MetricSummary, SummaryType};
use crate::run::{ParamStore, RunData, RunRegistry, TagStore};
use crate::wire::SummaryRow;
use crate::{Error, Result};

/// History and summary of one (run, key), always mutated together.
#[derive(Debug)]
struct KeyState {
    history: MetricHistory,
    summary: Option<MetricSummary>,
}

impl KeyState {
    fn new(run_id: &str, key: &str) -> Self {
        Self {
            history: MetricHistory::new(run_id, key),
            summary: None,
        }
    }

    fn apply(&mut self, sample: MetricSample) -> Result<()> {
        self.history.append(sample.clone())?;
        match self.summary.as_mut() {
            Some(summary) => summary.observe(&sample),
            None => self.summary = Some(MetricSummary::first(&sample)),
        }
        Ok(())
    }
}

type KeySlot = Arc<RwLock<KeyState>>;

#[derive(Default)]
struct RunSlot {
    keys: DashMap<String, KeySlot, FxBuildHasher>,
}

/// Concurrent store of metric histories and summaries.
///
/// See the [module documentation](self) for the locking model.
pub struct RunMetricStore {
    runs: DashMap<String, Arc<RunSlot>, FxBuildHasher>,
    registry: Arc<dyn RunRegistry>,
    owns_registry: bool,
    sink: Arc<dyn MetricSink>,
    params: ParamStore,
    tags: TagStore,
    config: StoreConfig,
}

impl RunMetricStore {
    /// Create an in-memory store with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a store builder.
    #[must_use]
    pub fn builder() -> RunMetricStoreBuilder {
        RunMetricStoreBuilder::default()
    }

    pub(crate) fn from_parts(
        config: StoreConfig,
        registry: Arc<dyn RunRegistry>,
        owns_registry: bool,
        sink: Arc<dyn MetricSink>,
    ) -> Self {
        Self {
            runs: DashMap::with_capacity_and_hasher(config.expected_runs, FxBuildHasher),
            registry,
            owns_registry,
            sink,
            params: ParamStore::new(),
            tags: TagStore::new(),
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Register a run so it may receive metrics, params and tags.
    ///
    /// Returns `true` if the run was not registered before.
    pub fn register_run(&self, run_id: &str) -> bool {
        let added = self.registry.register(run_id);
        if added {
            debug!(run_id, "registered run");
        }
        added
    }

    /// Whether the run is registered.
    #[must_use]
    pub fn contains_run(&self, run_id: &str) -> bool {
        self.registry.contains(run_id)
    }

    fn ensure_run(&self, run_id: &str) -> Result<()> {
        if self.registry.contains(run_id) {
            Ok(())
        } else {
            Err(Error::NotFound(run_id.to_string()))
        }
    }

    fn slot(&self, run_id: &str, key: &str) -> KeySlot {
        let run = Arc::clone(
            self.runs
                .entry(run_id.to_string())
                .or_insert_with(|| Arc::new(RunSlot::default()))
                .value(),
        );
        let slot = Arc::clone(
            run.keys
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(RwLock::new(KeyState::new(run_id, key))))
                .value(),
        );
        slot
    }

    /// Drop a slot created for a sample that never made it into history.
    ///
    /// Only removes the slot while `slot` and the map hold the sole
    /// references, so no writer waiting on its lock can lose a sample.
    fn discard_unused_slot(&self, run_id: &str, key: &str, slot: KeySlot) {
        let Some(run) = self.runs.get(run_id).map(|run| Arc::clone(run.value())) else {
            return;
        };
        run.keys.remove_if(key, |_, held| {
            Arc::ptr_eq(held, &slot) && Arc::strong_count(held) == 2 && held.read().history.is_empty()
        });
    }

    fn existing_slot(&self, run_id: &str, key: &str) -> Option<KeySlot> {
        let run = self.runs.get(run_id).map(|run| Arc::clone(run.value()))?;
        let slot = run.keys.get(key).map(|slot| Arc::clone(slot.value()));
        slot
    }

    fn run_slots(&self, run_id: &str) -> Vec<KeySlot> {
        let Some(run) = self.runs.get(run_id).map(|run| Arc::clone(run.value())) else {
            return Vec::new();
        };
        let slots = run.keys.iter().map(|slot| Arc::clone(slot.value())).collect();
        slots
    }

    /// Record a sample for a run.
    ///
    /// Appends to the (run, `sample.key()`) history and updates its summary
    /// in O(1). Concurrent calls for the same key are serialized; their
    /// append order decides exact `(timestamp, step)` ties.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidValue`] if the sample fails boundary validation
    /// - [`Error::NotFound`] if the run is not registered
    /// - [`Error::Sink`] if the persistence collaborator rejects the sample
    ///
    /// On error nothing is appended and the summary is unchanged.
    pub fn record(&self, run_id: &str, sample: MetricSample) -> Result<()> {
        if let Err(e) = sample.validate(self.config.allow_negative) {
            warn!(run_id, key = sample.key(), error = %e, "rejected metric sample");
            return Err(e);
        }
        self.ensure_run(run_id)?;

        let slot = self.slot(run_id, sample.key());
        let mut state = slot.write();
        if let Err(e) = self.sink.append(run_id, &sample) {
            warn!(run_id, key = sample.key(), error = %e, "metric sink append failed");
            let unused = state.history.is_empty();
            drop(state);
            if unused {
                self.discard_unused_slot(run_id, sample.key(), slot);
            }
            return Err(e);
        }
        debug!(
            run_id,
            key = sample.key(),
            timestamp = sample.timestamp(),
            step = sample.step(),
            "recorded metric sample"
        );
        state.apply(sample)
    }

    /// Record samples in order. Stops at the first failure.
    ///
    /// Each sample is applied atomically on its own; samples before the
    /// failing one stay recorded.
    ///
    /// # Errors
    ///
    /// Same as [`record`](Self::record).
    pub fn record_batch(
        &self,
        run_id: &str,
        samples: impl IntoIterator<Item = MetricSample>,
    ) -> Result<usize> {
        let mut recorded = 0;
        for sample in samples {
            self.record(run_id, sample)?;
            recorded += 1;
        }
        Ok(recorded)
    }

    /// Current summary of a metric, or `None` if nothing was recorded for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run is not registered.
    pub fn summary(&self, run_id: &str, key: &str) -> Result<Option<MetricSummary>> {
        self.ensure_run(run_id)?;
        Ok(self
            .existing_slot(run_id, key)
            .and_then(|slot| slot.read().summary.clone()))
    }

    /// Full history of a metric in append order; empty if nothing was
    /// recorded for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run is not registered.
    pub fn history(&self, run_id: &str, key: &str) -> Result<MetricHistory> {
        self.ensure_run(run_id)?;
        Ok(self
            .existing_slot(run_id, key)
            .map_or_else(|| MetricHistory::new(run_id, key), |slot| slot.read().history.clone()))
    }

    /// History and summary of a metric, read under one lock acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run is not registered.
    pub fn snapshot(&self, run_id: &str, key: &str) -> Result<(MetricHistory, Option<MetricSummary>)> {
        self.ensure_run(run_id)?;
        Ok(self.existing_slot(run_id, key).map_or_else(
            || (MetricHistory::new(run_id, key), None),
            |slot| {
                let state = slot.read();
                (state.history.clone(), state.summary.clone())
            },
        ))
    }

    /// Metric keys with at least one recorded sample, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run is not registered.
    pub fn metric_keys(&self, run_id: &str) -> Result<Vec<String>> {
        self.ensure_run(run_id)?;
        let mut keys: Vec<String> = self
            .run_slots(run_id)
            .iter()
            .filter_map(|slot| {
                let state = slot.read();
                (!state.history.is_empty()).then(|| state.history.metric_key().to_string())
            })
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Read projection of a run: latest/min/max per key, params and tags.
    ///
    /// Each key is read under its own lock, so every key's projections come
    /// from the same history state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run is not registered.
    pub fn run_data(&self, run_id: &str) -> Result<RunData> {
        self.ensure_run(run_id)?;
        let builder = self
            .run_slots(run_id)
            .iter()
            .fold(RunData::builder(), |builder, slot| {
                match slot.read().summary.as_ref() {
                    Some(summary) => builder.summary(summary),
                    None => builder,
                }
            });
        Ok(builder
            .params(self.params.entries(run_id))
            .tags(self.tags.entries(run_id))
            .build())
    }

    /// Latest/min/max rows of every key of a run, ordered by
    /// `(key, summary_type)`. Keys whose history is all NaN have no min/max rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run is not registered.
    pub fn summary_rows(&self, run_id: &str) -> Result<Vec<SummaryRow>> {
        self.ensure_run(run_id)?;
        let mut rows: Vec<SummaryRow> = Vec::new();
        for slot in self.run_slots(run_id) {
            let state = slot.read();
            if let Some(summary) = state.summary.as_ref() {
                rows.extend(SummaryType::ALL.into_iter().filter_map(|summary_type| {
                    summary
                        .get(summary_type)
                        .map(|sample| SummaryRow::new(run_id, summary_type, sample))
                }));
            }
        }
        rows.sort_by(|a, b| a.key.cmp(&b.key).then(a.summary_type.cmp(&b.summary_type)));
        Ok(rows)
    }

    /// Set a run param (last write wins).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run is not registered.
    pub fn log_param(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        self.ensure_run(run_id)?;
        self.params.set(run_id, key, value);
        Ok(())
    }

    /// Set a run tag (last write wins).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run is not registered.
    pub fn set_tag(&self, run_id: &str, key: &str, value: &str) -> Result<()> {
        self.ensure_run(run_id)?;
        self.tags.set(run_id, key, value);
        Ok(())
    }

    /// Check that `history` can be replayed without touching any state.
    pub(crate) fn check_restorable(&self, history: &MetricHistory) -> Result<()> {
        for sample in history {
            sample.validate(self.config.allow_negative)?;
        }
        if self.owns_registry {
            Ok(())
        } else {
            self.ensure_run(history.run_id())
        }
    }

    /// Replay a persisted history into the store.
    ///
    /// Samples are appended after any already held for the key, without going
    /// back through the sink. With the store's own registry the run is
    /// registered if needed; an external registry (see
    /// [`RunMetricStoreBuilder::registry`]) is never written to, so the run
    /// must already exist there.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if a sample fails boundary validation,
    /// or [`Error::NotFound`] if an external registry does not know the run.
    /// No sample of the history is applied in either case.
    pub fn restore(&self, history: MetricHistory) -> Result<usize> {
        self.check_restorable(&history)?;
        let run_id = history.run_id().to_string();
        let key = history.metric_key().to_string();
        if self.owns_registry {
            self.registry.register(&run_id);
        }

        let slot = self.slot(&run_id, &key);
        let mut state = slot.write();
        let samples = history.into_samples();
        let restored = samples.len();
        for sample in samples {
            state.apply(sample)?;
        }
        info!(run_id = %run_id, key = %key, restored, "restored metric history");
        Ok(restored)
    }

    /// Reload one (run, key) history from the sink and replay it.
    ///
    /// # Errors
    ///
    /// Propagates sink failures and [`restore`](Self::restore) errors.
    pub fn restore_from_sink(&self, run_id: &str, key: &str) -> Result<usize> {
        let samples = self.sink.load(run_id, key)?;
        self.restore(MetricHistory::from_samples(run_id, key, samples)?)
    }

    /// Every recorded history of a run, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the run is not registered.
    pub fn histories(&self, run_id: &str) -> Result<Vec<MetricHistory>> {
        self.ensure_run(run_id)?;
        let mut histories: Vec<MetricHistory> = self
            .run_slots(run_id)
            .iter()
            .map(|slot| slot.read().history.clone())
            .filter(|history| !history.is_empty())
            .collect();
        histories.sort_by(|a, b| a.metric_key().cmp(b.metric_key()));
        Ok(histories)
    }

    /// Recompute every summary from its history in parallel and return the
    /// `(run_id, key)` pairs whose incrementally maintained summary differs.
    ///
    /// An empty result means every summary is reproducible from its history.
    #[must_use]
    pub fn verify_summaries(&self) -> Vec<(String, String)> {
        let slots: Vec<KeySlot> = self
            .runs
            .iter()
            .flat_map(|run| {
                run.value()
                    .keys
                    .iter()
                    .map(|slot| Arc::clone(slot.value()))
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut drifted: Vec<(String, String)> = slots
            .par_iter()
            .filter_map(|slot| {
                let state = slot.read();
                (state.history.summarize() != state.summary).then(|| {
                    (
                        state.history.run_id().to_string(),
                        state.history.metric_key().to_string(),
                    )
                })
            })
            .collect();
        drifted.sort();
        if !drifted.is_empty() {
            warn!(count = drifted.len(), "metric summaries drifted from history");
        }
        drifted
    }
}

impl Default for RunMetricStore {
    fn default() -> Self {
        Self::new()
    }
}
