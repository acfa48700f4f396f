//! Metric sinks - durable append/read of metric samples.
//!
//! The store calls [`MetricSink::append`] while it holds the per-key write
//! lock and before touching in-memory state, so a failing sink leaves the
//! history and summary exactly as they were.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::metric::MetricSample;
use crate::{Error, Result};

/// Persistence collaborator for metric samples keyed by (run, key).
pub trait MetricSink: Send + Sync {
    /// Durably append a sample to the (run, `sample.key()`) log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sink`] if the sample could not be persisted.
    fn append(&self, run_id: &str, sample: &MetricSample) -> Result<()>;

    /// Read the full (run, key) log in append order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sink`] if the log could not be read.
    fn load(&self, run_id: &str, key: &str) -> Result<Vec<MetricSample>>;
}

/// Sink that persists nothing. Used when the store is purely in-memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricSink for NullSink {
    fn append(&self, _run_id: &str, _sample: &MetricSample) -> Result<()> {
        Ok(())
    }

    fn load(&self, _run_id: &str, _key: &str) -> Result<Vec<MetricSample>> {
        Ok(Vec::new())
    }
}

/// In-memory sink keeping its own copy of every appended sample.
///
/// Useful as a stand-in for a database table in tests, and as the source for
/// [`RunMetricStore::restore`](super::RunMetricStore::restore).
pub struct MemorySink {
    rows: DashMap<(String, String), Vec<MetricSample>, FxBuildHasher>,
    held: AtomicUsize,
    capacity: Option<usize>,
}

impl MemorySink {
    /// Create an unbounded sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: DashMap::with_hasher(FxBuildHasher),
            held: AtomicUsize::new(0),
            capacity: None,
        }
    }

    /// Create a sink that refuses appends once it holds `capacity` samples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: DashMap::with_hasher(FxBuildHasher),
            held: AtomicUsize::new(0),
            capacity: Some(capacity),
        }
    }

    /// Total number of samples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.load(Ordering::Acquire)
    }

    /// Check if the sink is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every (run, key) pair with at least one sample.
    #[must_use]
    pub fn keys(&self) -> Vec<(String, String)> {
        let mut keys: Vec<_> = self.rows.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricSink for MemorySink {
    fn append(&self, run_id: &str, sample: &MetricSample) -> Result<()> {
        // Reserve the slot before inserting so concurrent appends cannot overshoot
        let limit = self.capacity.unwrap_or(usize::MAX);
        if self
            .held
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                (held < limit).then_some(held + 1)
            })
            .is_err()
        {
            return Err(Error::Sink(format!(
                "sink full ({limit} samples), cannot append '{}' for run {run_id}",
                sample.key()
            )));
        }
        self.rows
            .entry((run_id.to_string(), sample.key().to_string()))
            .or_default()
            .push(sample.clone());
        Ok(())
    }

    fn load(&self, run_id: &str, key: &str) -> Result<Vec<MetricSample>> {
        Ok(self
            .rows
            .get(&(run_id.to_string(), key.to_string()))
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}
