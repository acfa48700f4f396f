//! Run Data - the externally visible read projection of a run

use std::collections::BTreeMap;

use crate::metric::{MetricSample, MetricSummary, SummaryType};

/// Metric summaries, params and tags of one run, keyed by name.
///
/// - `metrics`: latest value per metric key
/// - `metric_minimums` / `metric_maximums`: NaN-excluded extrema; a key whose
///   history is all NaN is absent here but present in `metrics`
/// - `params` / `tags`: last-write-wins string maps
///
/// The backing samples are kept alongside the value maps so the wire layer
/// can emit full `(key, value, timestamp, step)` records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunData {
    latest: BTreeMap<String, MetricSample>,
    minimums: BTreeMap<String, MetricSample>,
    maximums: BTreeMap<String, MetricSample>,
    params: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
}

fn values(samples: &BTreeMap<String, MetricSample>) -> BTreeMap<String, f64> {
    samples
        .iter()
        .map(|(key, sample)| (key.clone(), sample.value()))
        .collect()
}

impl RunData {
    /// Create a reducer that folds ordered entries into a `RunData`.
    #[must_use]
    pub fn builder() -> RunDataBuilder {
        RunDataBuilder::default()
    }

    /// Latest value per metric key.
    #[must_use]
    pub fn metrics(&self) -> BTreeMap<String, f64> {
        values(&self.latest)
    }

    /// Minimum value per metric key.
    #[must_use]
    pub fn metric_minimums(&self) -> BTreeMap<String, f64> {
        values(&self.minimums)
    }

    /// Maximum value per metric key.
    #[must_use]
    pub fn metric_maximums(&self) -> BTreeMap<String, f64> {
        values(&self.maximums)
    }

    /// Param values by key.
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Tag values by key.
    #[must_use]
    pub const fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Samples backing the given projection, by metric key.
    #[must_use]
    pub const fn summary_samples(&self, summary_type: SummaryType) -> &BTreeMap<String, MetricSample> {
        match summary_type {
            SummaryType::Latest => &self.latest,
            SummaryType::Min => &self.minimums,
            SummaryType::Max => &self.maximums,
        }
    }

    /// Values of the given projection, by metric key.
    #[must_use]
    pub fn summary_values(&self, summary_type: SummaryType) -> BTreeMap<String, f64> {
        values(self.summary_samples(summary_type))
    }

    /// Whether no metric, param or tag is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty() && self.params.is_empty() && self.tags.is_empty()
    }
}

/// Reducer over ordered metric, param and tag entries.
///
/// Every map is a projection of the entries fed in; a later entry for the
/// same key overwrites an earlier one.
#[derive(Debug, Default)]
pub struct RunDataBuilder {
    data: RunData,
}

impl RunDataBuilder {
    /// Record the latest sample of a metric.
    #[must_use]
    pub fn metric(mut self, sample: &MetricSample) -> Self {
        self.data
            .latest
            .insert(sample.key().to_string(), sample.clone());
        self
    }

    /// Record the minimum sample of a metric.
    #[must_use]
    pub fn metric_minimum(mut self, sample: &MetricSample) -> Self {
        self.data
            .minimums
            .insert(sample.key().to_string(), sample.clone());
        self
    }

    /// Record the maximum sample of a metric.
    #[must_use]
    pub fn metric_maximum(mut self, sample: &MetricSample) -> Self {
        self.data
            .maximums
            .insert(sample.key().to_string(), sample.clone());
        self
    }

    /// Record a sample under the given projection.
    #[must_use]
    pub fn summary_sample(self, summary_type: SummaryType, sample: &MetricSample) -> Self {
        match summary_type {
            SummaryType::Latest => self.metric(sample),
            SummaryType::Min => self.metric_minimum(sample),
            SummaryType::Max => self.metric_maximum(sample),
        }
    }

    /// Record every projection of a summary.
    #[must_use]
    pub fn summary(mut self, summary: &MetricSummary) -> Self {
        for summary_type in SummaryType::ALL {
            if let Some(sample) = summary.get(summary_type) {
                self = self.summary_sample(summary_type, sample);
            }
        }
        self
    }

    /// Record a param.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.params.insert(key.into(), value.into());
        self
    }

    /// Record every param in order.
    #[must_use]
    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            self = self.param(key, value);
        }
        self
    }

    /// Record a tag.
    #[must_use]
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.tags.insert(key.into(), value.into());
        self
    }

    /// Record every tag in order.
    #[must_use]
    pub fn tags<K, V>(mut self, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in tags {
            self = self.tag(key, value);
        }
        self
    }

    /// Build the `RunData`.
    #[must_use]
    pub fn build(self) -> RunData {
        self.data
    }
}
