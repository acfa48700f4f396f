//! Metric Summary - derived latest/min/max projections for one (run, key)

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ordering::{is_new_max, is_new_min, latest, supersedes};
use super::MetricSample;

/// Which projection of a metric a summary value represents.
///
/// The discriminants match the `summary_type` column of the latest-metrics
/// table, where rows are keyed by `(key, run_id, summary_type)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryType {
    /// Most recent sample by (timestamp, step).
    Latest = 0,
    /// Smallest comparable value.
    Min = 1,
    /// Largest comparable value.
    Max = 2,
}

impl SummaryType {
    /// All summary types, in column order.
    pub const ALL: [Self; 3] = [Self::Latest, Self::Min, Self::Max];

    /// Integer code stored in the `summary_type` column.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Inverse of [`SummaryType::code`].
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Latest),
            1 => Some(Self::Min),
            2 => Some(Self::Max),
            _ => None,
        }
    }

    /// Display label for a metric column, e.g. `"Min loss"`.
    #[must_use]
    pub fn label(self, metric_key: &str) -> String {
        format!("{self} {metric_key}")
    }
}

impl fmt::Display for SummaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("Latest"),
            Self::Min => f.write_str("Min"),
            Self::Max => f.write_str("Max"),
        }
    }
}

/// Latest, minimum and maximum samples of a non-empty metric history.
///
/// A summary only exists once at least one sample has been observed, so
/// "empty history" is expressed as `Option<MetricSummary>::None` rather than
/// zeroed fields. `minimum`/`maximum` skip NaN values and are `None` when
/// every observed value was NaN.
///
/// Summaries are never built by callers; they come out of the store or
/// [`MetricHistory::summarize`](super::MetricHistory::summarize).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSummary {
    current: MetricSample,
    minimum: Option<MetricSample>,
    maximum: Option<MetricSample>,
}

impl MetricSummary {
    /// Start a summary from the first sample of a history.
    pub(crate) fn first(sample: &MetricSample) -> Self {
        let comparable = (!sample.is_nan()).then(|| sample.clone());
        Self {
            current: sample.clone(),
            minimum: comparable.clone(),
            maximum: comparable,
        }
    }

    /// Fold one appended sample into the summary in O(1).
    pub(crate) fn observe(&mut self, sample: &MetricSample) {
        if supersedes(sample, &self.current) {
            self.current = sample.clone();
        }
        if is_new_min(sample.value(), self.min_value()) {
            self.minimum = Some(sample.clone());
        }
        if is_new_max(sample.value(), self.max_value()) {
            self.maximum = Some(sample.clone());
        }
    }

    /// Recompute a summary from scratch over samples in append order.
    pub(crate) fn from_samples(samples: &[MetricSample]) -> Option<Self> {
        let current = latest(samples)?.clone();
        let mut minimum: Option<&MetricSample> = None;
        let mut maximum: Option<&MetricSample> = None;
        for sample in samples {
            if is_new_min(sample.value(), minimum.map(MetricSample::value)) {
                minimum = Some(sample);
            }
            if is_new_max(sample.value(), maximum.map(MetricSample::value)) {
                maximum = Some(sample);
            }
        }
        Some(Self {
            current,
            minimum: minimum.cloned(),
            maximum: maximum.cloned(),
        })
    }

    /// The latest sample.
    #[must_use]
    pub const fn current(&self) -> &MetricSample {
        &self.current
    }

    /// Value of the latest sample (may be NaN).
    #[must_use]
    pub const fn current_value(&self) -> f64 {
        self.current.value()
    }

    /// Timestamp of the latest sample.
    #[must_use]
    pub const fn current_timestamp(&self) -> i64 {
        self.current.timestamp()
    }

    /// Step of the latest sample.
    #[must_use]
    pub const fn current_step(&self) -> i64 {
        self.current.step()
    }

    /// The sample holding the minimum value, if any value was comparable.
    #[must_use]
    pub const fn minimum(&self) -> Option<&MetricSample> {
        self.minimum.as_ref()
    }

    /// The sample holding the maximum value, if any value was comparable.
    #[must_use]
    pub const fn maximum(&self) -> Option<&MetricSample> {
        self.maximum.as_ref()
    }

    /// Minimum value, NaN excluded.
    #[must_use]
    pub fn min_value(&self) -> Option<f64> {
        self.minimum.as_ref().map(MetricSample::value)
    }

    /// Maximum value, NaN excluded.
    #[must_use]
    pub fn max_value(&self) -> Option<f64> {
        self.maximum.as_ref().map(MetricSample::value)
    }

    /// Sample backing the given projection.
    #[must_use]
    pub const fn get(&self, summary_type: SummaryType) -> Option<&MetricSample> {
        match summary_type {
            SummaryType::Latest => Some(&self.current),
            SummaryType::Min => self.minimum.as_ref(),
            SummaryType::Max => self.maximum.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(value: f64, timestamp: i64, step: i64) -> MetricSample {
        MetricSample::new("loss", value, timestamp, step)
    }

    fn observe_all(samples: &[MetricSample]) -> MetricSummary {
        let mut summary = MetricSummary::first(&samples[0]);
        for s in &samples[1..] {
            summary.observe(s);
        }
        summary
    }

    #[test]
    fn test_single_sample_is_current_min_and_max() {
        let summary = MetricSummary::first(&sample(0.7, 10, 0));
        assert_eq!(summary.current_value(), 0.7);
        assert_eq!(summary.min_value(), Some(0.7));
        assert_eq!(summary.max_value(), Some(0.7));
    }

    #[test]
    fn test_newer_sample_replaces_current() {
        let summary = observe_all(&[sample(0.9, 100, 0), sample(0.5, 200, 1)]);
        assert_eq!(summary.current_value(), 0.5);
        assert_eq!(summary.current_timestamp(), 200);
        assert_eq!(summary.current_step(), 1);
        assert_eq!(summary.min_value(), Some(0.5));
        assert_eq!(summary.max_value(), Some(0.9));
    }

    #[test]
    fn test_out_of_order_sample_does_not_replace_current() {
        let summary = observe_all(&[sample(0.5, 200, 1), sample(0.1, 100, 0)]);
        assert_eq!(summary.current_value(), 0.5);
        assert_eq!(summary.min_value(), Some(0.1));
    }

    #[test]
    fn test_all_nan_has_no_extrema() {
        let summary = observe_all(&[sample(f64::NAN, 1, 0), sample(f64::NAN, 2, 1)]);
        assert!(summary.current_value().is_nan());
        assert_eq!(summary.min_value(), None);
        assert_eq!(summary.max_value(), None);
    }

    #[test]
    fn test_nan_then_number_sets_extrema() {
        let summary = observe_all(&[sample(f64::NAN, 1, 0), sample(3.0, 0, 0)]);
        assert!(summary.current_value().is_nan());
        assert_eq!(summary.min_value(), Some(3.0));
        assert_eq!(summary.max_value(), Some(3.0));
    }

    #[test]
    fn test_equal_extremum_keeps_first_sample() {
        let summary = observe_all(&[sample(1.0, 1, 0), sample(1.0, 2, 1)]);
        assert_eq!(summary.minimum().map(MetricSample::step), Some(0));
        assert_eq!(summary.maximum().map(MetricSample::step), Some(0));
    }

    #[test]
    fn test_incremental_matches_batch() {
        let samples = vec![
            sample(0.9, 100, 0),
            sample(f64::NAN, 300, 2),
            sample(0.5, 200, 1),
            sample(0.7, 300, 2),
            sample(f64::INFINITY, 50, 9),
        ];
        assert_eq!(
            Some(observe_all(&samples)),
            MetricSummary::from_samples(&samples)
        );
    }

    #[test]
    fn test_from_samples_empty_is_none() {
        assert!(MetricSummary::from_samples(&[]).is_none());
    }

    #[test]
    fn test_get_by_summary_type() {
        let summary = observe_all(&[sample(2.0, 1, 0), sample(1.0, 2, 1), sample(3.0, 0, 0)]);
        assert_eq!(summary.get(SummaryType::Latest).map(MetricSample::value), Some(1.0));
        assert_eq!(summary.get(SummaryType::Min).map(MetricSample::value), Some(1.0));
        assert_eq!(summary.get(SummaryType::Max).map(MetricSample::value), Some(3.0));
    }

    #[test]
    fn test_summary_type_codes_and_labels() {
        for ty in SummaryType::ALL {
            assert_eq!(SummaryType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(SummaryType::from_code(7), None);
        assert_eq!(SummaryType::Latest.label("loss"), "Latest loss");
        assert_eq!(SummaryType::Min.label("loss"), "Min loss");
        assert_eq!(SummaryType::Max.label("acc"), "Max acc");
    }
}
