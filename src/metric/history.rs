//! Metric History - append-only log of samples for one (run, key)

use super::{MetricSample, MetricSummary};
use crate::{Error, Result};

/// Ordered, append-only log of samples for a single run and metric key.
///
/// Samples stay in insertion order and are never reordered or edited. Two
/// histories are equal iff their run, key and sample sequences match
/// element-wise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricHistory {
    run_id: String,
    metric_key: String,
    samples: Vec<MetricSample>,
}

impl MetricHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new(run_id: impl Into<String>, metric_key: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            metric_key: metric_key.into(),
            samples: Vec::new(),
        }
    }

    /// Build a history from samples already in append order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if any sample belongs to another key.
    pub fn from_samples(
        run_id: impl Into<String>,
        metric_key: impl Into<String>,
        samples: impl IntoIterator<Item = MetricSample>,
    ) -> Result<Self> {
        let mut history = Self::new(run_id, metric_key);
        for sample in samples {
            history.append(sample)?;
        }
        Ok(history)
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the metric key.
    #[must_use]
    pub fn metric_key(&self) -> &str {
        &self.metric_key
    }

    /// Append a sample to the end of the log.
    ///
    /// Never rejects on value shape (NaN, ±Inf).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if the sample's key differs from the
    /// history's key.
    pub fn append(&mut self, sample: MetricSample) -> Result<()> {
        if sample.key() != self.metric_key {
            return Err(Error::InvalidValue(format!(
                "sample key '{}' does not match history key '{}'",
                sample.key(),
                self.metric_key
            )));
        }
        self.samples.push(sample);
        Ok(())
    }

    /// All samples in append order.
    #[must_use]
    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    /// Iterate samples in append order.
    pub fn iter(&self) -> std::slice::Iter<'_, MetricSample> {
        self.samples.iter()
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recompute the summary from the full history; `None` when empty.
    #[must_use]
    pub fn summarize(&self) -> Option<MetricSummary> {
        MetricSummary::from_samples(&self.samples)
    }

    /// Consume the history, returning its samples.
    #[must_use]
    pub fn into_samples(self) -> Vec<MetricSample> {
        self.samples
    }
}

impl<'a> IntoIterator for &'a MetricHistory {
    type Item = &'a MetricSample;
    type IntoIter = std::slice::Iter<'a, MetricSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut history = MetricHistory::new("run-1", "loss");
        history.append(MetricSample::new("loss", 0.3, 300, 2)).unwrap();
        history.append(MetricSample::new("loss", 0.1, 100, 0)).unwrap();
        history.append(MetricSample::new("loss", f64::NAN, 200, 1)).unwrap();

        let steps: Vec<i64> = history.iter().map(MetricSample::step).collect();
        assert_eq!(steps, vec![2, 0, 1]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_append_rejects_foreign_key() {
        let mut history = MetricHistory::new("run-1", "loss");
        let err = history.append(MetricSample::new("acc", 0.3, 0, 0)).unwrap_err();
        assert!(err.is_invalid_value());
        assert!(history.is_empty());
    }

    #[test]
    fn test_equality_is_order_sensitive() {
        let a = MetricSample::new("loss", 1.0, 1, 0);
        let b = MetricSample::new("loss", 2.0, 2, 1);
        let h1 = MetricHistory::from_samples("run-1", "loss", [a.clone(), b.clone()]).unwrap();
        let h2 = MetricHistory::from_samples("run-1", "loss", [b.clone(), a.clone()]).unwrap();
        let h3 = MetricHistory::from_samples("run-2", "loss", [a.clone(), b.clone()]).unwrap();
        assert_ne!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1, MetricHistory::from_samples("run-1", "loss", [a, b]).unwrap());
    }

    #[test]
    fn test_summarize_empty_is_none() {
        assert!(MetricHistory::new("run-1", "loss").summarize().is_none());
    }
}
