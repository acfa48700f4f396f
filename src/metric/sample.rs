//! Metric Sample - a single (key, value, timestamp, step) observation

use std::hash::{Hash, Hasher};

use chrono::{DateTime, TimeZone, Utc};

use crate::{Error, Result};

/// A single metric observation.
///
/// Samples are immutable once created. Equality and hashing cover the full
/// `(key, value, timestamp, step)` tuple; `value` is compared by bit pattern so
/// a NaN sample equals an identical NaN sample and can be hashed. As a
/// consequence `0.0` and `-0.0` are distinct samples.
///
/// NaN and infinite values are valid metric values (a diverging loss is still
/// a loss) and are never rejected.
#[derive(Debug, Clone)]
pub struct MetricSample {
    key: String,
    value: f64,
    timestamp: i64,
    step: i64,
}

impl MetricSample {
    /// Create a new metric sample.
    ///
    /// # Arguments
    ///
    /// * `key` - Metric name/key (e.g., "loss", "accuracy")
    /// * `value` - Metric value, NaN and ±Inf allowed
    /// * `timestamp` - Wall-clock time in milliseconds since the Unix epoch
    /// * `step` - Logical x-coordinate (training step, epoch)
    #[must_use]
    pub fn new(key: impl Into<String>, value: f64, timestamp: i64, step: i64) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp,
            step,
        }
    }

    /// Create a sample stamped with the current wall-clock time.
    #[must_use]
    pub fn now(key: impl Into<String>, value: f64, step: i64) -> Self {
        Self::new(key, value, Utc::now().timestamp_millis(), step)
    }

    /// Create a sample, rejecting an empty key or a negative timestamp/step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if the sample is malformed.
    pub fn try_new(key: impl Into<String>, value: f64, timestamp: i64, step: i64) -> Result<Self> {
        let sample = Self::new(key, value, timestamp, step);
        sample.validate(false)?;
        Ok(sample)
    }

    /// Create a builder for constructing a sample with optional fields.
    #[must_use]
    pub fn builder(key: impl Into<String>, value: f64) -> MetricSampleBuilder {
        MetricSampleBuilder::new(key, value)
    }

    /// Get the metric key/name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the metric value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the timestamp in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Get the step.
    #[must_use]
    pub const fn step(&self) -> i64 {
        self.step
    }

    /// Get the timestamp as a UTC datetime, if it is representable.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// Whether the value is NaN.
    #[must_use]
    pub fn is_nan(&self) -> bool {
        self.value.is_nan()
    }

    /// Check the sample at the store boundary.
    ///
    /// NaN and infinite values always pass. Negative timestamps and steps pass
    /// only when `allow_negative` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] describing the first violated rule.
    pub fn validate(&self, allow_negative: bool) -> Result<()> {
        if self.key.is_empty() {
            return Err(Error::InvalidValue("metric key must not be empty".to_string()));
        }
        if !allow_negative {
            if self.timestamp < 0 {
                return Err(Error::InvalidValue(format!(
                    "metric '{}': timestamp must be non-negative, got {}",
                    self.key, self.timestamp
                )));
            }
            if self.step < 0 {
                return Err(Error::InvalidValue(format!(
                    "metric '{}': step must be non-negative, got {}",
                    self.key, self.step
                )));
            }
        }
        Ok(())
    }
}

impl PartialEq for MetricSample {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.value.to_bits() == other.value.to_bits()
            && self.timestamp == other.timestamp
            && self.step == other.step
    }
}

impl Eq for MetricSample {}

impl Hash for MetricSample {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.value.to_bits().hash(state);
        self.timestamp.hash(state);
        self.step.hash(state);
    }
}

/// Builder for `MetricSample`.
#[derive(Debug)]
pub struct MetricSampleBuilder {
    key: String,
    value: f64,
    timestamp: i64,
    step: i64,
}

impl MetricSampleBuilder {
    /// Create a new builder; timestamp defaults to now, step to 0.
    #[must_use]
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
            timestamp: Utc::now().timestamp_millis(),
            step: 0,
        }
    }

    /// Set a custom timestamp in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn timestamp_millis(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set a custom timestamp from a UTC datetime.
    #[must_use]
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp.timestamp_millis();
        self
    }

    /// Set the step.
    #[must_use]
    pub const fn step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    /// Build the `MetricSample`.
    #[must_use]
    pub fn build(self) -> MetricSample {
        MetricSample::new(self.key, self.value, self.timestamp, self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_new() {
        let sample = MetricSample::new("loss", 0.5, 100, 3);
        assert_eq!(sample.key(), "loss");
        assert!((sample.value() - 0.5).abs() < f64::EPSILON);
        assert_eq!(sample.timestamp(), 100);
        assert_eq!(sample.step(), 3);
    }

    #[test]
    fn test_nan_samples_are_equal_and_hashable() {
        let a = MetricSample::new("loss", f64::NAN, 1, 1);
        let b = MetricSample::new("loss", f64::NAN, 1, 1);
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_equality_covers_every_field() {
        let base = MetricSample::new("loss", 1.0, 10, 1);
        assert_ne!(base, MetricSample::new("acc", 1.0, 10, 1));
        assert_ne!(base, MetricSample::new("loss", 2.0, 10, 1));
        assert_ne!(base, MetricSample::new("loss", 1.0, 11, 1));
        assert_ne!(base, MetricSample::new("loss", 1.0, 10, 2));
    }

    #[test]
    fn test_validate_accepts_non_finite_values() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(MetricSample::new("loss", value, 0, 0).validate(false).is_ok());
        }
    }

    #[test]
    fn test_validate_rejects_negative_unless_allowed() {
        let sample = MetricSample::new("loss", 1.0, -5, 0);
        assert!(sample.validate(false).unwrap_err().is_invalid_value());
        assert!(sample.validate(true).is_ok());

        let sample = MetricSample::new("loss", 1.0, 5, -1);
        assert!(sample.validate(false).is_err());
    }

    #[test]
    fn test_try_new_rejects_empty_key() {
        assert!(MetricSample::try_new("", 1.0, 0, 0).is_err());
    }

    #[test]
    fn test_builder_and_datetime() {
        let when = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let sample = MetricSample::builder("acc", 0.9).timestamp(when).step(7).build();
        assert_eq!(sample.timestamp(), 1_700_000_000_123);
        assert_eq!(sample.step(), 7);
        assert_eq!(sample.datetime(), Some(when));
    }
}
