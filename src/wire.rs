//! Wire records - serde representations of samples, histories and run data
//!
//! JSON has no literal for NaN or infinities, so metric values travel as a
//! number when finite and as one of the strings `"NaN"`, `"Infinity"`,
//! `"-Infinity"` otherwise. Any other string, a `null`, or an ill-typed
//! timestamp/step is rejected with [`Error::InvalidValue`] when the record is
//! turned back into a [`MetricSample`].
//!
//! ```rust
//! use trueno_metrics::metric::MetricSample;
//! use trueno_metrics::wire::{self, MetricRecord};
//!
//! let sample = MetricSample::new("loss", f64::NAN, 300, 2);
//! let json = wire::encode(&MetricRecord::from(&sample))?;
//! assert_eq!(json, r#"{"key":"loss","value":"NaN","timestamp":300,"step":2}"#);
//!
//! let record: MetricRecord = wire::decode(&json)?;
//! assert_eq!(record.into_sample(false)?, sample);
//! # Ok::<(), trueno_metrics::Error>(())
//! ```

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::error::Category;

use crate::metric::{MetricHistory, MetricSample, SummaryType};
use crate::run::RunData;
use crate::{Error, Result};

/// A metric value as it appears on the wire.
///
/// A non-finite `Number` is written in its spelled-out form, so every value
/// built in code survives an encode/decode cycle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    /// Finite number.
    Number(f64),
    /// Non-finite value spelled out, or garbage to be rejected on decode.
    Text(String),
    /// Explicit `null`.
    Null,
}

impl WireValue {
    /// Encode a value, spelling out non-finite values.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Self::Text("NaN".to_string())
        } else if value == f64::INFINITY {
            Self::Text("Infinity".to_string())
        } else if value == f64::NEG_INFINITY {
            Self::Text("-Infinity".to_string())
        } else {
            Self::Number(value)
        }
    }

    /// Decode a value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for `null` or a non-numeric string.
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Text(text) => match text.as_str() {
                "NaN" | "nan" => Ok(f64::NAN),
                "Infinity" | "inf" | "+Infinity" => Ok(f64::INFINITY),
                "-Infinity" | "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(Error::InvalidValue(format!(
                    "metric value must be numeric, got \"{other}\""
                ))),
            },
            Self::Null => Err(Error::InvalidValue(
                "metric value must be numeric, got null".to_string(),
            )),
        }
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Number(value) if value.is_finite() => serializer.serialize_f64(*value),
            Self::Number(value) => Self::from_f64(*value).serialize(serializer),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Null => serializer.serialize_none(),
        }
    }
}

/// Wire form of a [`MetricSample`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Metric key.
    pub key: String,
    /// Metric value.
    pub value: WireValue,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Step.
    pub step: i64,
}

impl MetricRecord {
    /// Convert to a sample, applying boundary validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a non-numeric value, an empty key,
    /// or (unless `allow_negative`) a negative timestamp or step.
    pub fn into_sample(self, allow_negative: bool) -> Result<MetricSample> {
        let value = self.value.to_f64()?;
        let sample = MetricSample::new(self.key, value, self.timestamp, self.step);
        sample.validate(allow_negative)?;
        Ok(sample)
    }
}

impl From<&MetricSample> for MetricRecord {
    fn from(sample: &MetricSample) -> Self {
        Self {
            key: sample.key().to_string(),
            value: WireValue::from_f64(sample.value()),
            timestamp: sample.timestamp(),
            step: sample.step(),
        }
    }
}

impl TryFrom<MetricRecord> for MetricSample {
    type Error = Error;

    fn try_from(record: MetricRecord) -> Result<Self> {
        record.into_sample(false)
    }
}

/// Wire form of a [`MetricHistory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricHistoryRecord {
    /// Run the history belongs to.
    pub run_id: String,
    /// Metric key of every sample.
    pub metric_key: String,
    /// Samples in append order.
    pub metrics: Vec<MetricRecord>,
}

impl MetricHistoryRecord {
    /// Convert to a history, validating every sample.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if any sample is malformed or carries
    /// a key other than `metric_key`.
    pub fn into_history(self, allow_negative: bool) -> Result<MetricHistory> {
        let samples = self
            .metrics
            .into_iter()
            .map(|record| record.into_sample(allow_negative))
            .collect::<Result<Vec<_>>>()?;
        MetricHistory::from_samples(self.run_id, self.metric_key, samples)
    }
}

impl From<&MetricHistory> for MetricHistoryRecord {
    fn from(history: &MetricHistory) -> Self {
        Self {
            run_id: history.run_id().to_string(),
            metric_key: history.metric_key().to_string(),
            metrics: history.iter().map(MetricRecord::from).collect(),
        }
    }
}

/// Wire form of a param or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueRecord {
    /// Key.
    pub key: String,
    /// Value.
    pub value: String,
}

/// Wire form of [`RunData`]: flat lists, later entries overwrite earlier ones
/// when folded back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDataRecord {
    /// Latest sample per key.
    pub metrics: Vec<MetricRecord>,
    /// Minimum sample per key.
    pub metric_minimums: Vec<MetricRecord>,
    /// Maximum sample per key.
    pub metric_maximums: Vec<MetricRecord>,
    /// Params.
    pub params: Vec<KeyValueRecord>,
    /// Tags.
    pub tags: Vec<KeyValueRecord>,
}

impl RunDataRecord {
    /// Fold the lists back into a [`RunData`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if any metric record is malformed.
    pub fn into_run_data(self) -> Result<RunData> {
        let mut builder = RunData::builder();
        let lists = [
            (SummaryType::Latest, self.metrics),
            (SummaryType::Min, self.metric_minimums),
            (SummaryType::Max, self.metric_maximums),
        ];
        for (summary_type, records) in lists {
            for record in records {
                let sample = record.into_sample(true)?;
                builder = builder.summary_sample(summary_type, &sample);
            }
        }
        Ok(builder
            .params(self.params.into_iter().map(|kv| (kv.key, kv.value)))
            .tags(self.tags.into_iter().map(|kv| (kv.key, kv.value)))
            .build())
    }
}

impl From<&RunData> for RunDataRecord {
    fn from(data: &RunData) -> Self {
        let records = |summary_type: SummaryType| -> Vec<MetricRecord> {
            data.summary_samples(summary_type)
                .values()
                .map(MetricRecord::from)
                .collect()
        };
        let pairs = |map: &BTreeMap<String, String>| -> Vec<KeyValueRecord> {
            map.iter()
                .map(|(key, value)| KeyValueRecord {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect()
        };
        Self {
            metrics: records(SummaryType::Latest),
            metric_minimums: records(SummaryType::Min),
            metric_maximums: records(SummaryType::Max),
            params: pairs(data.params()),
            tags: pairs(data.tags()),
        }
    }
}

/// One row of the summary table, keyed by `(key, run_id, summary_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Metric key.
    pub key: String,
    /// Run ID.
    pub run_id: String,
    /// Which projection this row holds.
    pub summary_type: SummaryType,
    /// Projected value.
    pub value: WireValue,
    /// Timestamp of the backing sample.
    pub timestamp: i64,
    /// Step of the backing sample.
    pub step: i64,
    /// Whether the value is NaN.
    pub is_nan: bool,
}

impl SummaryRow {
    /// Build a row for a projected sample.
    #[must_use]
    pub fn new(run_id: &str, summary_type: SummaryType, sample: &MetricSample) -> Self {
        Self {
            key: sample.key().to_string(),
            run_id: run_id.to_string(),
            summary_type,
            value: WireValue::from_f64(sample.value()),
            timestamp: sample.timestamp(),
            step: sample.step(),
            is_nan: sample.is_nan(),
        }
    }
}

/// Serialize a wire record to JSON.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if serialization fails.
pub fn encode<T: Serialize>(record: &T) -> Result<String> {
    Ok(serde_json::to_string(record)?)
}

/// Deserialize a wire record from JSON.
///
/// Ill-typed fields (a string timestamp, a fractional step) are reported as
/// [`Error::InvalidValue`]; syntax errors as [`Error::Serialization`].
///
/// # Errors
///
/// See above.
pub fn decode<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| match e.classify() {
        Category::Data => Error::InvalidValue(e.to_string()),
        _ => Error::Serialization(e),
    })
}
