//! Columnar snapshots of metric histories (Arrow/Parquet)
//!
//! **Append-Only Design**: a snapshot is a flat table of samples,
//! one row per sample, written in history order:
//!
//! | column      | type    |
//! |-------------|---------|
//! | `run_id`    | Utf8    |
//! | `metric_key`| Utf8    |
//! | `value`     | Float64 |
//! | `timestamp` | Int64   |
//! | `step`      | Int64   |
//!
//! Parquet stores NaN and infinities natively, so no value is rewritten. A
//! store rebuilt from a snapshot replays every history through
//! [`RunMetricStore::restore`], which recomputes the summaries.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::metric::{MetricHistory, MetricSample};
use crate::store::RunMetricStore;
use crate::{Error, Result};

/// Arrow schema of a history snapshot.
#[must_use]
pub fn history_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("run_id", DataType::Utf8, false),
        Field::new("metric_key", DataType::Utf8, false),
        Field::new("value", DataType::Float64, false),
        Field::new("timestamp", DataType::Int64, false),
        Field::new("step", DataType::Int64, false),
    ]))
}

/// Flatten histories into one record batch, preserving sample order.
///
/// # Errors
///
/// Returns an Arrow error if the batch cannot be assembled.
pub fn histories_to_batch(histories: &[MetricHistory]) -> Result<RecordBatch> {
    // Byte arrays need an exactly sized iterator, so flatten once up front
    let rows: Vec<(&MetricHistory, &MetricSample)> = histories
        .iter()
        .flat_map(|history| history.iter().map(move |sample| (history, sample)))
        .collect();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(rows.iter().map(|(h, _)| h.run_id()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|(h, _)| h.metric_key()))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|(_, s)| s.value()))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|(_, s)| s.timestamp()))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|(_, s)| s.step()))),
    ];

    Ok(RecordBatch::try_new(history_schema(), columns)?)
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|col| col.as_any().downcast_ref::<T>())
        .ok_or_else(|| {
            Error::StorageError(format!("Missing or mistyped column '{name}' in metric snapshot"))
        })
}

/// Group the rows of snapshot batches back into histories.
///
/// Histories come out in order of first appearance; samples keep row order.
///
/// # Errors
///
/// Returns [`Error::StorageError`] if a column is missing or has the wrong
/// type.
pub fn batches_to_histories(batches: &[RecordBatch]) -> Result<Vec<MetricHistory>> {
    let mut histories: Vec<MetricHistory> = Vec::new();
    let mut index: FxHashMap<(String, String), usize> = FxHashMap::default();

    for batch in batches {
        let run_ids = column::<StringArray>(batch, "run_id")?;
        let keys = column::<StringArray>(batch, "metric_key")?;
        let values = column::<Float64Array>(batch, "value")?;
        let timestamps = column::<Int64Array>(batch, "timestamp")?;
        let steps = column::<Int64Array>(batch, "step")?;

        for row in 0..batch.num_rows() {
            let run_id = run_ids.value(row);
            let key = keys.value(row);
            let slot = *index
                .entry((run_id.to_string(), key.to_string()))
                .or_insert_with(|| {
                    histories.push(MetricHistory::new(run_id, key));
                    histories.len() - 1
                });
            histories[slot].append(MetricSample::new(
                key,
                values.value(row),
                timestamps.value(row),
                steps.value(row),
            ))?;
        }
    }

    Ok(histories)
}

/// Write histories to a Parquet file. Returns the number of rows written.
///
/// # Errors
///
/// Returns error if the file cannot be created or written.
pub fn write_parquet<P: AsRef<Path>>(path: P, histories: &[MetricHistory]) -> Result<usize> {
    use parquet::arrow::ArrowWriter;
    use parquet::file::properties::WriterProperties;

    let batch = histories_to_batch(histories)?;
    let file = File::create(path.as_ref())?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet writer: {e}")))?;
    writer
        .write(&batch)
        .map_err(|e| Error::StorageError(format!("Failed to write metric snapshot: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::StorageError(format!("Failed to finalize Parquet file: {e}")))?;

    Ok(batch.num_rows())
}

/// Read histories from a Parquet snapshot.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn read_parquet<P: AsRef<Path>>(path: P) -> Result<Vec<MetricHistory>> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let file = File::open(path.as_ref())
        .map_err(|e| Error::StorageError(format!("Failed to open Parquet file: {e}")))?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::StorageError(format!("Failed to parse Parquet file: {e}")))?;

    let reader = builder
        .build()
        .map_err(|e| Error::StorageError(format!("Failed to create Parquet reader: {e}")))?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }

    batches_to_histories(&batches)
}

impl RunMetricStore {
    /// Write every history of a run to a Parquet snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown run, or a storage error.
    pub fn export_parquet<P: AsRef<Path>>(&self, run_id: &str, path: P) -> Result<usize> {
        let histories = self.histories(run_id)?;
        let rows = write_parquet(path.as_ref(), &histories)?;
        info!(run_id, rows, path = %path.as_ref().display(), "exported metric snapshot");
        Ok(rows)
    }

    /// Replay every history of a Parquet snapshot into the store.
    ///
    /// Every history is checked before the first one is applied, so a
    /// rejected snapshot leaves the store and its registry untouched.
    ///
    /// # Errors
    ///
    /// Returns a storage error, [`Error::InvalidValue`] if any history fails
    /// boundary validation, or [`Error::NotFound`] if an external registry
    /// does not know one of its runs.
    pub fn import_parquet<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let histories = read_parquet(path)?;
        for history in &histories {
            self.check_restorable(history)?;
        }
        let mut restored = 0;
        for history in histories {
            restored += self.restore(history)?;
        }
        Ok(restored)
    }
}
