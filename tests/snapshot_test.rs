//! Integration test for Parquet metric snapshots
//!
//! Tests the complete persistence pipeline:
//! 1. Record metrics into a store
//! 2. Export a run to Parquet
//! 3. Import into a fresh store and compare summaries
//!
//! Toyota Way: Jidoka (Built-in Quality)

use std::path::PathBuf;

use trueno_metrics::metric::MetricSample;
use trueno_metrics::storage;
use trueno_metrics::{Error, RunMetricStore};

fn snapshot_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("trueno_metrics_{name}_{}.parquet", std::process::id()))
}

#[allow(clippy::cast_precision_loss)]
fn populated_store() -> RunMetricStore {
    let store = RunMetricStore::new();
    store.register_run("run-001");
    for step in 0..1_000_i64 {
        let loss = if step == 500 { f64::NAN } else { 2.5 / (step as f64 + 1.0) };
        store
            .record("run-001", MetricSample::new("loss", loss, 1_700_000_000_000 + step, step))
            .unwrap();
        store
            .record("run-001", MetricSample::new("accuracy", 0.5 + step as f64 / 2_000.0, 1_700_000_000_000 + step, step))
            .unwrap();
    }
    store
}

#[test]
fn test_export_import_round_trip() {
    let path = snapshot_path("round_trip");
    let store = populated_store();

    let rows = store.export_parquet("run-001", &path).unwrap();
    assert_eq!(rows, 2_000);

    let restored = RunMetricStore::new();
    assert_eq!(restored.import_parquet(&path).unwrap(), 2_000);

    for key in ["loss", "accuracy"] {
        assert_eq!(
            restored.snapshot("run-001", key).unwrap(),
            store.snapshot("run-001", key).unwrap()
        );
    }
    assert_eq!(restored.run_data("run-001").unwrap(), store.run_data("run-001").unwrap());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_read_parquet_preserves_history_order() {
    let path = snapshot_path("order");
    let store = RunMetricStore::new();
    store.register_run("run-002");
    for (value, ts, step) in [(0.3, 30, 3), (0.1, 10, 1), (0.2, 20, 2)] {
        store
            .record("run-002", MetricSample::new("loss", value, ts, step))
            .unwrap();
    }
    store.export_parquet("run-002", &path).unwrap();

    let histories = storage::read_parquet(&path).unwrap();
    assert_eq!(histories.len(), 1);
    assert_eq!(histories[0], store.history("run-002", "loss").unwrap());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_export_unknown_run() {
    let store = RunMetricStore::new();
    let err = store
        .export_parquet("run-404", snapshot_path("unknown"))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_read_missing_file() {
    let err = storage::read_parquet("/nonexistent/trueno_metrics.parquet").unwrap_err();
    assert!(matches!(err, Error::StorageError(_)));
}
