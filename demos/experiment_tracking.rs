//! Experiment Tracking Example
//!
//! Simulates a training run that logs loss/accuracy, diverges for one step
//! (NaN loss), then prints the latest/min/max projections and a Parquet
//! snapshot round trip.
//!
//! Run with: RUST_LOG=trueno_metrics=debug cargo run --example experiment_tracking

use std::sync::Arc;

use anyhow::Context;
use trueno_metrics::metric::{MetricSample, SummaryType};
use trueno_metrics::store::{MemorySink, RunMetricStore};
use trueno_metrics::wire::{self, RunDataRecord};

#[allow(clippy::cast_precision_loss)]
fn main() -> anyhow::Result<()> {
    trueno_metrics::logging::init(false);

    println!("=== trueno-metrics Experiment Tracking ===\n");

    let sink = Arc::new(MemorySink::new());
    let store = RunMetricStore::builder().sink(sink.clone()).build();

    // -------------------------------------------------------------------------
    // 1. Register the run and its params
    // -------------------------------------------------------------------------
    println!("1. Registering run...");
    let run_id = "run-resnet-001";
    store.register_run(run_id);
    store.log_param(run_id, "learning_rate", "0.001")?;
    store.log_param(run_id, "batch_size", "32")?;
    store.set_tag(run_id, "model", "resnet50")?;

    // -------------------------------------------------------------------------
    // 2. Simulate the training loop
    // -------------------------------------------------------------------------
    println!("\n2. Simulating training (10 epochs)...");
    let start = chrono::Utc::now().timestamp_millis();
    for epoch in 0..10_i64 {
        let loss = if epoch == 9 { f64::NAN } else { 2.5 / (epoch as f64 + 1.0) + 0.1 };
        let accuracy = 0.5 + 0.05 * epoch as f64;
        let ts = start + epoch * 1_000;

        store.record(run_id, MetricSample::new("loss", loss, ts, epoch))?;
        store.record(run_id, MetricSample::new("accuracy", accuracy, ts, epoch))?;
        println!("   Epoch {epoch}: loss={loss:.4}, accuracy={accuracy:.4}");
    }

    // -------------------------------------------------------------------------
    // 3. Summary projections
    // -------------------------------------------------------------------------
    println!("\n3. Summaries:");
    for row in store.summary_rows(run_id)? {
        println!(
            "   {:<16} step={:<3} value={:?}",
            row.summary_type.label(&row.key),
            row.step,
            row.value
        );
    }

    let loss = store
        .summary(run_id, "loss")?
        .context("loss was recorded")?;
    println!(
        "\n   Latest loss is NaN: {} (min {:?}, max {:?})",
        loss.current_value().is_nan(),
        loss.get(SummaryType::Min).map(MetricSample::value),
        loss.get(SummaryType::Max).map(MetricSample::value)
    );

    // -------------------------------------------------------------------------
    // 4. Wire format
    // -------------------------------------------------------------------------
    println!("\n4. RunData JSON:");
    let data = store.run_data(run_id)?;
    println!("{}", wire::encode(&RunDataRecord::from(&data))?);

    // -------------------------------------------------------------------------
    // 5. Snapshot and rebuild
    // -------------------------------------------------------------------------
    println!("\n5. Parquet snapshot...");
    let path = std::env::temp_dir().join("trueno_metrics_demo.parquet");
    let rows = store.export_parquet(run_id, &path)?;
    let rebuilt = RunMetricStore::new();
    rebuilt.import_parquet(&path)?;
    println!("   Wrote {rows} rows to {}", path.display());
    println!(
        "   Rebuilt store matches: {}",
        rebuilt.run_data(run_id)?.metrics().len() == data.metrics().len()
    );
    println!("   Sink holds {} samples", sink.len());
    println!("   Drifted summaries: {:?}", store.verify_summaries());

    println!("\n=== Experiment Tracking Complete ===");
    Ok(())
}
