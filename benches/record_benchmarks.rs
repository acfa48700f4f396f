//! Record path benchmarks
//!
//! Toyota Way: Genchi Genbutsu (measure, don't guess)
//!
//! The incremental summary update must stay O(1) per sample no matter how
//! long the history is; the batch recompute is O(n) and serves as baseline.
//!
//! Run with: cargo bench --bench record_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trueno_metrics::metric::{MetricHistory, MetricSample};
use trueno_metrics::RunMetricStore;

const SMALL_SIZE: i64 = 1_000;
const MEDIUM_SIZE: i64 = 100_000;

#[allow(clippy::cast_precision_loss)]
fn samples(n: i64) -> Vec<MetricSample> {
    (0..n)
        .map(|step| MetricSample::new("loss", 1.0 / (step as f64 + 1.0), step, step))
        .collect()
}

/// Benchmark a single record on top of an existing history
fn bench_record(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_after_history");

    for size in [SMALL_SIZE, MEDIUM_SIZE] {
        let store = RunMetricStore::new();
        store.register_run("run-bench");
        store.record_batch("run-bench", samples(size)).unwrap();

        let mut step = size;
        group.bench_with_input(BenchmarkId::new("incremental", size), &size, |b, _| {
            b.iter(|| {
                step += 1;
                store
                    .record("run-bench", black_box(MetricSample::new("loss", 0.5, step, step)))
                    .unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark the batch recompute baseline
fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_summarize");

    for size in [SMALL_SIZE, MEDIUM_SIZE] {
        let history = MetricHistory::from_samples("run-bench", "loss", samples(size)).unwrap();
        group.bench_with_input(BenchmarkId::new("summarize", size), &history, |b, history| {
            b.iter(|| black_box(history).summarize());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_record, bench_summarize);
criterion_main!(benches);
