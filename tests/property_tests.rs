//! Property-based tests for metric aggregation
//!
//! Following ruchy/trueno/aprender pattern:
//! - Test mathematical invariants
//! - Test data integrity properties
//! - Run with ProptestConfig::with_cases(100)

use std::collections::HashSet;

use proptest::prelude::*;
use trueno_metrics::metric::{MetricHistory, MetricSample};
use trueno_metrics::RunMetricStore;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Metric value, NaN and infinities included
fn arb_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1000.0f64..1000.0,
        1 => Just(f64::NAN),
        1 => prop_oneof![Just(f64::INFINITY), Just(f64::NEG_INFINITY)],
    ]
}

/// Samples with small timestamp/step ranges so ties are frequent
fn arb_samples(max_len: usize) -> impl Strategy<Value = Vec<MetricSample>> {
    proptest::collection::vec(
        (arb_value(), 0i64..20, 0i64..5).prop_map(|(v, ts, step)| MetricSample::new("loss", v, ts, step)),
        1..max_len,
    )
}

/// Samples with pairwise-distinct (timestamp, step)
fn arb_distinct_samples(max_len: usize) -> impl Strategy<Value = Vec<MetricSample>> {
    arb_samples(max_len).prop_map(|samples| {
        let mut seen = HashSet::new();
        samples
            .into_iter()
            .filter(|s| seen.insert((s.timestamp(), s.step())))
            .collect::<Vec<_>>()
    })
}

/// Distinct samples paired with a shuffled copy of themselves
fn arb_distinct_and_shuffled(
    max_len: usize,
) -> impl Strategy<Value = (Vec<MetricSample>, Vec<MetricSample>)> {
    arb_distinct_samples(max_len)
        .prop_flat_map(|samples| (Just(samples.clone()), Just(samples).prop_shuffle()))
}

fn record_all(samples: &[MetricSample]) -> RunMetricStore {
    let store = RunMetricStore::new();
    store.register_run("run-1");
    for sample in samples {
        store.record("run-1", sample.clone()).unwrap();
    }
    store
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: incrementally maintained summary == batch recompute
    #[test]
    fn prop_incremental_equals_batch(samples in arb_samples(60)) {
        let store = record_all(&samples);
        let history = MetricHistory::from_samples("run-1", "loss", samples).unwrap();

        prop_assert_eq!(store.summary("run-1", "loss").unwrap(), history.summarize());
        prop_assert!(store.verify_summaries().is_empty());
    }

    /// Property: min <= current <= max whenever current is comparable
    #[test]
    fn prop_current_within_extrema(samples in arb_samples(60)) {
        let store = record_all(&samples);
        let summary = store.summary("run-1", "loss").unwrap().unwrap();
        let current = summary.current_value();

        if !current.is_nan() {
            prop_assert!(summary.min_value().unwrap() <= current);
            prop_assert!(current <= summary.max_value().unwrap());
        }
    }

    /// Property: NaN is never an extremum; all-NaN yields no extrema
    #[test]
    fn prop_nan_never_extremum(samples in arb_samples(60)) {
        let store = record_all(&samples);
        let summary = store.summary("run-1", "loss").unwrap().unwrap();
        let all_nan = samples.iter().all(MetricSample::is_nan);

        prop_assert_eq!(summary.min_value().is_none(), all_nan);
        prop_assert_eq!(summary.max_value().is_none(), all_nan);
        if let (Some(min), Some(max)) = (summary.min_value(), summary.max_value()) {
            prop_assert!(!min.is_nan() && !max.is_nan());
            for s in samples.iter().filter(|s| !s.is_nan()) {
                prop_assert!(min <= s.value() && s.value() <= max);
            }
        }
    }

    /// Property: with distinct (timestamp, step), apply order does not matter
    #[test]
    fn prop_order_independent_for_distinct_keys(
        (samples, shuffled) in arb_distinct_and_shuffled(40)
    ) {
        let a = record_all(&samples).summary("run-1", "loss").unwrap().unwrap();
        let b = record_all(&shuffled).summary("run-1", "loss").unwrap().unwrap();
        prop_assert_eq!(a.current(), b.current());
        prop_assert_eq!(a.min_value(), b.min_value());
        prop_assert_eq!(a.max_value(), b.max_value());
    }

    /// Property: history preserves every appended sample in order
    #[test]
    fn prop_history_preserves_append_order(samples in arb_samples(60)) {
        let store = record_all(&samples);
        let history = store.history("run-1", "loss").unwrap();
        prop_assert_eq!(history.samples(), samples.as_slice());
    }
}
