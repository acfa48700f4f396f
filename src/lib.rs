//! # trueno-metrics: Run Metric Aggregation Store
//!
//! **Version**: 0.1.0
//!
//! trueno-metrics keeps the metric history of experiment runs and derives,
//! for every (run, key), the latest sample together with the minimum and
//! maximum values, consistently under concurrent writers.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: One comparison function drives both the incremental and the
//!   batch summary paths, and `verify_summaries` checks them against each other
//! - **Poka-Yoke**: Malformed samples are rejected at the boundary; NaN and
//!   infinities are valid values and never become a minimum or maximum
//! - **Heijunka**: O(1) summary updates per sample, whatever the history length
//!
//! ## Example Usage
//!
//! ```rust
//! use trueno_metrics::metric::MetricSample;
//! use trueno_metrics::RunMetricStore;
//!
//! let store = RunMetricStore::new();
//! store.register_run("run-001");
//!
//! store.record("run-001", MetricSample::new("loss", 0.9, 100, 0))?;
//! store.record("run-001", MetricSample::new("loss", 0.5, 200, 1))?;
//! store.record("run-001", MetricSample::new("loss", f64::NAN, 300, 2))?;
//!
//! let data = store.run_data("run-001")?;
//! assert!(data.metrics()["loss"].is_nan());
//! assert_eq!(data.metric_minimums()["loss"], 0.5);
//! assert_eq!(data.metric_maximums()["loss"], 0.9);
//! # Ok::<(), trueno_metrics::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod error;
pub mod logging;
pub mod metric;
pub mod run;
pub mod storage;
pub mod store;
pub mod wire;

pub use error::{Error, Result};
pub use metric::{MetricHistory, MetricSample, MetricSummary, SummaryType};
pub use run::RunData;
pub use store::RunMetricStore;
