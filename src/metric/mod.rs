//! Metric samples, histories and their derived summaries.
//!
//! ## Model
//!
//! ```text
//! MetricSample ──append──> MetricHistory (run, key) ──fold──> MetricSummary
//!                                                              ├─ current (latest)
//!                                                              ├─ minimum
//!                                                              └─ maximum
//! ```
//!
//! "Latest" is the sample with the greatest timestamp, then the greatest
//! step; exact ties go to the sample appended last. Minimum and maximum are
//! taken over every comparable (non-NaN) value in the history.
//!
//! ## Usage
//!
//! ```rust
//! use trueno_metrics::metric::{MetricHistory, MetricSample};
//!
//! let mut history = MetricHistory::new("run-001", "loss");
//! history.append(MetricSample::new("loss", 0.9, 100, 0))?;
//! history.append(MetricSample::new("loss", 0.5, 200, 1))?;
//!
//! let summary = history.summarize().expect("non-empty history");
//! assert_eq!(summary.current_value(), 0.5);
//! assert_eq!(summary.max_value(), Some(0.9));
//! # Ok::<(), trueno_metrics::Error>(())
//! ```

mod history;
pub mod ordering;
mod sample;
mod summary;

pub use history::MetricHistory;
pub use sample::{MetricSample, MetricSampleBuilder};
pub use summary::{MetricSummary, SummaryType};
