//! Recency and extremum comparisons shared by every summary path.
//!
//! Both the incremental update in [`MetricSummary::observe`] and the batch
//! recompute in [`MetricHistory::summarize`] go through these functions, so
//! the two can never disagree about which sample is "latest".
//!
//! [`MetricSummary::observe`]: super::MetricSummary
//! [`MetricHistory::summarize`]: super::MetricHistory::summarize

use std::cmp::Ordering;

use super::MetricSample;

/// Order two samples by `(timestamp, step)`, ignoring value and key.
#[must_use]
pub fn recency_cmp(a: &MetricSample, b: &MetricSample) -> Ordering {
    a.timestamp()
        .cmp(&b.timestamp())
        .then_with(|| a.step().cmp(&b.step()))
}

/// Whether `candidate`, appended after `incumbent`, becomes the latest sample.
///
/// Max timestamp wins, then max step; an exact `(timestamp, step)` tie goes
/// to the candidate because it was appended later.
#[must_use]
pub fn supersedes(candidate: &MetricSample, incumbent: &MetricSample) -> bool {
    recency_cmp(candidate, incumbent) != Ordering::Less
}

/// Whether `candidate` replaces the running minimum.
///
/// NaN is incomparable and never becomes the minimum. Equal values keep the
/// earlier sample.
#[must_use]
pub fn is_new_min(candidate: f64, incumbent: Option<f64>) -> bool {
    !candidate.is_nan() && incumbent.map_or(true, |current| candidate < current)
}

/// Whether `candidate` replaces the running maximum. Same NaN and tie rules as
/// [`is_new_min`].
#[must_use]
pub fn is_new_max(candidate: f64, incumbent: Option<f64>) -> bool {
    !candidate.is_nan() && incumbent.map_or(true, |current| candidate > current)
}

/// Fold samples in append order and return the latest one.
pub fn latest<'a, I>(samples: I) -> Option<&'a MetricSample>
where
    I: IntoIterator<Item = &'a MetricSample>,
{
    samples.into_iter().fold(None, |best, sample| match best {
        Some(incumbent) if !supersedes(sample, incumbent) => Some(incumbent),
        _ => Some(sample),
    })
}
