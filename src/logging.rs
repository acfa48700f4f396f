//! Tracing subscriber setup for binaries and demos embedding the store.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! the embedding application's choice.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "trueno_metrics=info";

/// Build the filter from `RUST_LOG`, or from `verbose`/[`DEFAULT_FILTER`].
#[must_use]
pub fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("trueno_metrics=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install a global fmt subscriber.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(verbose: bool) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter(verbose))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter() {
        assert_eq!(env_filter(true).to_string(), "trueno_metrics=debug");
    }

    #[test]
    fn test_init_twice() {
        let _ = init(false);
        assert!(!init(false));
    }
}
