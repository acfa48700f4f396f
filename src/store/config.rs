//! Store configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Tunables of a [`RunMetricStore`](super::RunMetricStore).
///
/// Deserializable from JSON so the same knobs can live in a config file:
///
/// ```rust
/// use trueno_metrics::store::StoreConfig;
///
/// let config = StoreConfig::from_json(r#"{ "allow_negative": true }"#)?;
/// assert!(config.allow_negative);
/// assert_eq!(config.expected_runs, StoreConfig::default().expected_runs);
/// # Ok::<(), trueno_metrics::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Accept negative timestamps and steps instead of rejecting them.
    pub allow_negative: bool,
    /// Pre-allocated number of run slots.
    pub expected_runs: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            allow_negative: false,
            expected_runs: 16,
        }
    }
}

impl StoreConfig {
    /// Parse a config from a JSON document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`](crate::Error::Serialization) on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a serialization
    /// error if it is not valid config JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::from_json("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert!(!config.allow_negative);
    }

    #[test]
    fn test_malformed_json() {
        assert!(StoreConfig::from_json("{ allow_negative: ").is_err());
    }
}
