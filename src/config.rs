//! Configuration from `.rerereric.toml` plus CLI overrides.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::RerereError;

/// Config file name, looked up in the repository working directory.
pub const CONFIG_FILE: &str = ".rerereric.toml";

const DEFAULT_CONTEXT_LINES: usize = 2;
const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Tunables for matching, from the config file and command-line flags.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct RerereConfig {
    /// Context lines captured around each conflict.
    #[serde(default = "RerereConfig::default_context")]
    pub context: usize,
    /// Minimum conflict-body similarity for a cached resolution to apply,
    /// in `(0.0, 1.0]`.
    #[serde(default = "RerereConfig::default_similarity")]
    pub similarity: f64,
}

impl Default for RerereConfig {
    fn default() -> Self {
        Self {
            context: DEFAULT_CONTEXT_LINES,
            similarity: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl RerereConfig {
    fn default_context() -> usize {
        DEFAULT_CONTEXT_LINES
    }

    fn default_similarity() -> f64 {
        DEFAULT_SIMILARITY_THRESHOLD
    }

    /// Load configuration from `dir/.rerereric.toml`. A missing file yields
    /// the defaults; an unreadable or invalid file is an error.
    ///
    /// # Errors
    /// Returns [`RerereError::Config`] when the file exists but cannot be
    /// read or parsed.
    pub fn load(dir: &Path) -> Result<Self, RerereError> {
        let path = dir.join(CONFIG_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(RerereError::Config {
                    path: path.clone(),
                    detail: e.to_string(),
                });
            }
        };
        let config: Self = toml::from_str(&text).map_err(|e| RerereError::Config {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        debug!(path = %path.display(), ?config, "loaded config file");
        Ok(config)
    }

    /// Apply command-line overrides on top of the file/default values.
    #[must_use]
    pub fn with_overrides(mut self, context: Option<usize>, similarity: Option<f64>) -> Self {
        if let Some(context) = context {
            self.context = context;
        }
        if let Some(similarity) = similarity {
            self.similarity = similarity;
        }
        self
    }

    /// Reject values no match could ever satisfy (or that every match would).
    ///
    /// # Errors
    /// Returns [`RerereError::InvalidOption`] when `similarity` falls outside
    /// `(0.0, 1.0]`.
    pub fn validate(&self) -> Result<(), RerereError> {
        if !(self.similarity > 0.0 && self.similarity <= 1.0) {
            return Err(RerereError::InvalidOption {
                option: "similarity".to_owned(),
                value: self.similarity.to_string(),
                reason: "must be greater than 0.0 and at most 1.0".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RerereConfig::load(dir.path()).unwrap();
        assert_eq!(config, RerereConfig::default());
        assert_eq!(config.context, 2);
        assert!((config.similarity - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "similarity = 0.6\n").unwrap();
        let config = RerereConfig::load(dir.path()).unwrap();
        assert_eq!(config.context, 2);
        assert!((config.similarity - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "similarity = \"high\"\n").unwrap();
        let err = RerereConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, RerereError::Config { .. }));
    }

    #[test]
    fn cli_overrides_win_over_file_values() {
        let config = RerereConfig::default().with_overrides(Some(5), Some(0.95));
        assert_eq!(config.context, 5);
        assert!((config.similarity - 0.95).abs() < f64::EPSILON);

        let untouched = RerereConfig::default().with_overrides(None, None);
        assert_eq!(untouched, RerereConfig::default());
    }

    #[test]
    fn validate_rejects_out_of_range_similarity() {
        for bad in [0.0, -0.1, 1.5, f64::NAN] {
            let config = RerereConfig {
                similarity: bad,
                ..RerereConfig::default()
            };
            let err = config.validate().unwrap_err();
            assert!(matches!(err, RerereError::InvalidOption { .. }));
        }
        let config = RerereConfig {
            similarity: 1.0,
            ..RerereConfig::default()
        };
        config.validate().unwrap();
    }
}
