//! Engine settings.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! record_steps = true
//! history_limit = 64
//!
//! [random]
//! min = 1
//! max = 100
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Key;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("random key range is empty: min {min} > max {max}")]
    InvalidRandomRange { min: Key, max: Key },

    #[error("history_limit must be at least 1")]
    ZeroHistoryLimit,
}

/// Inclusive range that [`RedBlackTree::insert_random`] draws keys from.
///
/// [`RedBlackTree::insert_random`]: crate::RedBlackTree::insert_random
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RandomRange {
    pub min: Key,
    pub max: Key,
}

impl Default for RandomRange {
    fn default() -> Self {
        Self { min: 1, max: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Record individual steps in operation traces. Outcomes are always kept.
    pub record_steps: bool,
    /// Maximum number of operation traces kept, `None` keeps all of them.
    pub history_limit: Option<usize>,
    pub random: RandomRange,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            record_steps: true,
            history_limit: None,
            random: RandomRange::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.random.min > self.random.max {
            return Err(ConfigError::InvalidRandomRange {
                min: self.random.min,
                max: self.random.max,
            });
        }
        if self.history_limit == Some(0) {
            return Err(ConfigError::ZeroHistoryLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.record_steps);
        assert_eq!(config.history_limit, None);
        assert_eq!(config.random, RandomRange { min: 1, max: 100 });
    }

    #[test]
    fn partial_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            history_limit = 8

            [random]
            max = 10
            "#,
        )
        .unwrap();
        assert!(config.record_steps);
        assert_eq!(config.history_limit, Some(8));
        assert_eq!(config.random, RandomRange { min: 1, max: 10 });
    }

    #[test]
    fn rejects_empty_random_range() {
        let err = EngineConfig::from_toml_str("[random]\nmin = 5\nmax = 4\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidRandomRange { min: 5, max: 4 }
        ));
    }

    #[test]
    fn rejects_zero_history_limit() {
        let err = EngineConfig::from_toml_str("history_limit = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroHistoryLimit));
    }

    #[test]
    fn rejects_wrong_types() {
        let err = EngineConfig::from_toml_str("record_steps = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "record_steps = false").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert!(!config.record_steps);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = EngineConfig::load(&path).unwrap_err();
        match err {
            ConfigError::Io { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn serializes_back() {
        let config = EngineConfig {
            history_limit: Some(3),
            ..EngineConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }
}
