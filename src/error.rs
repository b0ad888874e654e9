//! Error types for config loading and store configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by [`ConfigStore`](crate::ConfigStore) operations.
///
/// Nothing is swallowed or replaced with defaults: a failed `fetch` leaves the
/// cache untouched, so a corrected file is picked up by the next call.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A one-time setting was changed after the first config was loaded.
    #[error("{setting} is frozen after the first config load")]
    Immutable { setting: &'static str },

    /// The mandatory `<name>.yml` file does not exist.
    #[error("No config found for {name} (looked for {})", .path.display())]
    NotFound { name: String, path: PathBuf },

    /// A present file is not valid YAML.
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A present file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn immutable(setting: &'static str) -> Self {
        Self::Immutable { setting }
    }

    pub fn not_found(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::NotFound {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Immutable { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
