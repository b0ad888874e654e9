//! Reading and parsing single config documents.
//!
//! A document whose top level is a mapping with at least one of the keys
//! `development`, `test` or `production` is treated as environment-shaped:
//! only the section named by the active environment is used. Any other
//! document is used as-is.

use crate::error::{ConfigError, Result};
use crate::fs::FileSystem;
use crate::value::ConfigValue;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::trace;

/// Top-level keys that mark a document as environment-shaped.
pub const CANONICAL_ENVIRONMENTS: [&str; 3] = ["development", "test", "production"];

/// Loads YAML documents through a [`FileSystem`].
#[derive(Clone)]
pub struct DocumentLoader {
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for DocumentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentLoader").finish_non_exhaustive()
    }
}

impl DocumentLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.fs.exists(path)
    }

    /// Load the document at `path`, resolved for `environment`.
    ///
    /// Returns `None` when the document contributes nothing: the file is
    /// absent or empty, or it is environment-shaped without a section for
    /// `environment`.
    pub fn load_document(&self, path: &Path, environment: &str) -> Result<Option<ConfigValue>> {
        match self.read(path)? {
            Some(content) => parse_document(path, &content, environment),
            None => Ok(None),
        }
    }

    /// Read the raw text at `path`, or `None` if the file is gone.
    pub fn read(&self, path: &Path) -> Result<Option<String>> {
        match self.fs.read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ConfigError::read(path, err)),
        }
    }
}

/// Parse `content` read from `path` and resolve it for `environment`.
///
/// YAML merge keys (`<<: *defaults`) are expanded before the environment
/// section is picked.
pub fn parse_document(
    path: &Path,
    content: &str,
    environment: &str,
) -> Result<Option<ConfigValue>> {
    if content.trim().is_empty() {
        trace!(path = %path.display(), "empty config document");
        return Ok(None);
    }

    let mut document: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|err| ConfigError::parse(path, err))?;
    document
        .apply_merge()
        .map_err(|err| ConfigError::parse(path, err))?;

    Ok(select_environment(ConfigValue::from(document), environment))
}

/// Whether `document` multiplexes settings by environment.
pub fn is_environment_shaped(document: &ConfigValue) -> bool {
    document
        .as_mapping()
        .is_some_and(|map| CANONICAL_ENVIRONMENTS.iter().any(|env| map.contains_key(*env)))
}

/// Resolve `document` for `environment`.
///
/// Environment-shaped documents yield the section for `environment`, which
/// need not be one of the canonical names. A missing or null section yields
/// `None`. Other documents are returned unchanged.
pub fn select_environment(document: ConfigValue, environment: &str) -> Option<ConfigValue> {
    if document.is_null() {
        return None;
    }

    if !is_environment_shaped(&document) {
        return Some(document);
    }

    trace!(environment, "selecting environment section");
    match document {
        ConfigValue::Mapping(mut map) => map.remove(environment).filter(|v| !v.is_null()),
        _ => None,
    }
}
