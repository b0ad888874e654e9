//! Config file path resolution.
//!
//! Pure path composition, no filesystem I/O:
//! - `<base>/<name>.yml` is the primary (required) file
//! - `<base>/<name>_local.yml` is the local override (optional)

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of every config file.
pub const CONFIG_EXTENSION: &str = ".yml";

/// Replaces [`CONFIG_EXTENSION`] at the end of a local override's file name.
pub const LOCAL_SUFFIX: &str = "_local.yml";

/// Resolves file paths for config names under a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    base_dir: PathBuf,
}

impl ConfigPaths {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the required config file for `name`.
    pub fn primary_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{name}{CONFIG_EXTENSION}"))
    }

    /// Path of the optional local override for `name`.
    pub fn override_path(&self, name: &str) -> PathBuf {
        local_variant(&self.primary_path(name))
    }
}

/// Swap a trailing `.yml` in the file name for `_local.yml`.
///
/// Earlier occurrences of `.yml` are left alone. A path without the
/// extension is returned unchanged.
fn local_variant(primary: &Path) -> PathBuf {
    let Some(file_name) = primary.file_name().and_then(|n| n.to_str()) else {
        return primary.to_path_buf();
    };

    match file_name.strip_suffix(CONFIG_EXTENSION) {
        Some(stem) => {
            let mut local = OsString::from(stem);
            local.push(LOCAL_SUFFIX);
            primary.with_file_name(local)
        }
        None => primary.to_path_buf(),
    }
}
