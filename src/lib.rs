//! Named, environment-aware YAML config bundles.
//!
//! `fetch("database")` reads `<base>/database.yml`, picks the section for the
//! active environment if the file is split by environment, deep-merges
//! `<base>/database_local.yml` on top when present, and caches the result
//! for the life of the store.
//!
//! ## Files
//! - `<base>/<name>.yml` - required
//! - `<base>/<name>_local.yml` - optional, machine-specific override
//!
//! ## Defaults
//! - Base path: `<root>/config`, root being the host framework's root or the
//!   current directory
//! - Environment: host framework, then `APP_ENV`, then `RACK_ENV`, then
//!   `development`
//!
//! The free functions below operate on a lazily created process-wide
//! [`ConfigStore`]; construct a store directly to inject a filesystem, host
//! framework or variable source.

pub mod error;
pub mod fs;
pub mod host;
pub mod loader;
pub mod merge;
pub mod name;
pub mod paths;
pub mod store;
pub mod value;

pub use error::{ConfigError, Result};
pub use fs::{FileSystem, OsFileSystem};
pub use host::{HostFramework, MapEnv, ProcessEnv, StaticHost, VarSource};
pub use loader::{CANONICAL_ENVIRONMENTS, DocumentLoader};
pub use merge::deep_merge;
pub use name::ConfigName;
pub use paths::ConfigPaths;
pub use store::ConfigStore;
pub use value::{ConfigIndex, ConfigMap, ConfigValue};

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

static GLOBAL: LazyLock<ConfigStore> = LazyLock::new(ConfigStore::new);

/// The process-wide store used by the free functions.
pub fn global() -> &'static ConfigStore {
    &GLOBAL
}

/// Fetch `name` from the process-wide store.
pub fn fetch(name: impl Into<ConfigName>) -> Result<Arc<ConfigValue>> {
    global().fetch(name)
}

/// Set the process-wide base path. Fails once any config has been loaded.
pub fn set_base_path(path: impl Into<PathBuf>) -> Result<()> {
    global().set_base_path(path)
}

/// Set the process-wide environment. Fails once any config has been loaded.
pub fn set_environment(environment: impl Into<String>) -> Result<()> {
    global().set_environment(environment)
}

/// Clear the process-wide cache.
pub fn reset() {
    global().reset()
}
