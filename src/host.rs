//! Default resolution of the base path and active environment.
//!
//! Resolution order for the environment:
//! 1. The host framework's environment, if a host is registered
//! 2. `APP_ENV`
//! 3. `RACK_ENV`
//! 4. `development`
//!
//! The base path is `<root>/config`, where root is the host framework's root
//! or the current working directory.

use std::collections::HashMap;
use std::path::PathBuf;

/// Environment used when nothing else names one.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Variables consulted for the environment, in order.
pub const ENV_VARS: [&str; 2] = ["APP_ENV", "RACK_ENV"];

/// Directory under the application root that holds config files.
pub const CONFIG_DIR: &str = "config";

/// An application framework that knows its own root and environment.
pub trait HostFramework: Send + Sync {
    fn root(&self) -> Option<PathBuf>;

    fn environment(&self) -> Option<String>;
}

/// Host adapter with fixed answers, for embedding applications that already
/// know where they live.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    pub root: Option<PathBuf>,
    pub environment: Option<String>,
}

impl HostFramework for StaticHost {
    fn root(&self) -> Option<PathBuf> {
        self.root.clone()
    }

    fn environment(&self) -> Option<String> {
        self.environment.clone()
    }
}

/// Source of environment variables.
pub trait VarSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl VarSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(HashMap<String, String>);

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }
}

impl VarSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// Pick the active environment. Empty values count as unset.
pub fn resolve_environment(host: Option<&dyn HostFramework>, vars: &dyn VarSource) -> String {
    host.and_then(|h| h.environment())
        .filter(|env| !env.is_empty())
        .or_else(|| {
            ENV_VARS
                .iter()
                .find_map(|key| vars.var(key).filter(|v| !v.is_empty()))
        })
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}

/// Pick the directory config files are read from.
pub fn resolve_base_path(host: Option<&dyn HostFramework>) -> PathBuf {
    host.and_then(|h| h.root())
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}
