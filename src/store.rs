//! The memoizing config store.
//!
//! A store is UNCONFIGURED while its cache is empty: the base path and the
//! environment may still be changed. The first successful [`ConfigStore::fetch`]
//! freezes both until [`ConfigStore::reset`] empties the cache again.
//!
//! The cache check, the load and the insert all happen under one lock, so
//! concurrent fetches of the same name read the files once.

use crate::error::{ConfigError, Result};
use crate::fs::{FileSystem, OsFileSystem};
use crate::host::{HostFramework, ProcessEnv, VarSource, resolve_base_path, resolve_environment};
use crate::loader::{DocumentLoader, parse_document};
use crate::merge::deep_merge;
use crate::name::ConfigName;
use crate::paths::ConfigPaths;
use crate::value::{ConfigMap, ConfigValue};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct State {
    base_path: Option<PathBuf>,
    environment: Option<String>,
    cache: HashMap<ConfigName, Arc<ConfigValue>>,
}

/// Loads named configs from `<base_path>/<name>.yml` and keeps them for the
/// life of the store.
pub struct ConfigStore {
    loader: DocumentLoader,
    host: Option<Arc<dyn HostFramework>>,
    vars: Arc<dyn VarSource>,
    state: Mutex<State>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("state", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// Store backed by the real filesystem and process environment.
    pub fn new() -> Self {
        Self {
            loader: DocumentLoader::new(Arc::new(OsFileSystem)),
            host: None,
            vars: Arc::new(ProcessEnv),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.loader = DocumentLoader::new(fs);
        self
    }

    /// Consult `host` first for the root directory and environment.
    pub fn with_host(mut self, host: Arc<dyn HostFramework>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_vars(mut self, vars: Arc<dyn VarSource>) -> Self {
        self.vars = vars;
        self
    }

    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_mut().base_path = Some(path.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.state_mut().environment = Some(environment.into());
        self
    }

    /// Return the config for `name`, loading it on first use.
    ///
    /// Later calls return the same `Arc` without touching the filesystem.
    /// A failed load caches nothing.
    pub fn fetch(&self, name: impl Into<ConfigName>) -> Result<Arc<ConfigValue>> {
        let name = name.into();
        let mut state = self.lock();

        if let Some(config) = state.cache.get(&name) {
            trace!(name = %name, "config cache hit");
            return Ok(Arc::clone(config));
        }

        let paths = ConfigPaths::new(self.base_path_in(&mut state));
        let environment = self.environment_in(&mut state);
        let config = Arc::new(self.load(&name, &paths, &environment)?);

        state.cache.insert(name, Arc::clone(&config));
        Ok(config)
    }

    /// Set the directory config files are read from.
    pub fn set_base_path(&self, path: impl Into<PathBuf>) -> Result<()> {
        let mut state = self.lock();
        if !state.cache.is_empty() {
            return Err(ConfigError::immutable("base_path"));
        }

        let path = path.into();
        debug!(path = %path.display(), "config base path set");
        state.base_path = Some(path);
        Ok(())
    }

    /// Set the environment used to pick sections of environment-shaped files.
    pub fn set_environment(&self, environment: impl Into<String>) -> Result<()> {
        let mut state = self.lock();
        if !state.cache.is_empty() {
            return Err(ConfigError::immutable("environment"));
        }

        let environment = environment.into();
        debug!(environment = %environment, "config environment set");
        state.environment = Some(environment);
        Ok(())
    }

    /// Drop every cached config, unfreezing the base path and environment.
    ///
    /// Intended for test isolation. Settings already made are kept.
    pub fn reset(&self) {
        let mut state = self.lock();
        debug!(cached = state.cache.len(), "config cache reset");
        state.cache.clear();
    }

    /// The effective base path, resolving the default if none was set.
    pub fn base_path(&self) -> PathBuf {
        let mut state = self.lock();
        self.base_path_in(&mut state)
    }

    /// The effective environment, resolving the default if none was set.
    pub fn environment(&self) -> String {
        let mut state = self.lock();
        self.environment_in(&mut state)
    }

    /// Whether the base path and environment can no longer be changed.
    pub fn is_frozen(&self) -> bool {
        !self.lock().cache.is_empty()
    }

    /// Names currently held in the cache, sorted.
    pub fn cached_names(&self) -> Vec<ConfigName> {
        let mut names: Vec<_> = self.lock().cache.keys().cloned().collect();
        names.sort();
        names
    }

    fn load(
        &self,
        name: &ConfigName,
        paths: &ConfigPaths,
        environment: &str,
    ) -> Result<ConfigValue> {
        let primary = paths.primary_path(name.as_str());
        if !self.loader.exists(&primary) {
            return Err(ConfigError::not_found(name.as_str(), primary));
        }

        debug!(
            name = %name,
            path = %primary.display(),
            environment,
            "loading config"
        );
        let Some(content) = self.loader.read(&primary)? else {
            return Err(ConfigError::not_found(name.as_str(), primary));
        };
        let mut config = parse_document(&primary, &content, environment)?
            .unwrap_or_else(|| ConfigValue::Mapping(ConfigMap::new()));

        let local = paths.override_path(name.as_str());
        if self.loader.exists(&local)
            && let Some(overlay) = self.loader.load_document(&local, environment)?
        {
            debug!(name = %name, path = %local.display(), "merging local config override");
            config = deep_merge(config, overlay);
        }

        Ok(config)
    }

    fn base_path_in(&self, state: &mut State) -> PathBuf {
        state
            .base_path
            .get_or_insert_with(|| resolve_base_path(self.host.as_deref()))
            .clone()
    }

    fn environment_in(&self, state: &mut State) -> String {
        state
            .environment
            .get_or_insert_with(|| resolve_environment(self.host.as_deref(), self.vars.as_ref()))
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut State {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MapEnv, StaticHost};
    use std::io;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory filesystem that counts reads.
    #[derive(Default)]
    struct MemoryFs {
        files: Mutex<HashMap<PathBuf, String>>,
        reads: AtomicUsize,
    }

    impl MemoryFs {
        fn with(self, path: &str, content: &str) -> Self {
            self.write(path, content);
            self
        }

        fn write(&self, path: &str, content: &str) {
            self.files
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), content.to_string());
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl FileSystem for MemoryFs {
        fn exists(&self, path: &Path) -> bool {
            self.files.lock().unwrap().contains_key(path)
        }

        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn store(fs: Arc<MemoryFs>) -> ConfigStore {
        ConfigStore::new()
            .with_file_system(fs)
            .with_vars(Arc::new(MapEnv::new()))
            .with_base_path("/app/config")
    }

    #[test]
    fn test_fetch_is_memoized() {
        let fs = Arc::new(MemoryFs::default().with("/app/config/basic.yml", "option: one\n"));
        let store = store(fs.clone());

        let first = store.fetch("basic").unwrap();
        fs.write("/app/config/basic.yml", "option: two\n");
        let second = store.fetch(String::from("basic")).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second["option"], "one");
        assert_eq!(fs.reads(), 1);
    }

    #[test]
    fn test_default_environment_is_development() {
        let fs = Arc::new(MemoryFs::default().with(
            "/app/config/basic.yml",
            "development:\n  option: dev\ntest:\n  option: test\n",
        ));
        let store = store(fs);
        assert_eq!(store.environment(), "development");
        assert_eq!(store.fetch("basic").unwrap()["option"], "dev");
    }

    #[test]
    fn test_environment_from_vars() {
        let fs = Arc::new(MemoryFs::default().with(
            "/app/config/basic.yml",
            "development:\n  option: dev\nproduction:\n  option: prod\n",
        ));
        let store = store(fs).with_vars(Arc::new(MapEnv::new().with("RACK_ENV", "production")));
        assert_eq!(store.fetch("basic").unwrap()["option"], "prod");
    }

    #[test]
    fn test_host_supplies_root_and_environment() {
        let fs = Arc::new(MemoryFs::default().with(
            "/srv/site/config/basic.yml",
            "test:\n  option: from-host\n",
        ));
        let host = StaticHost {
            root: Some(PathBuf::from("/srv/site")),
            environment: Some("test".into()),
        };
        let store = ConfigStore::new()
            .with_file_system(fs)
            .with_host(Arc::new(host))
            .with_vars(Arc::new(MapEnv::new().with("APP_ENV", "production")));

        assert_eq!(store.base_path(), PathBuf::from("/srv/site/config"));
        assert_eq!(store.fetch("basic").unwrap()["option"], "from-host");
    }

    #[test]
    fn test_settings_freeze_after_fetch() {
        let fs = Arc::new(MemoryFs::default().with("/app/config/basic.yml", "a: 1\n"));
        let store = store(fs);

        store.set_environment("test").unwrap();
        store.set_base_path("/app/config").unwrap();
        assert!(!store.is_frozen());

        store.fetch("basic").unwrap();
        assert!(store.is_frozen());
        assert!(store.set_base_path("/other").unwrap_err().is_immutable());
        assert!(store.set_environment("production").unwrap_err().is_immutable());
        assert_eq!(store.environment(), "test");
    }

    #[test]
    fn test_reset_unfreezes_and_keeps_settings() {
        let fs = Arc::new(
            MemoryFs::default()
                .with("/app/config/basic.yml", "a: 1\n")
                .with("/other/basic.yml", "a: 2\n"),
        );
        let store = store(fs).with_environment("staging");

        assert_eq!(store.fetch("basic").unwrap()["a"], 1i64);
        store.reset();
        assert!(!store.is_frozen());
        assert!(store.cached_names().is_empty());
        assert_eq!(store.environment(), "staging");

        store.set_base_path("/other").unwrap();
        assert_eq!(store.fetch("basic").unwrap()["a"], 2i64);
    }

    #[test]
    fn test_concurrent_first_fetch_loads_once() {
        let fs = Arc::new(MemoryFs::default().with("/app/config/basic.yml", "option: one\n"));
        let store = store(fs.clone());

        let configs: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| store.fetch("basic").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(fs.reads(), 1);
        assert!(configs.iter().all(|c| Arc::ptr_eq(c, &configs[0])));
        assert_eq!(configs[0]["option"], "one");
    }

    /// Reports every file as present but fails reads as if it was deleted.
    struct VanishingFs;

    impl FileSystem for VanishingFs {
        fn exists(&self, _path: &Path) -> bool {
            true
        }

        fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
    }

    #[test]
    fn test_primary_deleted_before_read_is_not_found() {
        let store = ConfigStore::new()
            .with_file_system(Arc::new(VanishingFs))
            .with_vars(Arc::new(MapEnv::new()))
            .with_base_path("/app/config");

        let err = store.fetch("basic").unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.is_frozen());
    }

    #[test]
    fn test_merge_keys_in_primary_and_override() {
        let fs = Arc::new(
            MemoryFs::default()
                .with(
                    "/app/config/database.yml",
                    "defaults: &defaults\n  adapter: postgres\n  pool: 5\n\
                     development:\n  <<: *defaults\n  database: dev_db\n",
                )
                .with(
                    "/app/config/database_local.yml",
                    "base: &base\n  pool: 10\ndevelopment:\n  <<: *base\n",
                ),
        );
        let cfg = store(fs).fetch("database").unwrap();

        assert_eq!(cfg["adapter"], "postgres");
        assert_eq!(cfg["database"], "dev_db");
        assert_eq!(cfg["pool"], 10i64);
        assert!(cfg.get("<<").is_none());
    }

    #[test]
    fn test_missing_primary_is_not_found() {
        let fs = Arc::new(MemoryFs::default());
        let store = store(fs);

        let err = store.fetch("nope").unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.is_frozen());
    }

    #[test]
    fn test_failed_fetch_is_retried() {
        let fs = Arc::new(MemoryFs::default().with("/app/config/broken.yml", "a: [1\n"));
        let store = store(fs.clone());

        assert!(store.fetch("broken").unwrap_err().is_parse());
        assert!(store.cached_names().is_empty());

        fs.write("/app/config/broken.yml", "a: [1]\n");
        assert_eq!(store.fetch("broken").unwrap()["a"][0], 1i64);
    }

    #[test]
    fn test_override_is_merged() {
        let fs = Arc::new(
            MemoryFs::default()
                .with(
                    "/app/config/override.yml",
                    "this: A\nthat: B\ninner:\n  one: a\n  two: b\n",
                )
                .with(
                    "/app/config/override_local.yml",
                    "this: A-override\ninner:\n  one: a-override\n",
                ),
        );
        let cfg = store(fs).fetch("override").unwrap();

        assert_eq!(cfg["this"], "A-override");
        assert_eq!(cfg["that"], "B");
        assert_eq!(cfg["inner"]["one"], "a-override");
        assert_eq!(cfg["inner"]["two"], "b");
    }

    #[test]
    fn test_override_without_active_environment_is_ignored() {
        let fs = Arc::new(
            MemoryFs::default()
                .with("/app/config/svc.yml", "development:\n  url: base\n")
                .with("/app/config/svc_local.yml", "production:\n  url: prod\n"),
        );
        let cfg = store(fs).fetch("svc").unwrap();
        assert_eq!(cfg["url"], "base");
    }

    #[test]
    fn test_missing_environment_section_yields_empty_mapping() {
        let fs = Arc::new(
            MemoryFs::default().with("/app/config/svc.yml", "production:\n  url: prod\n"),
        );
        let cfg = store(fs).fetch("svc").unwrap();
        assert_eq!(cfg.as_mapping().map(ConfigMap::len), Some(0));
    }

    #[test]
    fn test_cached_names_sorted() {
        let fs = Arc::new(
            MemoryFs::default()
                .with("/app/config/b.yml", "x: 1\n")
                .with("/app/config/a.yml", "x: 1\n"),
        );
        let store = store(fs);
        store.fetch("b").unwrap();
        store.fetch("a").unwrap();
        assert_eq!(
            store.cached_names(),
            vec![ConfigName::new("a"), ConfigName::new("b")]
        );
    }
}
