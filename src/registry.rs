//! Registry of named stores.
//!
//! A [`Registry`] owns one storage engine and every [`Store`] opened on it.
//! It is an ordinary value: build one at startup and pass it (or an `Arc`
//! of it) to whoever needs stores.
//!
//! # Example
//!
//! ```rust
//! use varddb::{LogLevel, Registry, StoreConfig};
//!
//! # fn main() -> varddb::Result<()> {
//! let registry = Registry::in_memory();
//! registry.initialize("unused-for-memory", LogLevel::None)?;
//!
//! let a = registry.store(StoreConfig::new("settings"))?;
//! let b = registry.store_named("settings")?;
//! assert!(a.ptr_eq(&b));
//! # Ok(())
//! # }
//! ```

use crate::codec::{JsonCodec, ObjectCodec};
use crate::config::{RegistryConfig, StoreConfig};
use crate::constants::DEFAULT_STORE_NAME;
use crate::engine::{MemoryEngine, RedbEngine, StorageEngine};
use crate::error::{Error, Result};
use crate::logging::LogLevel;
use crate::store::{Executor, Store};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Named-store cache over one storage engine.
pub struct Registry {
    engine: Arc<dyn StorageEngine>,
    codec: Arc<dyn ObjectCodec>,
    token: OnceLock<String>,
    stores: DashMap<String, Store>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("initialized", &self.token.get())
            .field("stores", &self.stores.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Creates an uninitialized registry over `engine`.
    pub fn new<E: StorageEngine>(engine: E) -> Self {
        Self::from_arc(Arc::new(engine))
    }

    /// Creates an uninitialized registry over a shared engine.
    pub fn from_arc(engine: Arc<dyn StorageEngine>) -> Self {
        Self {
            engine,
            codec: Arc::new(JsonCodec),
            token: OnceLock::new(),
            stores: DashMap::new(),
        }
    }

    /// Registry over a fresh [`MemoryEngine`].
    pub fn in_memory() -> Self {
        Self::new(MemoryEngine::new())
    }

    /// Registry over a fresh [`RedbEngine`].
    pub fn redb() -> Self {
        Self::new(RedbEngine::new())
    }

    /// Replaces the object codec used by stores created afterwards.
    #[must_use]
    pub fn with_codec<C: ObjectCodec>(mut self, codec: C) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Builds a registry from `config`, initializing the engine and opening
    /// the configured stores.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if validation fails and
    /// [`Error::Engine`] if the engine cannot be initialized or a store
    /// cannot be opened.
    pub fn from_config<E: StorageEngine>(engine: E, config: &RegistryConfig) -> Result<Self> {
        let validation = config
            .validate()
            .map_err(|e| Error::Config(format!("{e:#}")))?;
        for warning in &validation.warnings {
            warn!("{warning}");
        }

        let registry = Self::new(engine);
        registry.initialize(&config.location, config.log_level)?;
        for store in &config.stores {
            registry.store(store.clone())?;
        }
        Ok(registry)
    }

    /// Initializes the engine at `location`.
    ///
    /// Returns the engine token. Once initialized, later calls return the
    /// recorded token without touching the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] if the engine rejects the location.
    pub fn initialize(&self, location: impl AsRef<Path>, log_level: LogLevel) -> Result<String> {
        if let Some(token) = self.token.get() {
            return Ok(token.clone());
        }

        let location = location.as_ref();
        let token = self.engine.initialize(location, log_level)?;
        info!(location = %location.display(), ?log_level, "Registry initialized");

        // A racing initializer may have won; both tokens name the same target
        Ok(self.token.get_or_init(|| token).clone())
    }

    /// Returns true once [`initialize`](Self::initialize) succeeded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.token.get().is_some()
    }

    /// Returns the store named `config.name`, creating it on first request.
    ///
    /// When the store already exists its original configuration is kept and
    /// `config` is ignored. Concurrent first requests for one name all get
    /// the same store, although the engine may be asked to open the
    /// namespace more than once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before initialization and
    /// [`Error::Engine`] if the namespace cannot be opened.
    pub fn store(&self, config: StoreConfig) -> Result<Store> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        if let Some(existing) = self.stores.get(&config.name) {
            log_ignored_settings(existing.value(), &config);
            return Ok(existing.value().clone());
        }

        // Opened outside the map lock; a racing loser's store is discarded
        let name = config.name.clone();
        let opened = Store::open(self.engine.as_ref(), config, Arc::clone(&self.codec))?;

        match self.stores.entry(name) {
            Entry::Occupied(entry) => {
                debug!(store = %opened.name(), "Discarding store opened concurrently");
                log_ignored_settings(entry.get(), opened.config());
                Ok(entry.get().clone())
            },
            Entry::Vacant(entry) => {
                info!(store = %opened.name(), "Store opened");
                Ok(entry.insert(opened).clone())
            },
        }
    }

    /// Convenience form of [`store`](Self::store).
    ///
    /// # Errors
    ///
    /// Same as [`store`](Self::store).
    pub fn store_with(
        &self,
        name: &str,
        multi_process: bool,
        ttl_enabled: bool,
        executor: Executor,
        prefill_async: bool,
    ) -> Result<Store> {
        self.store(
            StoreConfig::new(name)
                .with_multi_process(multi_process)
                .with_ttl(ttl_enabled)
                .with_executor(executor)
                .with_prefill_async(prefill_async),
        )
    }

    /// Store `name` with default settings.
    ///
    /// # Errors
    ///
    /// Same as [`store`](Self::store).
    pub fn store_named(&self, name: &str) -> Result<Store> {
        self.store(StoreConfig::new(name))
    }

    /// The default store.
    ///
    /// # Errors
    ///
    /// Same as [`store`](Self::store).
    pub fn default_store(&self) -> Result<Store> {
        self.store_named(DEFAULT_STORE_NAME)
    }

    /// Number of stores created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Names of the stores created so far, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }
}

fn log_ignored_settings(existing: &Store, requested: &StoreConfig) {
    let current = existing.config();
    if current.multi_process != requested.multi_process
        || current.ttl_enabled != requested.ttl_enabled
        || current.prefill_async != requested.prefill_async
    {
        debug!(
            store = %current.name,
            "Store already open, ignoring differing settings"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AccessMode, EngineHandle};
    use std::path::PathBuf;
    use std::sync::{Barrier, Weak};
    use std::thread;
    use tempfile::TempDir;

    fn initialized() -> Registry {
        let registry = Registry::in_memory();
        registry.initialize("memory", LogLevel::None).unwrap();
        registry
    }

    #[test]
    fn test_store_before_initialize_fails() {
        let registry = Registry::in_memory();
        assert!(!registry.is_initialized());
        assert!(matches!(
            registry.store_named("x"),
            Err(Error::NotInitialized)
        ));
        assert!(matches!(registry.default_store(), Err(Error::NotInitialized)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_initialize_twice_returns_same_token() {
        let registry = Registry::in_memory();
        let first = registry.initialize("a", LogLevel::None).unwrap();
        let second = registry.initialize("b", LogLevel::Debug).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_same_name_returns_same_instance() {
        let registry = initialized();
        let a = registry.store_named("x").unwrap();
        let b = registry.store_named("x").unwrap();
        let c = registry.store_named("y").unwrap();

        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(registry.names(), vec!["x", "y"]);
    }

    #[test]
    fn test_first_config_wins() {
        let registry = initialized();
        let first = registry
            .store(StoreConfig::new("cfg").with_ttl(true).with_multi_process(false))
            .unwrap();
        let second = registry
            .store_with("cfg", true, false, Executor::ambient(), true)
            .unwrap();

        assert!(first.ptr_eq(&second));
        assert!(second.config().ttl_enabled);
        assert!(!second.config().prefill_async);
        assert_eq!(second.config().access_mode(), AccessMode::SingleProcess);
    }

    #[test]
    fn test_default_store_name() {
        let registry = initialized();
        let store = registry.default_store().unwrap();
        assert_eq!(store.name(), DEFAULT_STORE_NAME);
        assert!(store.config().multi_process);
    }

    #[test]
    fn test_concurrent_first_access_creates_one_store() {
        let registry = Arc::new(initialized());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.store_named("X").unwrap()
                })
            })
            .collect();

        let stores: Vec<Store> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for store in &stores[1..] {
            assert!(stores[0].ptr_eq(store));
        }
        assert_eq!(registry.len(), 1);
    }

    /// Engine that requests another store from the registry while opening.
    struct NestedOpenEngine {
        inner: MemoryEngine,
        registry: OnceLock<Weak<Registry>>,
    }

    impl StorageEngine for NestedOpenEngine {
        fn initialize(&self, root: &Path, log_level: LogLevel) -> anyhow::Result<String> {
            self.inner.initialize(root, log_level)
        }

        fn open(&self, name: &str, mode: AccessMode) -> anyhow::Result<Arc<dyn EngineHandle>> {
            if name == "outer"
                && let Some(registry) = self.registry.get().and_then(Weak::upgrade)
            {
                for nested in ["a", "b", "c", "d", "e", "f", "g", "h"] {
                    registry
                        .store_named(nested)
                        .map_err(|e| anyhow::anyhow!("{e}"))?;
                }
            }
            self.inner.open(name, mode)
        }
    }

    #[test]
    fn test_engine_open_may_use_the_registry() {
        let engine = Arc::new(NestedOpenEngine {
            inner: MemoryEngine::new(),
            registry: OnceLock::new(),
        });
        let registry = Arc::new(Registry::from_arc(Arc::clone(&engine) as Arc<dyn StorageEngine>));
        registry.initialize("memory", LogLevel::None).unwrap();
        assert!(engine.registry.set(Arc::downgrade(&registry)).is_ok());

        let (tx, rx) = std::sync::mpsc::channel();
        let worker = Arc::clone(&registry);
        thread::spawn(move || {
            let opened = worker.store_named("outer").is_ok();
            let _ = tx.send(opened);
        });

        let opened = rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("store lookup blocked while opening a namespace");
        assert!(opened);
        assert_eq!(
            registry.names(),
            vec!["a", "b", "c", "d", "e", "f", "g", "h", "outer"]
        );
    }

    #[test]
    fn test_from_config_opens_stores() {
        let tmp = TempDir::new().unwrap();
        let config = RegistryConfig {
            location: tmp.path().to_path_buf(),
            log_level: LogLevel::None,
            stores: vec![
                StoreConfig::new("session").with_ttl(true),
                StoreConfig::new("session"),
                StoreConfig::new("prefs"),
            ],
        };

        let registry = Registry::from_config(RedbEngine::new(), &config).unwrap();
        assert!(registry.is_initialized());
        assert_eq!(registry.names(), vec!["prefs", "session"]);
        assert!(registry.store_named("session").unwrap().config().ttl_enabled);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = RegistryConfig {
            location: PathBuf::from("/tmp/unused"),
            log_level: LogLevel::None,
            stores: vec![StoreConfig::new("")],
        };
        assert!(matches!(
            Registry::from_config(MemoryEngine::new(), &config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_redb_registry_persists_between_instances() {
        let tmp = TempDir::new().unwrap();

        {
            let registry = Registry::redb();
            registry.initialize(tmp.path(), LogLevel::None).unwrap();
            let store = registry.store_named("prefs").unwrap();
            assert!(store.save("theme", "dark".to_string(), None).unwrap());
        }

        let registry = Registry::redb();
        registry.initialize(tmp.path(), LogLevel::None).unwrap();
        let store = registry.store_named("prefs").unwrap();
        assert_eq!(
            store.read::<String>("theme", None).unwrap().as_deref(),
            Some("dark")
        );
    }
}
