//! Typed, TTL-aware store over one engine namespace.
//!
//! Writes stamp an optional TTL marker, encode through the adapter and push
//! the new value to the key's [`LiveEvent`]. Reads check liveness first and
//! decode as the requested kind.
//!
//! # Example
//!
//! ```ignore
//! use varddb::{Registry, LogLevel, StoreConfig};
//! use std::time::Duration;
//!
//! let registry = Registry::in_memory();
//! registry.initialize("/tmp/kv", LogLevel::None)?;
//! let store = registry.store(StoreConfig::new("session").with_ttl(true))?;
//!
//! store.save("count", 42i32, Some(Duration::from_secs(60)))?;
//! assert_eq!(store.read::<i32>("count", None)?, Some(42));
//! ```

mod asynchronous;
mod executor;
mod observe;


pub use executor::Executor;

use crate::codec::{Adapter, Data, Kind, ObjectCodec, StoreData};
use crate::config::StoreConfig;
use crate::engine::{EngineHandle, StorageEngine, Value};
use crate::error::{Error, Result};
use crate::notify::LiveEvent;
use crate::ttl::{self, TtlPolicy};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::{debug, warn};

/// Notification container for one key plus its one-shot fill flag.
pub(crate) struct Slot {
    pub(crate) live: Arc<LiveEvent<Data>>,
    pub(crate) fill_started: AtomicBool,
}

struct Inner {
    config: StoreConfig,
    handle: Arc<dyn EngineHandle>,
    adapter: Adapter,
    ttl: TtlPolicy,
    slots: DashMap<String, Arc<Slot>>,
}

/// A named, typed key-value store.
///
/// `Store` is a cheap handle; clones share the same namespace, adapter and
/// observables. Use [`ptr_eq`](Self::ptr_eq) to test identity.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.config.name)
            .field("ttl_enabled", &self.inner.config.ttl_enabled)
            .field("observables", &self.inner.slots.len())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Opens the namespace `config.name` on `engine`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot open the namespace.
    pub fn open(
        engine: &dyn StorageEngine,
        config: StoreConfig,
        codec: Arc<dyn ObjectCodec>,
    ) -> Result<Self> {
        let handle = engine
            .open(&config.name, config.access_mode())
            .map_err(Error::Engine)?;
        Ok(Self::from_handle(config, handle, codec))
    }

    /// Builds a store over an already opened engine handle.
    pub fn from_handle(
        config: StoreConfig,
        handle: Arc<dyn EngineHandle>,
        codec: Arc<dyn ObjectCodec>,
    ) -> Self {
        debug!(store = %config.name, codec = codec.name(), "Store created");
        Self {
            inner: Arc::new(Inner {
                ttl: TtlPolicy::new(config.ttl_enabled),
                adapter: Adapter::new(codec),
                handle,
                config,
                slots: DashMap::new(),
            }),
        }
    }

    /// Namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Configuration this store was created with.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Execution context for the async variants.
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.inner.config.executor
    }

    /// Returns true if both handles refer to the same store instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Reads `key` as `T`.
    ///
    /// `ttl_enabled` overrides the store's default expiry enforcement.
    /// Returns `Ok(None)` when the key is missing, expired, or unreadable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the stored value is not a `T`.
    pub fn read<T: StoreData>(&self, key: &str, ttl_enabled: Option<bool>) -> Result<Option<T>> {
        match self.get_data_by_kind(key, T::KIND, ttl_enabled)? {
            Some(data) => T::from_data(data)
                .map(Some)
                .map_err(|e| Error::decode(key, e)),
            None => Ok(None),
        }
    }

    /// Reads `key` as `T`, substituting `default` when absent or expired.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the stored value is not a `T`.
    pub fn read_or<T: StoreData>(&self, key: &str, default: T, ttl_enabled: Option<bool>) -> Result<T> {
        Ok(self.read(key, ttl_enabled)?.unwrap_or(default))
    }

    /// Reads `key` as `kind`. [`Kind::None`] always yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the stored value is not of `kind`.
    pub fn get_data_by_kind(
        &self,
        key: &str,
        kind: Kind,
        ttl_enabled: Option<bool>,
    ) -> Result<Option<Data>> {
        if kind == Kind::None || !self.is_alive(key, ttl_enabled) {
            return Ok(None);
        }

        let value = match self.inner.handle.get(key) {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(store = %self.name(), key, error = %e, "Engine read failed");
                return Ok(None);
            },
        };

        self.inner
            .adapter
            .decode(value, kind)
            .map(Some)
            .map_err(|e| Error::decode(key, e))
    }

    /// Stores `value` under `key`, expiring after `ttl` if given.
    ///
    /// Returns whether the engine accepted the value write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the value cannot be encoded. The TTL
    /// marker has already been written by then; the value is left untouched.
    pub fn save<T: StoreData>(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<bool> {
        self.stamp_ttl(key, ttl);
        let data = value.into_data().map_err(|e| Error::encode(key, e))?;
        self.write_data(key, data)
    }

    /// Stores tagged `data` under `key`.
    ///
    /// The TTL marker is written first and is kept even if encoding or the
    /// value write fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the object codec rejects the value.
    pub fn save_data(&self, key: &str, data: Data, ttl: Option<Duration>) -> Result<bool> {
        self.stamp_ttl(key, ttl);
        self.write_data(key, data)
    }

    fn stamp_ttl(&self, key: &str, ttl: Option<Duration>) {
        if let Some(expires_at) = TtlPolicy::expiry_at(ttl::now_millis(), ttl)
            && let Err(e) = self
                .inner
                .handle
                .set(&ttl::marker_key(key), Value::Int64(expires_at))
        {
            warn!(store = %self.name(), key, error = %e, "TTL marker write failed");
        }
    }

    fn write_data(&self, key: &str, data: Data) -> Result<bool> {
        let value = self
            .inner
            .adapter
            .encode(&data)
            .map_err(|e| Error::encode(key, e))?;

        match self.inner.handle.set(key, value) {
            Ok(()) => {
                debug!(store = %self.name(), key, kind = %data.kind(), "Value saved");
                self.slot(key).live.set_value(Some(data));
                Ok(true)
            },
            Err(e) => {
                warn!(store = %self.name(), key, error = %e, "Engine write failed");
                Ok(false)
            },
        }
    }

    /// Checks physical presence of `key`, ignoring TTL.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.handle.contains_key(key).unwrap_or_else(|e| {
            warn!(store = %self.name(), key, error = %e, "Presence check failed");
            false
        })
    }

    /// Returns true if `key` is visible to reads with the given enforcement.
    #[must_use]
    pub fn is_alive(&self, key: &str, ttl_enabled: Option<bool>) -> bool {
        let enforce = self.inner.ttl.resolve(ttl_enabled);
        self.inner
            .ttl
            .is_alive(self.inner.handle.as_ref(), key, enforce, ttl::now_millis())
    }

    /// Deletes the values of `keys`. TTL markers are left in place.
    ///
    /// Observers of removed keys receive a cleared event.
    pub fn remove(&self, keys: &[&str]) -> bool {
        if let Err(e) = self.inner.handle.remove_keys(keys) {
            warn!(store = %self.name(), ?keys, error = %e, "Engine remove failed");
            return false;
        }
        debug!(store = %self.name(), count = keys.len(), "Keys removed");

        for key in keys {
            let slot = self.inner.slots.get(*key).map(|slot| Arc::clone(slot.value()));
            if let Some(slot) = slot {
                slot.live.set_value(None);
            }
        }
        true
    }

    /// Deletes every key in the namespace and clears every observable.
    pub fn clear(&self) -> bool {
        if let Err(e) = self.inner.handle.clear_all() {
            warn!(store = %self.name(), error = %e, "Engine clear failed");
            return false;
        }
        debug!(store = %self.name(), "Store cleared");

        let slots: Vec<_> = self
            .inner
            .slots
            .iter()
            .map(|slot| Arc::clone(slot.value()))
            .collect();
        for slot in slots {
            slot.live.set_value(None);
        }
        true
    }

    /// Returns the slot for `key`, creating it on first use.
    pub(crate) fn slot(&self, key: &str) -> Arc<Slot> {
        if let Some(slot) = self.inner.slots.get(key) {
            return Arc::clone(slot.value());
        }
        let slot = self
            .inner
            .slots
            .entry(key.to_string())
            .or_insert_with(|| {
                Arc::new(Slot {
                    live: Arc::new(LiveEvent::new()),
                    fill_started: AtomicBool::new(false),
                })
            });
        Arc::clone(slot.value())
    }
}
