//! Engine traits.
//!
//! Defines the interface a persistent storage engine must provide. The
//! engine owns durability and per-key atomicity; everything above it
//! (TTL, encoding, notifications) lives in the store.

use super::value::Value;
use crate::logging::LogLevel;
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// How an engine namespace may be shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Only this process opens the namespace.
    SingleProcess,
    /// Several processes may open the namespace concurrently.
    MultiProcess,
}

impl AccessMode {
    /// Maps the `multi_process` config flag to a mode.
    #[must_use]
    pub fn from_multi_process(multi_process: bool) -> Self {
        if multi_process {
            Self::MultiProcess
        } else {
            Self::SingleProcess
        }
    }
}

/// Process-wide storage engine.
///
/// Must be initialized once before any namespace is opened.
pub trait StorageEngine: Send + Sync + 'static {
    /// Prepares the engine at `root` and returns an engine-defined token
    /// (typically the resolved location).
    ///
    /// Calling again with the same root must succeed and return the same
    /// token.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be prepared or conflicts
    /// with an earlier initialization.
    fn initialize(&self, root: &Path, log_level: LogLevel) -> Result<String>;

    /// Opens (creating if needed) the namespace `name`.
    ///
    /// May be called more than once for the same name, including
    /// concurrently; every call must yield a handle to the same data.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized or the namespace
    /// cannot be created.
    fn open(&self, name: &str, mode: AccessMode) -> Result<Arc<dyn EngineHandle>>;
}

/// Handle to one namespace of an engine.
///
/// All operations are atomic per key. Implementations must be thread-safe.
pub trait EngineHandle: Send + Sync + 'static {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Checks physical presence of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Removes every key in `keys`. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn remove_keys(&self, keys: &[&str]) -> Result<()>;

    /// Removes every key in the namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    fn clear_all(&self) -> Result<()>;
}
