//! In-memory storage engine.
//!
//! Keeps every namespace in a `DashMap`. Nothing survives the process, and
//! the access mode is accepted but has no effect. Ideal for tests and for
//! embedding where persistence is not wanted.

use super::backend::{AccessMode, EngineHandle, StorageEngine};
use super::value::Value;
use crate::logging::LogLevel;
use anyhow::Result;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Token returned by [`MemoryEngine::initialize`].
const MEMORY_TOKEN: &str = "memory";

/// In-memory engine; namespaces live as long as the engine.
///
/// Opening the same namespace twice returns handles to the same data.
#[derive(Default)]
pub struct MemoryEngine {
    namespaces: DashMap<String, Arc<MemoryHandle>>,
    log_level: RwLock<LogLevel>,
}

impl MemoryEngine {
    /// Creates an engine with no namespaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of namespaces opened so far.
    #[must_use]
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }
}

impl StorageEngine for MemoryEngine {
    fn initialize(&self, _root: &Path, log_level: LogLevel) -> Result<String> {
        *self.log_level.write() = log_level;
        Ok(MEMORY_TOKEN.to_string())
    }

    fn open(&self, name: &str, mode: AccessMode) -> Result<Arc<dyn EngineHandle>> {
        if self.log_level.read().enables(tracing::Level::DEBUG) {
            debug!(namespace = name, ?mode, "Opening in-memory namespace");
        }
        let handle = self
            .namespaces
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryHandle::new()))
            .clone();
        Ok(handle)
    }
}

/// One in-memory namespace.
#[derive(Default)]
pub struct MemoryHandle {
    data: DashMap<String, Value>,
}

impl MemoryHandle {
    /// Creates an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of physical keys, TTL markers included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the namespace holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl EngineHandle for MemoryHandle {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.data.contains_key(key))
    }

    fn remove_keys(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.data.remove(*key);
        }
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        self.data.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(engine: &MemoryEngine, name: &str) -> Arc<dyn EngineHandle> {
        engine.open(name, AccessMode::SingleProcess).unwrap()
    }

    #[test]
    fn test_get_set() {
        let engine = MemoryEngine::new();
        let handle = open(&engine, "ns");

        handle.set("key1", Value::Int32(7)).unwrap();
        assert_eq!(handle.get("key1").unwrap(), Some(Value::Int32(7)));
    }

    #[test]
    fn test_get_nonexistent() {
        let engine = MemoryEngine::new();
        let handle = open(&engine, "ns");
        assert_eq!(handle.get("nonexistent").unwrap(), None);
        assert!(!handle.contains_key("nonexistent").unwrap());
    }

    #[test]
    fn test_overwrite_replaces_variant() {
        let engine = MemoryEngine::new();
        let handle = open(&engine, "ns");

        handle.set("key", Value::Bool(true)).unwrap();
        handle.set("key", Value::String("now a string".into())).unwrap();

        assert_eq!(
            handle.get("key").unwrap(),
            Some(Value::String("now a string".into()))
        );
    }

    #[test]
    fn test_remove_keys_ignores_missing() {
        let engine = MemoryEngine::new();
        let handle = open(&engine, "ns");

        handle.set("a", Value::Int64(1)).unwrap();
        handle.set("b", Value::Int64(2)).unwrap();
        handle.remove_keys(&["a", "missing"]).unwrap();

        assert!(!handle.contains_key("a").unwrap());
        assert!(handle.contains_key("b").unwrap());
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let engine = MemoryEngine::new();
        let first = open(&engine, "first");
        let second = open(&engine, "second");

        first.set("key", Value::Bool(true)).unwrap();
        assert!(second.get("key").unwrap().is_none());

        second.clear_all().unwrap();
        assert!(first.contains_key("key").unwrap());
    }

    #[test]
    fn test_reopen_shares_data() {
        let engine = MemoryEngine::new();
        open(&engine, "ns").set("key", Value::Float64(1.5)).unwrap();

        let again = open(&engine, "ns");
        assert_eq!(again.get("key").unwrap(), Some(Value::Float64(1.5)));
        assert_eq!(engine.namespace_count(), 1);
    }
}
