//! Redb-backed storage engine.
//!
//! One redb database file lives under the initialized root; every namespace
//! is a separate table inside it. Values are stored as JSON-encoded
//! [`Value`]s so the variant survives a round trip.

use super::backend::{AccessMode, EngineHandle, StorageEngine};
use super::value::Value;
use crate::constants::{REDB_FILE_NAME, REDB_TABLE_PREFIX};
use crate::logging::LogLevel;
use anyhow::{Context, Result, bail};
use parking_lot::RwLock;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

struct RedbState {
    root: PathBuf,
    token: String,
    db: Arc<Database>,
    log_level: LogLevel,
}

/// Persistent engine backed by a single redb database.
///
/// redb takes an exclusive lock on its file, so [`AccessMode::MultiProcess`]
/// is accepted but sharing stays within this process.
#[derive(Default)]
pub struct RedbEngine {
    state: RwLock<Option<RedbState>>,
}

impl RedbEngine {
    /// Creates an uninitialized engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the database file, once initialized.
    #[must_use]
    pub fn database_path(&self) -> Option<PathBuf> {
        self.state
            .read()
            .as_ref()
            .map(|state| state.root.join(REDB_FILE_NAME))
    }
}

impl StorageEngine for RedbEngine {
    fn initialize(&self, root: &Path, log_level: LogLevel) -> Result<String> {
        let mut state = self.state.write();
        if let Some(existing) = state.as_ref() {
            if existing.root == root {
                return Ok(existing.token.clone());
            }
            bail!(
                "redb engine already initialized at {}, refusing {}",
                existing.root.display(),
                root.display()
            );
        }

        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create data directory: {}", root.display()))?;

        let path = root.join(REDB_FILE_NAME);
        let db = Database::create(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        if log_level.enables(tracing::Level::INFO) {
            info!(path = %path.display(), "redb engine initialized");
        }

        let token = path.display().to_string();
        *state = Some(RedbState {
            root: root.to_path_buf(),
            token: token.clone(),
            db: Arc::new(db),
            log_level,
        });
        Ok(token)
    }

    fn open(&self, name: &str, mode: AccessMode) -> Result<Arc<dyn EngineHandle>> {
        let state = self.state.read();
        let Some(state) = state.as_ref() else {
            bail!("redb engine not initialized");
        };

        let handle = RedbHandle {
            db: Arc::clone(&state.db),
            table: format!("{REDB_TABLE_PREFIX}{name}"),
        };

        // Create the table up front so read transactions can open it
        let write_txn = handle
            .db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            let _table = write_txn
                .open_table(handle.definition())
                .with_context(|| format!("Failed to create table '{}'", handle.table))?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        if state.log_level.enables(tracing::Level::DEBUG) {
            debug!(namespace = name, ?mode, table = %handle.table, "Opened redb namespace");
        }

        Ok(Arc::new(handle))
    }
}

/// Handle to one namespace table.
#[derive(Clone)]
pub struct RedbHandle {
    db: Arc<Database>,
    table: String,
}

impl RedbHandle {
    fn definition(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(&self.table)
    }
}

impl EngineHandle for RedbHandle {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(self.definition())
            .with_context(|| format!("Failed to open table '{}'", self.table))?;

        let result = table
            .get(key)
            .with_context(|| format!("Failed to read key '{key}'"))?;

        match result {
            Some(guard) => {
                let value = serde_json::from_slice(guard.value())
                    .with_context(|| format!("Failed to deserialize value for key '{key}'"))?;
                Ok(Some(value))
            },
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let json = serde_json::to_vec(&value).context("Failed to serialize value to JSON")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(self.definition())
                .with_context(|| format!("Failed to open table '{}'", self.table))?;

            table
                .insert(key, json.as_slice())
                .with_context(|| format!("Failed to insert key '{key}'"))?;
        }
        write_txn
            .commit()
            .context("Failed to commit set transaction")?;

        Ok(())
    }

    fn contains_key(&self, key: &str) -> Result<bool> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;

        let table = read_txn
            .open_table(self.definition())
            .with_context(|| format!("Failed to open table '{}'", self.table))?;

        let found = table
            .get(key)
            .with_context(|| format!("Failed to read key '{key}'"))?
            .is_some();
        Ok(found)
    }

    fn remove_keys(&self, keys: &[&str]) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(self.definition())
                .with_context(|| format!("Failed to open table '{}'", self.table))?;

            for key in keys {
                table
                    .remove(*key)
                    .with_context(|| format!("Failed to remove key '{key}'"))?;
            }
        }
        write_txn
            .commit()
            .context("Failed to commit remove transaction")?;

        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(self.definition())
                .with_context(|| format!("Failed to open table '{}'", self.table))?;

            table
                .retain(|_, _| false)
                .with_context(|| format!("Failed to clear table '{}'", self.table))?;
        }
        write_txn
            .commit()
            .context("Failed to commit clear transaction")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn engine(tmp: &TempDir) -> RedbEngine {
        let engine = RedbEngine::new();
        engine.initialize(tmp.path(), LogLevel::None).unwrap();
        engine
    }

    #[test]
    fn test_open_before_initialize_fails() {
        let engine = RedbEngine::new();
        assert!(engine.open("ns", AccessMode::SingleProcess).is_err());
    }

    #[test]
    fn test_initialize_is_idempotent_for_same_root() {
        let tmp = TempDir::new().unwrap();
        let engine = RedbEngine::new();

        let first = engine.initialize(tmp.path(), LogLevel::None).unwrap();
        let second = engine.initialize(tmp.path(), LogLevel::Debug).unwrap();
        assert_eq!(first, second);

        let other = TempDir::new().unwrap();
        assert!(engine.initialize(other.path(), LogLevel::None).is_err());
    }

    #[test]
    fn test_every_variant_survives_storage() {
        let tmp = TempDir::new().unwrap();
        let handle = engine(&tmp).open("ns", AccessMode::SingleProcess).unwrap();

        let set: BTreeSet<String> = ["a", "b"].iter().map(ToString::to_string).collect();
        let values = vec![
            Value::Bool(false),
            Value::Int32(-17),
            Value::Int64(i64::MAX),
            Value::Float32(0.25),
            Value::Float64(-3.5),
            Value::String(String::new()),
            Value::Bytes(vec![0, 255, 128]),
            Value::StringSet(set),
            Value::Structured(serde_json::json!({"nested": [1, {"deep": true}]})),
        ];

        for (i, value) in values.into_iter().enumerate() {
            let key = format!("key{i}");
            handle.set(&key, value.clone()).unwrap();
            assert_eq!(handle.get(&key).unwrap(), Some(value));
        }
    }

    #[test]
    fn test_special_floats_survive_storage() {
        let tmp = TempDir::new().unwrap();
        let handle = engine(&tmp).open("ns", AccessMode::SingleProcess).unwrap();

        for (i, v) in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0].into_iter().enumerate() {
            let key = format!("f64_{i}");
            handle.set(&key, Value::Float64(v)).unwrap();
            match handle.get(&key).unwrap() {
                Some(Value::Float64(back)) => assert_eq!(back.to_bits(), v.to_bits()),
                other => panic!("unexpected value for {key}: {other:?}"),
            }
        }

        for (i, v) in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -0.0].into_iter().enumerate() {
            let key = format!("f32_{i}");
            handle.set(&key, Value::Float32(v)).unwrap();
            match handle.get(&key).unwrap() {
                Some(Value::Float32(back)) => assert_eq!(back.to_bits(), v.to_bits()),
                other => panic!("unexpected value for {key}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_remove_and_clear() {
        let tmp = TempDir::new().unwrap();
        let handle = engine(&tmp).open("ns", AccessMode::SingleProcess).unwrap();

        handle.set("a", Value::Int32(1)).unwrap();
        handle.set("b", Value::Int32(2)).unwrap();
        handle.set("c", Value::Int32(3)).unwrap();

        handle.remove_keys(&["a", "missing"]).unwrap();
        assert!(!handle.contains_key("a").unwrap());
        assert!(handle.contains_key("b").unwrap());

        handle.clear_all().unwrap();
        assert!(!handle.contains_key("b").unwrap());
        assert!(!handle.contains_key("c").unwrap());

        // Clearing an empty namespace is fine
        handle.clear_all().unwrap();
    }

    #[test]
    fn test_namespaces_are_separate_tables() {
        let tmp = TempDir::new().unwrap();
        let engine = engine(&tmp);
        let first = engine.open("first", AccessMode::SingleProcess).unwrap();
        let second = engine.open("second", AccessMode::MultiProcess).unwrap();

        first.set("key", Value::Bool(true)).unwrap();
        assert!(!second.contains_key("key").unwrap());

        second.clear_all().unwrap();
        assert!(first.contains_key("key").unwrap());
    }

    #[test]
    fn test_persistence_across_engines() {
        let tmp = TempDir::new().unwrap();

        {
            let handle = engine(&tmp).open("ns", AccessMode::SingleProcess).unwrap();
            handle.set("persistent", Value::String("value".into())).unwrap();
        }

        let handle = engine(&tmp).open("ns", AccessMode::SingleProcess).unwrap();
        assert_eq!(
            handle.get("persistent").unwrap(),
            Some(Value::String("value".into()))
        );
    }
}
