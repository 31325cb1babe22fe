//! Persistent storage engines.
//!
//! A store never touches storage directly; it goes through an
//! [`EngineHandle`] opened for its namespace. Two engines ship with the
//! crate:
//!
//! - **RedbEngine**: persistent, one redb file per engine root with a table
//!   per namespace
//! - **MemoryEngine**: process-local, backed by `DashMap` (testing/embedding)
//!
//! # Custom Engines
//!
//! ```ignore
//! use varddb::engine::{StorageEngine, EngineHandle};
//!
//! struct SledEngine { /* ... */ }
//! impl StorageEngine for SledEngine { /* ... */ }
//!
//! let registry = varddb::Registry::new(SledEngine::new());
//! ```

mod backend;
mod memory;
mod redb;
mod value;

pub use backend::{AccessMode, EngineHandle, StorageEngine};
pub use memory::{MemoryEngine, MemoryHandle};
pub use self::redb::{RedbEngine, RedbHandle};
pub use value::Value;
