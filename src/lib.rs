//! Typed, TTL-aware key-value storage with exactly-once change notifications.
//!
//! - [`Registry`] - named-store cache over one storage engine
//! - [`Store`] - typed reads/writes with optional expiry, plus observables
//! - [`notify`] - single-consumption observable containers
//! - [`engine`] - storage engine traits with in-memory and redb engines
//! - [`codec`] - kind tags, tagged data and the object codec seam
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use varddb::{LogLevel, Registry, StoreConfig};
//!
//! # fn main() -> varddb::Result<()> {
//! let registry = Registry::in_memory();
//! registry.initialize("kv", LogLevel::None)?;
//!
//! let store = registry.store(StoreConfig::new("session"))?;
//! store.save("count", 42i32, Some(Duration::from_secs(60)))?;
//!
//! assert_eq!(store.read::<i32>("count", Some(true))?, Some(42));
//! assert!(store.contains_key("count"));
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod notify;
pub mod registry;
pub mod store;
pub mod ttl;

pub use codec::{CodecError, Data, JsonCodec, Kind, Object, ObjectCodec, StoreData, Structured};
pub use config::{RegistryConfig, StoreConfig};
pub use error::{Error, Result};
pub use logging::LogLevel;
pub use registry::Registry;
pub use store::{Executor, Store};
