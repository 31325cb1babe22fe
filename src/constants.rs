//! Shared defaults for stores, engines and the registry.

/// Name of the store returned by [`Registry::default_store`](crate::Registry::default_store).
pub const DEFAULT_STORE_NAME: &str = "VARD_DEFAULT_STORE_KEY";

/// Suffix appended to a key to form its TTL marker key.
pub const TTL_SUFFIX: &str = "_TTL";

/// File name of the redb database created under the engine root.
pub const REDB_FILE_NAME: &str = "varddb.redb";

/// Prefix for per-namespace redb table names.
pub const REDB_TABLE_PREFIX: &str = "ns:";

/// Directory under the platform data dir used when no location is given.
pub const DEFAULT_DATA_DIR: &str = "varddb";

/// Default engine access mode is multi-process.
pub const DEFAULT_MULTI_PROCESS: bool = true;
