//! Store and registry configuration.
//!
//! - [`StoreConfig`] - settings of one named store, fixed once the store
//!   exists
//! - [`RegistryConfig`] - engine location, log level and stores to open at
//!   startup, loadable from TOML
//!
//! ```toml
//! location = "/var/lib/myapp/kv"
//! log_level = "info"
//!
//! [[stores]]
//! name = "session"
//! ttl_enabled = true
//! multi_process = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::engine::AccessMode;
use crate::logging::LogLevel;
use crate::store::Executor;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Non-fatal warnings that should be logged but don't prevent operation.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns true if there are any warnings.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Settings of one named store.
///
/// The first configuration registered for a name wins; later lookups with
/// other settings reuse the existing store unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Namespace identity, unique per registry.
    #[serde(default = "default_name")]
    pub name: String,
    /// Engine access mode.
    #[serde(default = "default_multi_process")]
    pub multi_process: bool,
    /// Enforce TTL markers on reads that don't say otherwise.
    #[serde(default, alias = "is_ttl")]
    pub ttl_enabled: bool,
    /// Where async operations run.
    #[serde(skip)]
    pub executor: Executor,
    /// Fill lazily-filled observables in the background on first access.
    #[serde(default, alias = "prefill_live_data_async")]
    pub prefill_async: bool,
}

fn default_name() -> String {
    constants::DEFAULT_STORE_NAME.to_string()
}

fn default_multi_process() -> bool {
    constants::DEFAULT_MULTI_PROCESS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            multi_process: default_multi_process(),
            ttl_enabled: false,
            executor: Executor::ambient(),
            prefill_async: false,
        }
    }
}

impl StoreConfig {
    /// Default settings for the store `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_multi_process(mut self, multi_process: bool) -> Self {
        self.multi_process = multi_process;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl_enabled: bool) -> Self {
        self.ttl_enabled = ttl_enabled;
        self
    }

    #[must_use]
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    #[must_use]
    pub fn with_prefill_async(mut self, prefill_async: bool) -> Self {
        self.prefill_async = prefill_async;
        self
    }

    /// Engine access mode derived from `multi_process`.
    #[must_use]
    pub fn access_mode(&self) -> AccessMode {
        AccessMode::from_multi_process(self.multi_process)
    }
}

/// Registry bootstrap settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Engine root; defaults to the platform data directory.
    #[serde(default = "default_location")]
    pub location: PathBuf,
    #[serde(default)]
    pub log_level: LogLevel,
    /// Stores opened eagerly at startup.
    #[serde(default)]
    pub stores: Vec<StoreConfig>,
}

/// Platform data directory for the engine, falling back to the working
/// directory.
#[must_use]
pub fn default_location() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(constants::DEFAULT_DATA_DIR)
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            location: default_location(),
            log_level: LogLevel::default(),
            stores: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: RegistryConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// Duplicate store names are a warning: the first entry wins.
    ///
    /// # Errors
    ///
    /// Returns an error if a store name is empty or the location is empty.
    pub fn validate(&self) -> Result<ValidationResult> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.location.as_os_str().is_empty() {
            errors.push("location cannot be empty".to_string());
        }

        let mut seen = HashSet::new();
        for store in &self.stores {
            if store.name.is_empty() {
                errors.push("store name cannot be empty".to_string());
            } else if !seen.insert(store.name.as_str()) {
                warnings.push(format!(
                    "Store '{}' is configured more than once; the first entry is used",
                    store.name
                ));
            }
        }

        if !errors.is_empty() {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }

        Ok(ValidationResult { warnings })
    }
}
