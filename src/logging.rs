//! Log levels and subscriber setup.
//!
//! The library only emits `tracing` events. Binaries and demos call
//! [`init_tracing`] to install a formatter; `RUST_LOG` takes precedence over
//! the level passed in.

use anyhow::{Result, anyhow};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Verbosity handed to the storage engine at initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    /// Engine stays silent.
    #[default]
    None,
}

impl LogLevel {
    /// Filter directive understood by `EnvFilter`.
    #[must_use]
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
            Self::None => "off",
        }
    }

    /// Returns true if events at `level` should be emitted.
    #[must_use]
    pub fn enables(self, level: tracing::Level) -> bool {
        let max = match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
            Self::None => return false,
        };
        // tracing orders levels by verbosity: TRACE > DEBUG > ... > ERROR
        level <= max
    }
}

/// Installs a global `fmt` subscriber filtered at `level`.
///
/// Set `json` for machine-readable output.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(level: LogLevel, json: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!("Failed to install tracing subscriber: {e}"))
}
