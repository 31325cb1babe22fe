//! TTL bookkeeping.
//!
//! Expiry is tracked in a sibling marker key (`key + "_TTL"`) holding an
//! absolute epoch timestamp in milliseconds. Liveness is evaluated at read
//! time only; expired entries stay physically present until overwritten or
//! removed.

use crate::constants::TTL_SUFFIX;
use crate::engine::{EngineHandle, Value};
use std::time::Duration;
use tracing::warn;

/// Returns the marker key holding the expiry stamp for `key`.
#[must_use]
pub fn marker_key(key: &str) -> String {
    format!("{key}{TTL_SUFFIX}")
}

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Read-visibility and write-expiry rules for one store.
#[derive(Debug, Clone, Copy)]
pub struct TtlPolicy {
    default_enabled: bool,
}

impl TtlPolicy {
    /// Creates a policy enforcing expiry on reads when `default_enabled`.
    #[must_use]
    pub fn new(default_enabled: bool) -> Self {
        Self { default_enabled }
    }

    /// Resolves a per-call override against the store default.
    #[must_use]
    pub fn resolve(&self, explicit: Option<bool>) -> bool {
        explicit.unwrap_or(self.default_enabled)
    }

    /// Absolute expiry stamp for a write at `now` with `ttl`.
    ///
    /// Returns `None` for a missing or zero TTL, meaning no marker is written.
    #[must_use]
    pub fn expiry_at(now: i64, ttl: Option<Duration>) -> Option<i64> {
        let ttl = ttl.filter(|ttl| !ttl.is_zero())?;
        let millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        Some(now.saturating_add(millis.max(1)))
    }

    /// Decides whether `key` is visible at `now`.
    ///
    /// A key is alive when it is physically present and either enforcement
    /// is off or its marker holds a stamp strictly after `now`. Engine
    /// failures read as not alive.
    pub fn is_alive(&self, handle: &dyn EngineHandle, key: &str, enforce: bool, now: i64) -> bool {
        let present = handle.contains_key(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "Presence check failed");
            false
        });
        if !present {
            return false;
        }
        if !enforce {
            return true;
        }

        match handle.get(&marker_key(key)) {
            Ok(Some(Value::Int64(expires_at))) => expires_at > now,
            Ok(_) => false,
            Err(e) => {
                warn!(key, error = %e, "TTL marker read failed");
                false
            },
        }
    }
}
