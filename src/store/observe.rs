//! Observable accessors.

use super::Store;
use crate::codec::{Data, Kind};
use crate::notify::LiveEvent;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, warn};

impl Store {
    /// Returns the observable for `key`, creating it if needed.
    ///
    /// The observable only changes on writes, removals and clears.
    pub fn observable(&self, key: &str) -> Arc<LiveEvent<Data>> {
        Arc::clone(&self.slot(key).live)
    }

    /// Returns the observable for `key`, filling it from storage on first
    /// access.
    ///
    /// The fill reads `key` as `kind` with the given TTL enforcement. It runs
    /// inline, or on the executor when `fill_async` (default: the store's
    /// `prefill_async`) is set. At most one fill is attempted per key, and a
    /// fill never replaces a value a write produced in the meantime.
    pub fn filled_observable(
        &self,
        key: &str,
        kind: Kind,
        ttl_enabled: Option<bool>,
        fill_async: Option<bool>,
    ) -> Arc<LiveEvent<Data>> {
        let slot = self.slot(key);
        let live = Arc::clone(&slot.live);

        if live.has_value()
            || slot
                .fill_started
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            return live;
        }

        let store = self.clone();
        let key = key.to_string();
        let fill = move || store.fill(&key, kind, ttl_enabled);

        if fill_async.unwrap_or(self.config().prefill_async) {
            debug!(store = %self.name(), "Scheduling observable fill");
            self.executor().schedule(fill);
        } else {
            fill();
        }
        live
    }

    fn fill(&self, key: &str, kind: Kind, ttl_enabled: Option<bool>) {
        let data = match self.get_data_by_kind(key, kind, ttl_enabled) {
            Ok(Some(data)) => data,
            Ok(None) => return,
            Err(e) => {
                warn!(store = %self.name(), key, error = %e, "Observable fill failed");
                return;
            },
        };
        if self.slot(key).live.set_if_unset(Some(data)) {
            debug!(store = %self.name(), key, "Observable filled");
        }
    }
}
