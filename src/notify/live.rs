//! Observable container for one key.

use super::event::Event;
use super::observer::{Lifecycle, Observer, ObserverId, ObserverState, PendingObserver};
use parking_lot::RwLock;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Latest value of a key plus the observers waiting for the next one.
///
/// Attach and detach are safe while a delivery is running: fan-out iterates
/// a snapshot of the observer list taken when the value was set. Deliveries
/// to the same container are expected to come from one writer at a time.
pub struct LiveEvent<T> {
    observers: RwLock<Vec<Arc<PendingObserver<T>>>>,
    current: RwLock<Option<Arc<Event<T>>>>,
    next_id: AtomicU64,
}

impl<T> Default for LiveEvent<T> {
    fn default() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            current: RwLock::new(None),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<T> fmt::Debug for LiveEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveEvent")
            .field("observers", &self.observers.read().len())
            .field("has_event", &self.current.read().is_some())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> LiveEvent<T> {
    /// Creates an empty container with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `observer`, armed for the next value.
    pub fn attach<O>(&self, observer: O) -> ObserverId
    where
        O: Observer<T> + 'static,
    {
        self.insert(None, Box::new(observer))
    }

    /// Attaches `observer` bound to `owner`'s lifecycle.
    pub fn attach_with_owner<O>(&self, owner: &Lifecycle, observer: O) -> ObserverId
    where
        O: Observer<T> + 'static,
    {
        self.insert(Some(owner.clone()), Box::new(observer))
    }

    fn insert(&self, owner: Option<Lifecycle>, observer: Box<dyn Observer<T>>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let pending = Arc::new(PendingObserver::new(id, owner, observer));
        self.observers.write().push(pending);
        debug!(observer = %id, "Observer attached");
        id
    }

    /// Detaches an observer. Returns false if it was not attached.
    pub fn detach(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|observer| observer.id != id);
        before != observers.len()
    }

    /// Number of attached observers.
    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Delivery state of an attached observer.
    pub fn observer_state(&self, id: ObserverId) -> Option<ObserverState> {
        self.observers
            .read()
            .iter()
            .find(|observer| observer.id == id)
            .map(|observer| observer.state())
    }

    /// Latest value, read without consuming it.
    pub fn current_value(&self) -> Option<T> {
        self.current
            .read()
            .as_ref()
            .and_then(|event| event.peek().cloned())
    }

    /// Latest event, if any value was ever set.
    pub fn current_event(&self) -> Option<Arc<Event<T>>> {
        self.current.read().clone()
    }

    /// Returns true if the latest value is set and not a removal.
    pub fn has_value(&self) -> bool {
        self.current
            .read()
            .as_ref()
            .is_some_and(|event| event.peek().is_some())
    }

    /// Publishes `value` (or a removal when `None`) to every attached
    /// observer, each at most once.
    pub fn set_value(&self, value: Option<T>) {
        let snapshot = self.observers.read().clone();
        for observer in &snapshot {
            observer.arm();
        }

        let event = Arc::new(Event::new(value));
        *self.current.write() = Some(Arc::clone(&event));
        self.dispatch(&snapshot, &event);
    }

    /// Publishes `value` only if no value is currently held.
    ///
    /// Returns false, leaving the container untouched, when a value is
    /// already present.
    pub(crate) fn set_if_unset(&self, value: Option<T>) -> bool {
        let snapshot = self.observers.read().clone();
        let event = {
            let mut current = self.current.write();
            if current.as_ref().is_some_and(|event| event.peek().is_some()) {
                return false;
            }
            for observer in &snapshot {
                observer.arm();
            }
            let event = Arc::new(Event::new(value));
            *current = Some(Arc::clone(&event));
            event
        };
        self.dispatch(&snapshot, &event);
        true
    }

    fn dispatch(&self, observers: &[Arc<PendingObserver<T>>], event: &Event<T>) {
        let mut orphaned = Vec::new();

        for observer in observers {
            if observer.is_orphaned() {
                orphaned.push(observer.id);
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.deliver(event)));
            if outcome.is_err() {
                warn!(observer = %observer.id, "Observer panicked during delivery");
            }
        }

        if !orphaned.is_empty() {
            debug!(count = orphaned.len(), "Dropping observers of destroyed owners");
            self.observers
                .write()
                .retain(|observer| !orphaned.contains(&observer.id));
        }
    }
}
