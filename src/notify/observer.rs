//! Observers, their armed state and lifecycle owners.

use super::event::Event;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Receives values pushed into a [`LiveEvent`](super::LiveEvent).
pub trait Observer<T>: Send + Sync {
    fn on_changed(&self, event: &Event<T>);
}

impl<T, F> Observer<T> for F
where
    F: Fn(&Event<T>) + Send + Sync,
{
    fn on_changed(&self, event: &Event<T>) {
        self(event);
    }
}

/// Identifies an attached observer for [`detach`](super::LiveEvent::detach).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Delivery state of one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    /// Delivered (or never armed); waits for the next `set_value`.
    Idle,
    /// Will receive the next delivered value.
    Armed,
}

const ACTIVE: u8 = 0;
const INACTIVE: u8 = 1;
const DESTROYED: u8 = 2;

/// Lifecycle of an observer owner.
///
/// Observers attached with an owner are skipped while the owner is
/// inactive (they stay armed) and detached once it is destroyed. Clones
/// share state.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: Arc<AtomicU8>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Creates an active owner.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(ACTIVE)),
        }
    }

    /// Stops deliveries until [`resume`](Self::resume).
    pub fn pause(&self) {
        let _ = self
            .state
            .compare_exchange(ACTIVE, INACTIVE, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Re-enables deliveries. Has no effect once destroyed.
    pub fn resume(&self) {
        let _ = self
            .state
            .compare_exchange(INACTIVE, ACTIVE, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Ends the lifecycle; owned observers are dropped on the next delivery.
    pub fn destroy(&self) {
        self.state.store(DESTROYED, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::Acquire) == ACTIVE
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.load(Ordering::Acquire) == DESTROYED
    }
}

/// Observer wrapper enforcing at-most-once delivery per arming.
pub(crate) struct PendingObserver<T> {
    pub(crate) id: ObserverId,
    owner: Option<Lifecycle>,
    state: Mutex<ObserverState>,
    inner: Box<dyn Observer<T>>,
}

impl<T> PendingObserver<T> {
    /// Wraps `inner`; new observers start armed.
    pub(crate) fn new(id: ObserverId, owner: Option<Lifecycle>, inner: Box<dyn Observer<T>>) -> Self {
        Self {
            id,
            owner,
            state: Mutex::new(ObserverState::Armed),
            inner,
        }
    }

    pub(crate) fn arm(&self) {
        *self.state.lock() = ObserverState::Armed;
    }

    pub(crate) fn state(&self) -> ObserverState {
        *self.state.lock()
    }

    pub(crate) fn is_orphaned(&self) -> bool {
        self.owner.as_ref().is_some_and(Lifecycle::is_destroyed)
    }

    /// Hands `event` to the wrapped observer if armed, active and not
    /// already consumed. Returns true if the observer was called.
    pub(crate) fn deliver(&self, event: &Event<T>) -> bool {
        if self.owner.as_ref().is_some_and(|owner| !owner.is_active()) {
            return false;
        }
        {
            let mut state = self.state.lock();
            if *state != ObserverState::Armed || event.is_handled() {
                return false;
            }
            *state = ObserverState::Idle;
        }
        // Lock released so the observer may re-enter the container
        self.inner.on_changed(event);
        true
    }
}
