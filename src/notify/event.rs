//! Consumable event payload.

use std::sync::atomic::{AtomicBool, Ordering};

/// A delivered value that can be consumed at most once.
///
/// `None` content signals that the key was removed or cleared.
#[derive(Debug)]
pub struct Event<T> {
    content: Option<T>,
    handled: AtomicBool,
}

impl<T> Event<T> {
    /// Wraps `content` in an unhandled event.
    pub fn new(content: Option<T>) -> Self {
        Self {
            content,
            handled: AtomicBool::new(false),
        }
    }

    /// Reads the payload without consuming it.
    pub fn peek(&self) -> Option<&T> {
        self.content.as_ref()
    }

    /// Returns true once any consumer has taken the payload.
    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::Acquire)
    }

    /// Returns true if this event signals removal.
    pub fn is_cleared(&self) -> bool {
        self.content.is_none()
    }
}

impl<T: Clone> Event<T> {
    /// Takes the payload. Only the first caller gets `Some`.
    pub fn consume(&self) -> Option<T> {
        if self.handled.swap(true, Ordering::AcqRel) {
            None
        } else {
            self.content.clone()
        }
    }
}
