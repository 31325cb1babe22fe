//! Single-consumption change notifications.
//!
//! A [`LiveEvent`] holds the latest value for one key and fans each new
//! value out to its observers. Every observer runs a two-state machine:
//!
//! - attaching arms it (`Armed`)
//! - a delivery to an armed observer hands over the value once and returns
//!   it to `Idle`
//! - every `set_value` re-arms all attached observers before fan-out
//!
//! Attaching never replays the current value, so an observer only ever sees
//! values set after it was attached. Each delivered [`Event`] can also be
//! consumed once across all observers via [`Event::consume`].
//!
//! # Example
//!
//! ```rust
//! use varddb::notify::LiveEvent;
//!
//! let live = LiveEvent::<i32>::new();
//! let id = live.attach(|event: &varddb::notify::Event<i32>| {
//!     if let Some(value) = event.consume() {
//!         println!("got {value}");
//!     }
//! });
//! live.set_value(Some(42));
//! live.detach(id);
//! ```

mod event;
mod live;
mod observer;

#[cfg(test)]
mod tests;

pub use event::Event;
pub use live::LiveEvent;
pub use observer::{Lifecycle, Observer, ObserverId, ObserverState};
