//! Tests for the notification layer.

use super::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;

/// Observer that records every payload it consumes.
fn recorder() -> (Arc<Mutex<Vec<Option<i32>>>>, impl Fn(&Event<i32>) + Send + Sync) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let observer = move |event: &Event<i32>| sink.lock().push(event.peek().copied());
    (seen, observer)
}

#[test]
fn test_attached_observer_receives_value_once() {
    let live = LiveEvent::<i32>::new();
    let (seen, observer) = recorder();
    let id = live.attach(observer);

    live.set_value(Some(1));
    assert_eq!(*seen.lock(), vec![Some(1)]);
    assert_eq!(live.observer_state(id), Some(ObserverState::Idle));
}

#[test]
fn test_late_observer_gets_next_value_only() {
    let live = LiveEvent::<i32>::new();
    let (seen_a, a) = recorder();
    live.attach(a);

    live.set_value(Some(1));

    let (seen_b, b) = recorder();
    let b_id = live.attach(b);
    assert_eq!(live.observer_state(b_id), Some(ObserverState::Armed));
    assert!(seen_b.lock().is_empty());

    live.set_value(Some(2));
    assert_eq!(*seen_a.lock(), vec![Some(1), Some(2)]);
    assert_eq!(*seen_b.lock(), vec![Some(2)]);
}

#[test]
fn test_attach_does_not_replay_current_value() {
    let live = LiveEvent::<i32>::new();
    live.set_value(Some(7));

    let (seen, observer) = recorder();
    live.attach(observer);

    assert!(seen.lock().is_empty());
    assert_eq!(live.current_value(), Some(7));
}

#[test]
fn test_consume_is_single_use_across_observers() {
    let live = LiveEvent::<i32>::new();
    let consumed = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..3 {
        let sink = Arc::clone(&consumed);
        live.attach(move |event: &Event<i32>| {
            if let Some(value) = event.consume() {
                sink.lock().push(value);
            }
        });
    }

    live.set_value(Some(5));
    assert_eq!(*consumed.lock(), vec![5]);

    let event = live.current_event().unwrap();
    assert!(event.is_handled());
    assert_eq!(event.consume(), None);
    // Peeking still works after consumption
    assert_eq!(event.peek(), Some(&5));
}

#[test]
fn test_delivery_order_follows_attachment() {
    let live = LiveEvent::<i32>::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for tag in ["first", "second", "third"] {
        let sink = Arc::clone(&order);
        live.attach(move |_: &Event<i32>| sink.lock().push(tag));
    }

    live.set_value(Some(0));
    assert_eq!(*order.lock(), vec!["first", "second", "third"]);
}

#[test]
fn test_detach_stops_delivery() {
    let live = LiveEvent::<i32>::new();
    let (seen, observer) = recorder();
    let id = live.attach(observer);

    assert!(live.detach(id));
    assert!(!live.detach(id));
    live.set_value(Some(3));

    assert!(seen.lock().is_empty());
    assert_eq!(live.observer_count(), 0);
}

#[test]
fn test_cleared_value_is_delivered_as_none() {
    let live = LiveEvent::<i32>::new();
    let (seen, observer) = recorder();
    live.attach(observer);

    live.set_value(Some(1));
    live.set_value(None);

    assert_eq!(*seen.lock(), vec![Some(1), None]);
    assert!(!live.has_value());
    assert!(live.current_event().unwrap().is_cleared());
}

#[test]
fn test_panicking_observer_does_not_block_others() {
    let live = LiveEvent::<i32>::new();
    live.attach(|event: &Event<i32>| {
        if event.peek().is_some() {
            panic!("observer failure");
        }
    });
    let (seen, observer) = recorder();
    live.attach(observer);

    live.set_value(Some(9));
    assert_eq!(*seen.lock(), vec![Some(9)]);
}

#[test]
fn test_observer_may_detach_itself_during_delivery() {
    let live = Arc::new(LiveEvent::<i32>::new());
    let id_slot = Arc::new(Mutex::new(None));
    let calls = Arc::new(Mutex::new(0));

    let container = Arc::clone(&live);
    let slot = Arc::clone(&id_slot);
    let counter = Arc::clone(&calls);
    let id = live.attach(move |_: &Event<i32>| {
        *counter.lock() += 1;
        if let Some(id) = *slot.lock() {
            container.detach(id);
        }
    });
    *id_slot.lock() = Some(id);

    live.set_value(Some(1));
    live.set_value(Some(2));
    assert_eq!(*calls.lock(), 1);
    assert_eq!(live.observer_count(), 0);
}

#[test]
fn test_lifecycle_owner_controls_delivery() {
    let live = LiveEvent::<i32>::new();
    let owner = Lifecycle::new();
    let (seen, observer) = recorder();
    live.attach_with_owner(&owner, observer);

    owner.pause();
    live.set_value(Some(1));
    assert!(seen.lock().is_empty());

    owner.resume();
    live.set_value(Some(2));
    assert_eq!(*seen.lock(), vec![Some(2)]);

    owner.destroy();
    owner.resume();
    live.set_value(Some(3));
    assert_eq!(*seen.lock(), vec![Some(2)]);
    assert_eq!(live.observer_count(), 0);
}

#[test]
fn test_set_if_unset_keeps_existing_value() {
    let live = LiveEvent::<i32>::new();
    assert!(live.set_if_unset(Some(1)));
    assert!(!live.set_if_unset(Some(2)));
    assert_eq!(live.current_value(), Some(1));

    live.set_value(None);
    assert!(live.set_if_unset(Some(3)));
    assert_eq!(live.current_value(), Some(3));
}

#[test]
fn test_concurrent_attach_during_delivery() {
    let live = Arc::new(LiveEvent::<i32>::new());
    let delivered = Arc::new(Mutex::new(0usize));

    let writer = {
        let live = Arc::clone(&live);
        thread::spawn(move || {
            for i in 0..200 {
                live.set_value(Some(i));
            }
        })
    };

    let attachers: Vec<_> = (0..4)
        .map(|_| {
            let live = Arc::clone(&live);
            let delivered = Arc::clone(&delivered);
            thread::spawn(move || {
                for _ in 0..50 {
                    let sink = Arc::clone(&delivered);
                    let id = live.attach(move |_: &Event<i32>| *sink.lock() += 1);
                    live.detach(id);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for handle in attachers {
        handle.join().unwrap();
    }

    assert_eq!(live.observer_count(), 0);
    assert_eq!(live.current_value(), Some(199));
}
