// EventEmitter - single-threaded observer registry for beat events
//
// Observers are stored by handle in insertion order. Dispatch works on a
// snapshot taken at the start of a tick, so a callback that subscribes or
// unsubscribes while events are being delivered only affects later ticks.
// Everything lives on the host thread; there is no locking.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::events::BeatEvent;

type Callback = Rc<RefCell<dyn FnMut(&BeatEvent)>>;

/// Token returned by [`EventEmitter::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberHandle(u64);

impl SubscriberHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: BTreeMap<SubscriberHandle, Callback>,
}

/// Registry of beat observers
///
/// Cloning yields another handle onto the same registry, so callbacks may
/// hold a clone to manage subscriptions from inside a delivery.
#[derive(Clone, Default)]
pub struct EventEmitter {
    registry: Rc<RefCell<Registry>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it receives every event of every later tick
    pub fn subscribe<F>(&self, callback: F) -> SubscriberHandle
    where
        F: FnMut(&BeatEvent) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let handle = SubscriberHandle(registry.next_id);
        registry.next_id += 1;
        registry
            .subscribers
            .insert(handle, Rc::new(RefCell::new(callback)));
        handle
    }

    /// Remove a callback; returns false if the handle was not registered
    pub fn unsubscribe(&self, handle: SubscriberHandle) -> bool {
        self.registry
            .borrow_mut()
            .subscribers
            .remove(&handle)
            .is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().subscribers.len()
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Freeze the current subscriber list for one tick
    pub fn snapshot(&self) -> DispatchSnapshot {
        let callbacks = self
            .registry
            .borrow()
            .subscribers
            .iter()
            .map(|(handle, callback)| (*handle, Rc::clone(callback)))
            .collect();
        DispatchSnapshot { callbacks }
    }

    /// Deliver `events` in order to the current subscribers
    pub fn emit(&self, events: &[BeatEvent]) {
        let snapshot = self.snapshot();
        for event in events {
            snapshot.deliver(event);
        }
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Subscribers captured at the start of a tick
pub struct DispatchSnapshot {
    callbacks: Vec<(SubscriberHandle, Callback)>,
}

impl DispatchSnapshot {
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Invoke every captured callback with `event`; returns how many ran
    ///
    /// A callback that is already running (re-entrant delivery) is skipped.
    pub fn deliver(&self, event: &BeatEvent) -> usize {
        let mut delivered = 0;
        for (handle, callback) in &self.callbacks {
            match callback.try_borrow_mut() {
                Ok(mut callback) => {
                    (*callback)(event);
                    delivered += 1;
                }
                Err(_) => {
                    log::warn!(
                        "[BeatDetection] Skipping re-entrant delivery to subscriber {}",
                        handle.id()
                    );
                }
            }
        }
        delivered
    }
}
