//! Event channel implementation

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

/// Listeners registered under this name receive every event.
pub const ALL_EVENTS: &str = "all";

/// A dispatched event.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Name the event was triggered with
    pub name: &'a str,
    /// Payload passed to `trigger`
    pub payload: &'a Value,
}

/// Callback invoked on dispatch.
pub type Listener = Rc<dyn Fn(&Event<'_>)>;

/// Handle returned by registration, used to remove a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    callback: Listener,
    once: bool,
}

/// Per-owner map from event name to its ordered listeners.
#[derive(Default)]
pub struct EventChannel {
    registrations: RefCell<BTreeMap<String, Vec<Registration>>>,
    next_id: Cell<u64>,
}

impl EventChannel {
    /// Create an empty channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `event`
    pub fn on<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&Event<'_>) + 'static,
    {
        self.register(event, Rc::new(callback), false)
    }

    /// Register a listener that is removed after its first dispatch
    pub fn once<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&Event<'_>) + 'static,
    {
        self.register(event, Rc::new(callback), true)
    }

    fn register(&self, event: &str, callback: Listener, once: bool) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        self.registrations
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(Registration { id, callback, once });

        id
    }

    /// Remove one listener. Returns false if it was not registered under `event`.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut registrations = self.registrations.borrow_mut();
        let Some(listeners) = registrations.get_mut(event) else {
            return false;
        };

        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        let removed = listeners.len() != before;

        if listeners.is_empty() {
            registrations.remove(event);
        }
        removed
    }

    /// Remove every listener for `event`, returning how many were removed
    pub fn off_all(&self, event: &str) -> usize {
        self.registrations
            .borrow_mut()
            .remove(event)
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }

    /// Remove every listener on the channel
    pub fn clear(&self) {
        self.registrations.borrow_mut().clear();
    }

    /// Number of listeners registered for exactly `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.registrations
            .borrow()
            .get(event)
            .map(|listeners| listeners.len())
            .unwrap_or(0)
    }

    /// Dispatch `event` to its listeners, then to the catch-all listeners.
    ///
    /// Returns the number of callbacks invoked.
    pub fn trigger(&self, event: &str, payload: &Value) -> usize {
        let mut snapshot = self.take_snapshot(event);
        if event != ALL_EVENTS {
            snapshot.extend(self.take_snapshot(ALL_EVENTS));
        }

        debug!(event, listeners = snapshot.len(), "dispatching event");

        let dispatched = Event {
            name: event,
            payload,
        };
        for registration in &snapshot {
            (registration.callback)(&dispatched);
        }
        snapshot.len()
    }

    /// Copy the listeners for `event`, dropping one-shot registrations from the
    /// live list before anything runs.
    fn take_snapshot(&self, event: &str) -> Vec<Registration> {
        let mut registrations = self.registrations.borrow_mut();
        let Some(listeners) = registrations.get_mut(event) else {
            return Vec::new();
        };

        let snapshot = listeners.clone();
        listeners.retain(|r| !r.once);
        if listeners.is_empty() {
            registrations.remove(event);
        }
        snapshot
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<String, usize> = self
            .registrations
            .borrow()
            .iter()
            .map(|(name, listeners)| (name.clone(), listeners.len()))
            .collect();
        f.debug_struct("EventChannel")
            .field("listeners", &counts)
            .finish()
    }
}
