//! Synchronous named-event observer channel.
//!
//! Listeners are invoked in registration order on the caller's stack before
//! [`EventChannel::trigger`] returns. The listener list is snapshotted before
//! dispatch, so registrations made or removed by a listener take effect from
//! the next trigger.

mod channel;

pub use channel::{Event, EventChannel, Listener, ListenerId, ALL_EVENTS};
