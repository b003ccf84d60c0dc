use crate::bus::{lock_state, BusState};
use crate::event::EventType;
use std::fmt;
use std::sync::{Mutex, Weak};

type Detach = dyn Fn() -> bool + Send + Sync;

/// Reverses exactly one subscription.
///
/// Dropping the handle leaves the listener registered. Calling
/// [`unsubscribe`](Unsubscribe::unsubscribe) again, after a `clear`, or after
/// the bus is gone does nothing.
pub struct Unsubscribe {
    event_type: EventType,
    detach: Box<Detach>,
}

impl Unsubscribe {
    pub(crate) fn new<P: 'static>(
        state: Weak<Mutex<BusState<P>>>,
        event_type: EventType,
        id: u64,
    ) -> Self {
        let key = event_type.clone();
        let detach = move || match state.upgrade() {
            Some(state) => lock_state(&state).remove(&key, id),
            None => false,
        };
        Self {
            event_type,
            detach: Box::new(detach),
        }
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn unsubscribe(&self) {
        if (self.detach)() {
            tracing::debug!(event_type = %self.event_type, "listener unsubscribed");
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("event_type", &self.event_type)
            .finish()
    }
}
