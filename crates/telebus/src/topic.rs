//! Typed event types on top of the JSON bus.
//!
//! A [`Topic`] binds an event-type name to the payload shape its emitters
//! and listeners agree on, so both sides get static checking while the bus
//! itself still carries [`serde_json::Value`].

use crate::bus::TelemetryBus;
use crate::error::BusResult;
use crate::event::Event;
use crate::handle::Unsubscribe;
use crate::listener::Listener;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub trait Topic {
    const NAME: &'static str;
    type Payload: Serialize + DeserializeOwned + 'static;
}

impl TelemetryBus<Value> {
    /// Subscribes a typed callback. Each call wraps `f` in a new [`Listener`],
    /// so registering the same closure twice stores it twice; use
    /// [`on_topic_listener`](Self::on_topic_listener) for set semantics.
    pub fn on_topic<T, F>(&self, f: F) -> Unsubscribe
    where
        T: Topic + 'static,
        F: Fn(&Event<T::Payload>) + Send + Sync + 'static,
    {
        self.on_topic_listener::<T>(&Listener::new(f))
    }

    /// Subscribes a typed listener. Registering the same `Listener` (or a
    /// clone) twice for one topic stores it once, as with [`on`](Self::on).
    /// A payload that does not decode into `T::Payload` counts as a failure
    /// of this listener.
    pub fn on_topic_listener<T>(&self, listener: &Listener<T::Payload>) -> Unsubscribe
    where
        T: Topic + 'static,
    {
        let adapted = Listener::wrapping(listener, |typed, event: &Event<Value>| {
            typed.call(&decode::<T>(event)?)
        });
        self.on(T::NAME, &adapted)
    }

    pub fn emit_topic<T: Topic>(&self, payload: &T::Payload) -> BusResult<usize> {
        let value = serde_json::to_value(payload)?;
        self.emit(T::NAME, Some(value))
    }

    pub fn emit_topic_empty<T: Topic>(&self) -> BusResult<usize> {
        self.emit(T::NAME, None)
    }
}

fn decode<T: Topic>(event: &Event<Value>) -> Result<Event<T::Payload>, serde_json::Error> {
    let payload = event
        .payload
        .as_ref()
        .map(|value| <T::Payload as Deserialize>::deserialize(value))
        .transpose()?;
    Ok(Event {
        event_type: event.event_type.clone(),
        timestamp: event.timestamp,
        payload,
    })
}
