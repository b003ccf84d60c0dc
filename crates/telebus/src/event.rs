use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use telebus_core::clock::now_millis;

/// Name of a category of events, e.g. `"build:start"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(String);

impl EventType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&EventType> for EventType {
    fn from(name: &EventType) -> Self {
        name.clone()
    }
}

impl Borrow<str> for EventType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A single emitted event. Built fresh by every `emit`; the bus keeps no copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<P> {
    #[serde(rename = "type")]
    pub event_type: EventType,
    /// Milliseconds since the Unix epoch, taken when `emit` was called.
    #[serde(rename = "ts")]
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
}

impl<P> Event<P> {
    pub fn new(event_type: EventType, payload: Option<P>) -> Self {
        Self {
            event_type,
            timestamp: now_millis(),
            payload,
        }
    }

    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }
}
