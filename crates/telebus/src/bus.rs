use crate::error::{BusError, BusResult};
use crate::event::{Event, EventType};
use crate::handle::Unsubscribe;
use crate::listener::Listener;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use telebus_core::error::format_error_chain;
use telebus_core::{BusConfig, FailurePolicy};

struct Registration<P> {
    id: u64,
    listener: Listener<P>,
}

pub(crate) struct BusState<P> {
    next_id: u64,
    // A key exists only while its registration list is non-empty.
    listeners: HashMap<EventType, Vec<Registration<P>>>,
}

impl<P> BusState<P> {
    fn new() -> Self {
        Self {
            next_id: 0,
            listeners: HashMap::new(),
        }
    }

    /// Returns the registration id, reusing the existing one when `listener` is already present.
    fn insert(&mut self, event_type: &EventType, listener: &Listener<P>) -> (u64, bool) {
        let registrations = self.listeners.entry(event_type.clone()).or_default();
        if let Some(existing) = registrations
            .iter()
            .find(|r| Listener::same(&r.listener, listener))
        {
            return (existing.id, false);
        }

        let id = self.next_id;
        self.next_id += 1;
        registrations.push(Registration {
            id,
            listener: listener.clone(),
        });
        (id, true)
    }

    pub(crate) fn remove(&mut self, event_type: &EventType, id: u64) -> bool {
        let Some(registrations) = self.listeners.get_mut(event_type) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            self.listeners.remove(event_type);
        }
        removed
    }

    fn snapshot(&self, event_type: &EventType) -> Vec<Listener<P>> {
        self.listeners
            .get(event_type)
            .map(|registrations| registrations.iter().map(|r| r.listener.clone()).collect())
            .unwrap_or_default()
    }
}

pub(crate) fn lock_state<P>(state: &Mutex<BusState<P>>) -> MutexGuard<'_, BusState<P>> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("telemetry bus mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// In-process publish/subscribe hub keyed by event type.
///
/// Clones share one listener mapping. Delivery is synchronous on the thread
/// calling [`emit`](TelemetryBus::emit); the internal lock is released before
/// any listener runs, so listeners may subscribe, unsubscribe or clear on the
/// same bus.
pub struct TelemetryBus<P = Value> {
    state: Arc<Mutex<BusState<P>>>,
    config: BusConfig,
}

impl<P: 'static> TelemetryBus<P> {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState::new())),
            config,
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Registers `listener` for `event_type`.
    ///
    /// Registering the same listener (or a clone of it) twice for one type
    /// has no further effect, and either returned handle removes it.
    pub fn on(&self, event_type: impl Into<EventType>, listener: &Listener<P>) -> Unsubscribe {
        let event_type = event_type.into();
        let (id, added) = lock_state(&self.state).insert(&event_type, listener);
        if added {
            tracing::debug!(event_type = %event_type, id, "listener subscribed");
        } else {
            tracing::debug!(event_type = %event_type, id, "listener already subscribed");
        }
        Unsubscribe::new(Arc::downgrade(&self.state), event_type, id)
    }

    /// Delivers an event to every listener registered for `event_type` when
    /// the call starts and returns how many were invoked.
    ///
    /// Under [`FailurePolicy::Propagate`] the first listener error stops
    /// delivery and is returned to the caller without being logged. Under
    /// [`FailurePolicy::Isolate`] all listeners run and errors come back as
    /// [`BusError::Aggregate`].
    pub fn emit(&self, event_type: impl Into<EventType>, payload: Option<P>) -> BusResult<usize> {
        let event = Event::new(event_type.into(), payload);
        let listeners = lock_state(&self.state).snapshot(&event.event_type);
        tracing::trace!(
            event_type = %event.event_type,
            listeners = listeners.len(),
            "emit"
        );

        match self.config.failure_policy {
            FailurePolicy::Propagate => {
                for listener in &listeners {
                    if let Err(source) = listener.call(&event) {
                        return Err(BusError::Listener {
                            event_type: event.event_type,
                            source,
                        });
                    }
                }
            }
            FailurePolicy::Isolate => {
                let failures: Vec<anyhow::Error> = listeners
                    .iter()
                    .filter_map(|listener| listener.call(&event).err())
                    .inspect(|source| log_failure(&event.event_type, source))
                    .collect();
                if !failures.is_empty() {
                    return Err(BusError::Aggregate {
                        event_type: event.event_type,
                        failures,
                    });
                }
            }
        }

        Ok(listeners.len())
    }

    pub fn emit_with(&self, event_type: impl Into<EventType>, payload: P) -> BusResult<usize> {
        self.emit(event_type, Some(payload))
    }

    pub fn emit_empty(&self, event_type: impl Into<EventType>) -> BusResult<usize> {
        self.emit(event_type, None)
    }

    /// Drops every listener of every type. Handles issued before the clear become no-ops.
    pub fn clear(&self) {
        let mut state = lock_state(&self.state);
        let types = state.listeners.len();
        state.listeners.clear();
        tracing::debug!(types, "telemetry bus cleared");
    }

    pub fn listener_count(&self, event_type: &str) -> usize {
        lock_state(&self.state)
            .listeners
            .get(event_type)
            .map_or(0, Vec::len)
    }

    pub fn event_types(&self) -> Vec<EventType> {
        let mut types: Vec<EventType> = lock_state(&self.state).listeners.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn is_empty(&self) -> bool {
        lock_state(&self.state).listeners.is_empty()
    }
}

fn log_failure(event_type: &EventType, source: &anyhow::Error) {
    tracing::debug!(
        event_type = %event_type,
        error = %format_error_chain(&**source),
        "listener failed"
    );
}

impl<P> Clone for TelemetryBus<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: self.config.clone(),
        }
    }
}

impl<P: 'static> Default for TelemetryBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for TelemetryBus<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock_state(&self.state);
        f.debug_struct("TelemetryBus")
            .field("config", &self.config)
            .field("event_types", &state.listeners.len())
            .finish()
    }
}
