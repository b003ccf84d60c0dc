//! Process-wide default bus.
//!
//! Subsystems that do not want to pass a [`TelemetryBus`] around share the
//! one returned by [`telemetry`]. It is created on first use and can be
//! swapped out with [`install_default`] or, for the length of a test, with
//! [`scoped_default`].
//!
//! A handle returned by [`telemetry`] keeps pointing at the bus that was the
//! default when it was taken; swapping the default does not move it.

use crate::bus::TelemetryBus;
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
use telebus_core::logging::init_logging_with;
use telebus_core::TelemetryConfig;

static DEFAULT_BUS: OnceLock<RwLock<TelemetryBus>> = OnceLock::new();

fn slot() -> &'static RwLock<TelemetryBus> {
    DEFAULT_BUS.get_or_init(|| {
        tracing::debug!("default telemetry bus initialised");
        RwLock::new(TelemetryBus::new())
    })
}

fn read_slot() -> RwLockReadGuard<'static, TelemetryBus> {
    slot().read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_slot() -> RwLockWriteGuard<'static, TelemetryBus> {
    slot().write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Shared handle to the current default bus.
pub fn telemetry() -> TelemetryBus {
    read_slot().clone()
}

/// Replaces the default bus and returns the one it displaced.
pub fn install_default(bus: TelemetryBus) -> TelemetryBus {
    let previous = std::mem::replace(&mut *write_slot(), bus);
    tracing::debug!("default telemetry bus replaced");
    previous
}

/// Installs `bus` as the default until the returned guard is dropped.
pub fn scoped_default(bus: TelemetryBus) -> DefaultBusGuard {
    DefaultBusGuard {
        previous: Some(install_default(bus)),
    }
}

/// Removes every listener from the current default bus.
pub fn reset_default() {
    telemetry().clear();
}

/// Sets up logging from `cfg` and installs a default bus built from `cfg.bus`.
pub fn init(cfg: &TelemetryConfig) -> TelemetryBus {
    init_logging_with(&cfg.logging);
    let bus: TelemetryBus = TelemetryBus::with_config(cfg.bus.clone());
    install_default(bus.clone());
    tracing::info!(failure_policy = ?cfg.bus.failure_policy, "telemetry initialised");
    bus
}

/// Restores the previous default bus on drop.
#[must_use = "the previous default is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct DefaultBusGuard {
    previous: Option<TelemetryBus>,
}

impl Drop for DefaultBusGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            install_default(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Listener;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use telebus_core::FailurePolicy;

    // The default bus is process state; tests touching it take turns.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> std::sync::MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn handles_share_the_default() {
        let _serial = serial();
        let _scope = scoped_default(TelemetryBus::new());

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        telemetry().on(
            "build:start",
            &Listener::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        telemetry().emit_with("build:start", json!({ "id": 1 })).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scoped_default_restores_previous() {
        let _serial = serial();
        let outer: TelemetryBus = TelemetryBus::new();
        outer.on("outer", &Listener::new(|_| {}));
        let _outer_scope = scoped_default(outer);

        {
            let _inner_scope = scoped_default(TelemetryBus::new());
            assert!(telemetry().is_empty());
        }

        assert_eq!(telemetry().listener_count("outer"), 1);
    }

    #[test]
    fn reset_clears_the_default() {
        let _serial = serial();
        let _scope = scoped_default(TelemetryBus::new());
        telemetry().on("x", &Listener::new(|_| {}));

        reset_default();
        assert!(telemetry().is_empty());
    }

    #[test]
    fn init_installs_configured_bus() {
        let _serial = serial();
        let _scope = scoped_default(TelemetryBus::new());

        let mut cfg = TelemetryConfig::default();
        cfg.bus.failure_policy = FailurePolicy::Isolate;
        let bus = init(&cfg);

        assert_eq!(bus.config().failure_policy, FailurePolicy::Isolate);
        assert_eq!(telemetry().config().failure_policy, FailurePolicy::Isolate);
    }
}
