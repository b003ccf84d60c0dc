pub mod bus;
pub mod error;
pub mod event;
pub mod global;
pub mod handle;
pub mod listener;
pub mod topic;

pub use bus::TelemetryBus;
pub use error::{BusError, BusResult};
pub use event::{Event, EventType};
pub use global::{install_default, reset_default, scoped_default, telemetry, DefaultBusGuard};
pub use handle::Unsubscribe;
pub use listener::Listener;
pub use topic::Topic;

pub use telebus_core::{BusConfig, FailurePolicy, LoggingConfig, TelemetryConfig};
