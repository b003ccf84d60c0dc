pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use config::{BusConfig, FailurePolicy, LoggingConfig, TelemetryConfig};
pub use error::{CoreError, CoreResult};
