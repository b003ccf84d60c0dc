use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    init_logging_with(&LoggingConfig::default());
}

/// Installs the fmt subscriber. `RUST_LOG` wins over the configured filter.
/// Later calls are ignored once a global subscriber is set.
pub fn init_logging_with(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.default_filter));
    let _ = fmt().with_env_filter(filter).try_init();
}
