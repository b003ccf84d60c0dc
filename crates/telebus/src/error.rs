use crate::event::EventType;
use thiserror::Error;

pub type BusResult<T> = Result<T, BusError>;

#[derive(Debug, Error)]
pub enum BusError {
    /// First listener failure under `FailurePolicy::Propagate`.
    #[error("listener for `{event_type}` failed")]
    Listener {
        event_type: EventType,
        #[source]
        source: anyhow::Error,
    },
    /// Every listener failure under `FailurePolicy::Isolate`, in delivery order.
    #[error("{} listener(s) for `{event_type}` failed", .failures.len())]
    Aggregate {
        event_type: EventType,
        failures: Vec<anyhow::Error>,
    },
    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl BusError {
    pub fn event_type(&self) -> Option<&EventType> {
        match self {
            BusError::Listener { event_type, .. } | BusError::Aggregate { event_type, .. } => {
                Some(event_type)
            }
            BusError::Payload(_) => None,
        }
    }

    /// Listener errors carried by this error, whichever policy produced it.
    pub fn failures(&self) -> Vec<&anyhow::Error> {
        match self {
            BusError::Listener { source, .. } => vec![source],
            BusError::Aggregate { failures, .. } => failures.iter().collect(),
            BusError::Payload(_) => Vec::new(),
        }
    }
}
