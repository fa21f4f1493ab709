//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Queue full - event dropped
    #[error("queue full for sink '{sink_name}', {event_kind} event dropped")]
    QueueFull {
        sink_name: String,
        event_kind: &'static str,
    },

    /// Subscriber rejected an event
    #[error("subscriber '{subscriber}' failed: {message}")]
    Subscriber { subscriber: String, message: String },

    /// Sink write error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a subscriber error
    pub fn subscriber(subscriber: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscriber {
            subscriber: subscriber.into(),
            message: message.into(),
        }
    }
}
