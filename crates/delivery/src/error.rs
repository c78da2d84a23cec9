//! Delivery error types

use thiserror::Error;

/// Delivery-specific errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Client built outside a tokio runtime
    #[error("client '{name}' needs a running tokio runtime")]
    NoRuntime { name: String },

    /// Error from contract
    #[error("client error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeliveryError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
