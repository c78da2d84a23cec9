//! Layered error definitions
//!
//! Categorized by source: config / client / routing / cluster

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Client Errors =====
    /// Client construction error
    #[error("failed to create client for '{endpoint}': {message}")]
    ClientCreation { endpoint: String, message: String },

    /// Client no longer accepts entries
    #[error("client '{endpoint}' is stopped")]
    ClientStopped { endpoint: String },

    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create client construction error
    pub fn client_creation(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClientCreation {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create client stopped error
    pub fn client_stopped(endpoint: impl Into<String>) -> Self {
        Self::ClientStopped {
            endpoint: endpoint.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
