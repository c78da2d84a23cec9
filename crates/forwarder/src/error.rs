//! Forwarder error types

use contracts::ContractError;
use controller::ControllerError;
use delivery::DeliveryError;
use thiserror::Error;

/// Forwarder error
#[derive(Debug, Error)]
pub enum ForwarderError {
    /// No live client serves the record's dynamic host
    #[error("no client found for host '{host}'")]
    NoClient {
        /// Dynamic host name
        host: String,
    },

    /// Record has no usable kubernetes object
    #[error("kubernetes metadata missing: {message}")]
    MissingMetadata {
        /// Error message
        message: String,
    },

    /// Tag does not carry kubernetes metadata
    #[error("cannot extract kubernetes metadata from tag: {message}")]
    TagMetadata {
        /// Error message
        message: String,
    },

    /// Record could not be formatted
    #[error("error creating line: {message}")]
    CreateLine {
        /// Error message
        message: String,
    },

    /// Configured pattern does not compile
    #[error("invalid pattern for '{field}': {source}")]
    InvalidPattern {
        /// Config field
        field: String,
        #[source]
        source: regex::Error,
    },

    /// Delivery failure
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Client construction failure
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Registry failure
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

impl ForwarderError {
    pub fn missing_metadata(message: impl Into<String>) -> Self {
        Self::MissingMetadata {
            message: message.into(),
        }
    }

    pub fn tag_metadata(message: impl Into<String>) -> Self {
        Self::TagMetadata {
            message: message.into(),
        }
    }

    pub fn create_line(message: impl Into<String>) -> Self {
        Self::CreateLine {
            message: message.into(),
        }
    }

    pub fn invalid_pattern(field: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidPattern {
            field: field.into(),
            source,
        }
    }
}

/// Forwarder Result type alias
pub type Result<T> = std::result::Result<T, ForwarderError>;
