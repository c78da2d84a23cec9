//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// A line of an input file is not valid JSON of the expected shape
    #[error("{}:{line}: {message}", path.display())]
    InvalidLine {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Cluster events given but dynamic routing is not configured
    #[error("cluster events given but plugin.dynamic_host_path is not configured")]
    NoRegistry,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Forwarder error
    #[error(transparent)]
    Forwarder(#[from] forwarder::ForwarderError),
}

impl CliError {
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_line(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::InvalidLine {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
