//! Controller error types

use contracts::ContractError;
use thiserror::Error;

/// Controller specific error
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Factory refused to build a client for a cluster
    #[error("failed to create client for cluster '{cluster}': {source}")]
    ClientCreation {
        cluster: String,
        #[source]
        source: ContractError,
    },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ControllerError {
    /// Create client creation error
    pub fn client_creation(cluster: impl Into<String>, source: ContractError) -> Self {
        Self::ClientCreation {
            cluster: cluster.into(),
            source,
        }
    }
}

/// Controller Result type alias
pub type Result<T> = std::result::Result<T, ControllerError>;
