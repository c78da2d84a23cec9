//! # Controller
//!
//! Keeps one delivery client per known cluster.
//!
//! Cluster lifecycle notifications (`added`, `updated`, `deleted`) are applied
//! to a [`ClusterRegistry`]; the router looks clients up by cluster name on
//! every record.
//!
//! ## Locking
//! - Lookups take the shared lock and never await
//! - Mutations hold the exclusive lock only to swap map entries
//! - Client construction and draining happen outside the lock

mod error;
mod events;
mod registry;
mod target;

pub use error::{ControllerError, Result};
pub use registry::ClusterRegistry;
pub use target::derive_client_config;
