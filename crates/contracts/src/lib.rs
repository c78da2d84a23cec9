//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the forwarder.
//! Business crates depend on this crate only, never the other way around.
//!
//! ## Label model
//! - A [`LabelSet`] is an ordered map of label name to label value
//! - Names prefixed with `__` carry routing metadata, see [`MULTI_TENANT_LABEL`]
//!   and [`TENANT_ID_LABEL`]

mod client;
mod cluster;
mod config;
mod entry;
mod error;

pub use client::*;
pub use cluster::*;
pub use config::*;
pub use entry::*;
pub use error::*;
