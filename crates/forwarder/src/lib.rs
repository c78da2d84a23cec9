//! # Forwarder
//!
//! Entry router between the host log pipeline and the delivery clients.
//!
//! Responsibilities:
//! - Turn raw records into labels and a log line
//! - Recover kubernetes metadata from the record tag
//! - Route records of dynamic hosts to their cluster client
//! - Fall back to the default client for everything else
//!
//! ## Usage Example
//!
//! ```ignore
//! use forwarder::Forwarder;
//!
//! let forwarder = Forwarder::build(&config)?;
//! forwarder.send_record(record, Utc::now()).await?;
//! forwarder.close_wait().await;
//! ```

mod error;
mod forwarder;
mod labels;
mod line;
mod metadata;

pub use contracts::Record;
pub use error::{ForwarderError, Result};
pub use forwarder::Forwarder;
pub use labels::{
    auto_kubernetes_labels, dynamic_host_name, extract_labels, map_labels, remove_keys,
    KUBERNETES_KEY,
};
pub use line::create_line;
pub use metadata::extract_kubernetes_metadata_from_tag;
