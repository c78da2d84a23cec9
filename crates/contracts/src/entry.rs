//! LogEntry and reserved routing labels
//!
//! The reserved label names and the tenant list syntax are part of the
//! external contract and must not change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label carrying a `;` separated list of tenants to fan out to
pub const MULTI_TENANT_LABEL: &str = "__gardener_multitenant_id__";

/// Label carrying the single tenant understood by the backend
pub const TENANT_ID_LABEL: &str = "__tenant_id__";

/// Separator between tenants inside [`MULTI_TENANT_LABEL`]
pub const TENANT_SEPARATOR: char = ';';

/// Label name -> label value
pub type LabelSet = BTreeMap<String, String>;

/// Raw record handed over by the host log pipeline
pub type Record = serde_json::Map<String, serde_json::Value>;

/// A single log line with its labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Labels, routing labels included
    pub labels: LabelSet,
    /// Event time
    pub timestamp: DateTime<Utc>,
    /// Formatted log line
    pub line: String,
}

impl LogEntry {
    /// Create a new entry
    pub fn new(labels: LabelSet, timestamp: DateTime<Utc>, line: impl Into<String>) -> Self {
        Self {
            labels,
            timestamp,
            line: line.into(),
        }
    }
}

/// Split a multi-tenant label value into tenant ids.
///
/// Segments are trimmed and empty ones dropped; order is kept and
/// duplicates are not removed.
pub fn parse_tenants(value: &str) -> Vec<&str> {
    value
        .split(TENANT_SEPARATOR)
        .map(str::trim)
        .filter(|tenant| !tenant.is_empty())
        .collect()
}
