//! Forwarder metrics
//!
//! Thin wrappers around the `metrics` macros so every crate uses the same
//! names and labels. Without an installed recorder they do nothing.

use metrics::{counter, gauge};

/// Host label used for records routed to the default client
pub const DEFAULT_HOST: &str = "default";

/// Error kinds reported through `logfwd_errors_total`
pub mod error_kind {
    pub const SEND_RECORD: &str = "SendRecord";
    pub const CREATE_LINE: &str = "CreateLine";
    pub const HOSTNAME: &str = "Hostname";
    pub const AUTO_KUBERNETES_LABELS: &str = "AutoKubernetesLabels";
    pub const METADATA_EXTRACTION: &str = "MetadataExtraction";
    pub const CLUSTER_EVENT: &str = "ClusterEvent";
    pub const CLIENT_CREATION: &str = "ClientCreation";
}

/// Record accepted by the router, before client resolution
pub fn record_incoming_log(host: &str) {
    counter!("logfwd_incoming_logs_total", "host" => host.to_string()).increment(1);
}

/// Record for which a client was resolved
pub fn record_incoming_log_with_endpoint(host: &str) {
    counter!(
        "logfwd_incoming_logs_with_endpoint_total",
        "host" => host.to_string()
    )
    .increment(1);
}

/// Record dropped because no client serves its host
pub fn record_dropped_log(host: &str) {
    counter!("logfwd_dropped_logs_total", "host" => host.to_string()).increment(1);
}

/// Error of the given kind (see [`error_kind`])
pub fn record_error(kind: &str) {
    counter!("logfwd_errors_total", "type" => kind.to_string()).increment(1);
}

/// Record without kubernetes metadata
///
/// `kind` is `"kubernetes"` when the metadata is missing and could not be
/// recovered from the tag.
pub fn record_log_without_metadata(kind: &str) {
    counter!(
        "logfwd_logs_without_metadata_total",
        "type" => kind.to_string()
    )
    .increment(1);
}

/// Number of live per-cluster clients
pub fn set_dynamic_clients(count: usize) {
    gauge!("logfwd_dynamic_clients").set(count as f64);
}

/// Cluster lifecycle event applied to the registry
pub fn record_cluster_event(kind: &str) {
    counter!("logfwd_cluster_events_total", "kind" => kind.to_string()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_incoming_log(DEFAULT_HOST);
        record_incoming_log_with_endpoint("shoot--dev--app");
        record_dropped_log("shoot--dev--gone");
        record_error(error_kind::SEND_RECORD);
        record_log_without_metadata("kubernetes");
        set_dynamic_clients(3);
        record_cluster_event("added");
    }
}
