//! ForwarderConfig - Config Loader output
//!
//! Describes the full forwarder configuration: default client, record to
//! label extraction, dynamic routing and per-cluster client derivation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use validator::Validate;

use crate::LabelSet;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete forwarder configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Default client settings, also the template for per-cluster clients
    #[serde(default)]
    pub client: ClientConfig,

    /// Record handling and routing
    #[serde(default)]
    pub plugin: PluginConfig,

    /// Per-cluster client derivation
    #[serde(default)]
    pub controller: ControllerConfig,
}

/// Delivery client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ClientConfig {
    /// Backend endpoint
    #[validate(length(min = 1, message = "url cannot be empty"))]
    #[serde(default = "default_url")]
    pub url: String,

    /// Where the buffered client writes entries
    #[serde(default)]
    pub sink: SinkKind,

    /// Directory for file sinks
    #[serde(default)]
    pub queue_dir: Option<PathBuf>,

    /// Queue name, unique per client
    #[validate(length(min = 1, message = "queue_name cannot be empty"))]
    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    /// In-memory queue capacity (entries)
    #[validate(range(min = 1, message = "queue_capacity must be > 0"))]
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Labels added to every entry (entry labels win on conflict)
    #[serde(default)]
    pub static_labels: LabelSet,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            sink: SinkKind::default(),
            queue_dir: None,
            queue_name: default_queue_name(),
            queue_capacity: default_queue_capacity(),
            static_labels: LabelSet::new(),
        }
    }
}

fn default_url() -> String {
    "http://localhost:3100/vali/api/v1/push".to_string()
}

fn default_queue_name() -> String {
    "forwarder".to_string()
}

fn default_queue_capacity() -> usize {
    1024
}

/// Sink type behind a buffered client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Emit entries through tracing
    #[default]
    Log,
    /// Append JSON lines to `<queue_dir>/<queue_name>.jsonl`
    File,
    /// Discard entries
    Null,
}

/// Maps record keys to label names, possibly through nested objects
///
/// ```toml
/// [plugin.label_map]
/// stream = "stream"
/// kubernetes = { namespace_name = "namespace", pod_name = "pod" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyMapping {
    /// Leaf: the label name (or, for the dynamic host path, any marker)
    Label(String),
    /// Descend into the nested object under this key
    Nested(BTreeMap<String, KeyMapping>),
}

/// Record handling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Record keys copied into labels verbatim
    #[serde(default = "default_label_keys")]
    pub label_keys: Vec<String>,

    /// Record keys deleted before the line is built
    #[serde(default)]
    pub remove_keys: Vec<String>,

    /// Turn the `kubernetes` object into labels
    #[serde(default)]
    pub auto_kubernetes_labels: bool,

    /// Line format
    #[serde(default)]
    pub line_format: LineFormat,

    /// Send the raw value when a record has a single key left
    #[serde(default)]
    pub drop_single_key: bool,

    /// Label name for the host name
    #[serde(default)]
    pub hostname_key: Option<String>,

    /// Fixed host name; the OS host name is used when absent
    #[serde(default)]
    pub hostname_value: Option<String>,

    /// Pattern a dynamic host name must match
    #[serde(default)]
    pub dynamic_host_regex: String,

    /// Nested record key to label mapping; replaces `label_keys` when set
    ///
    /// Mapped labels are added to the auto kubernetes labels. Without a map,
    /// the `label_keys` labels replace them.
    #[serde(default)]
    pub label_map: Option<BTreeMap<String, KeyMapping>>,

    /// Path to the record value naming the dynamic host
    #[serde(default)]
    pub dynamic_host_path: BTreeMap<String, KeyMapping>,

    /// Static tenant assignment for dynamic hosts
    #[serde(default)]
    pub dynamic_tenant: DynamicTenantConfig,

    /// Kubernetes metadata fallback
    #[serde(default)]
    pub kubernetes_metadata: KubernetesMetadataConfig,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            label_keys: default_label_keys(),
            remove_keys: Vec::new(),
            auto_kubernetes_labels: false,
            line_format: LineFormat::default(),
            drop_single_key: false,
            hostname_key: None,
            hostname_value: None,
            dynamic_host_regex: String::new(),
            label_map: None,
            dynamic_host_path: BTreeMap::new(),
            dynamic_tenant: DynamicTenantConfig::default(),
            kubernetes_metadata: KubernetesMetadataConfig::default(),
        }
    }
}

fn default_label_keys() -> Vec<String> {
    vec!["job".to_string()]
}

/// Line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineFormat {
    /// Record serialized as a JSON object
    #[default]
    Json,
    /// `key=value` pairs sorted by key
    KeyValue,
}

/// Static tenant assignment for records sent to dynamic hosts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DynamicTenantConfig {
    /// Tenant written to the tenant-id label
    #[serde(default)]
    pub tenant: String,

    /// Record field inspected
    #[serde(default)]
    pub field: String,

    /// Pattern the field value must match
    #[serde(default)]
    pub regex: String,

    /// Strip tenant routing labels on the default client
    #[serde(default)]
    pub remove_tenant_id_when_sending_to_default_url: bool,
}

impl DynamicTenantConfig {
    /// All of tenant, field and regex are set
    pub fn is_enabled(&self) -> bool {
        !self.tenant.is_empty() && !self.field.is_empty() && !self.regex.is_empty()
    }
}

/// Kubernetes metadata fallback from the record tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubernetesMetadataConfig {
    /// Parse the tag when the `kubernetes` object is missing
    #[serde(default)]
    pub fallback_to_tag_when_metadata_is_missing: bool,

    /// Drop records whose metadata cannot be recovered
    #[serde(default)]
    pub drop_log_entry_without_k8s_metadata: bool,

    /// Record key holding the tag
    #[serde(default = "default_tag_key")]
    pub tag_key: String,

    /// Tag prefix pattern
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Tag pattern capturing pod, namespace, container and container id
    #[serde(default = "default_tag_expression")]
    pub tag_expression: String,
}

impl Default for KubernetesMetadataConfig {
    fn default() -> Self {
        Self {
            fallback_to_tag_when_metadata_is_missing: false,
            drop_log_entry_without_k8s_metadata: false,
            tag_key: default_tag_key(),
            tag_prefix: default_tag_prefix(),
            tag_expression: default_tag_expression(),
        }
    }
}

fn default_tag_key() -> String {
    "tag".to_string()
}

fn default_tag_prefix() -> String {
    r"kubernetes\.var\.log\.containers".to_string()
}

fn default_tag_expression() -> String {
    r"\.([^_]+)_([^_]+)_(.+)-([a-z0-9]{64})\.log$".to_string()
}

/// Per-cluster client derivation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Prepended to the cluster name to build its endpoint
    #[serde(default)]
    pub dynamic_host_prefix: String,

    /// Appended to the cluster name to build its endpoint
    #[serde(default)]
    pub dynamic_host_suffix: String,
}

impl ForwarderConfig {
    /// Dynamic routing is configured
    pub fn has_dynamic_hosts(&self) -> bool {
        !self.plugin.dynamic_host_path.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: ForwarderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.client.queue_name, "forwarder");
        assert_eq!(config.client.queue_capacity, 1024);
        assert_eq!(config.plugin.label_keys, vec!["job".to_string()]);
        assert!(!config.has_dynamic_hosts());
    }

    #[test]
    fn test_key_mapping_nested() {
        let mapping: BTreeMap<String, KeyMapping> = serde_json::from_str(
            r#"{"kubernetes": {"namespace_name": "namespace"}, "stream": "stream"}"#,
        )
        .unwrap();
        assert_eq!(mapping["stream"], KeyMapping::Label("stream".into()));
        match &mapping["kubernetes"] {
            KeyMapping::Nested(inner) => {
                assert_eq!(inner["namespace_name"], KeyMapping::Label("namespace".into()))
            }
            other => panic!("unexpected mapping {other:?}"),
        }
    }

    #[test]
    fn test_client_config_validation() {
        let mut config = ClientConfig::default();
        assert!(config.validate().is_ok());
        config.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dynamic_tenant_enabled() {
        let mut tenant = DynamicTenantConfig::default();
        assert!(!tenant.is_enabled());
        tenant.tenant = "user".into();
        tenant.field = "type".into();
        tenant.regex = "user-exposed".into();
        assert!(tenant.is_enabled());
    }
}
