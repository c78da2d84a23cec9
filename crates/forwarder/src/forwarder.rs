//! Forwarder - routes records to the default or a per-cluster client

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};

use contracts::{
    ClientConfig, DeliveryClient, ForwarderConfig, LabelSet, PluginConfig, Record, TENANT_ID_LABEL,
};
use controller::ClusterRegistry;
use delivery::{client_factory, new_client, ClientOptions};
use observability::{
    error_kind, record_dropped_log, record_error, record_incoming_log,
    record_incoming_log_with_endpoint, record_log_without_metadata, DEFAULT_HOST,
};

use crate::error::{ForwarderError, Result};
use crate::labels::{
    auto_kubernetes_labels, dynamic_host_name, extract_labels, map_labels,
    move_multi_tenant_label, remove_keys, value_to_string, KUBERNETES_KEY,
};
use crate::line::create_line;
use crate::metadata::extract_kubernetes_metadata_from_tag;

/// Static tenant for records whose field matches a pattern
struct DynamicTenant {
    tenant: String,
    field: String,
    pattern: Regex,
}

/// Entry router
///
/// Records whose dynamic host matches the configured pattern go to that
/// cluster's client; all others go to the default client.
pub struct Forwarder {
    plugin: PluginConfig,
    default_client: Arc<dyn DeliveryClient>,
    registry: Option<Arc<ClusterRegistry>>,
    dynamic_host_pattern: Option<Regex>,
    dynamic_tenant: Option<DynamicTenant>,
    metadata_pattern: Option<Regex>,
    hostname_label: Option<(String, String)>,
}

impl Forwarder {
    /// Create a forwarder around existing clients
    ///
    /// # Errors
    /// Returns an error when a configured pattern does not compile
    pub fn new(
        plugin: PluginConfig,
        default_client: Arc<dyn DeliveryClient>,
        registry: Option<Arc<ClusterRegistry>>,
    ) -> Result<Self> {
        let dynamic_host_pattern = if plugin.dynamic_host_path.is_empty() {
            None
        } else {
            Some(compile("plugin.dynamic_host_regex", &plugin.dynamic_host_regex)?)
        };

        let tenant = &plugin.dynamic_tenant;
        let dynamic_tenant = if tenant.is_enabled() {
            Some(DynamicTenant {
                tenant: tenant.tenant.clone(),
                field: tenant.field.clone(),
                pattern: compile("plugin.dynamic_tenant.regex", &tenant.regex)?,
            })
        } else {
            None
        };

        let metadata = &plugin.kubernetes_metadata;
        let metadata_pattern = if metadata.fallback_to_tag_when_metadata_is_missing {
            let pattern = format!("{}{}", metadata.tag_prefix, metadata.tag_expression);
            Some(compile("plugin.kubernetes_metadata.tag_expression", &pattern)?)
        } else {
            None
        };

        let hostname_label = resolve_hostname_label(&plugin);

        info!(
            default_client = default_client.endpoint(),
            dynamic_routing = registry.is_some(),
            "Forwarder created"
        );

        Ok(Self {
            plugin,
            default_client,
            registry,
            dynamic_host_pattern,
            dynamic_tenant,
            metadata_pattern,
            hostname_label,
        })
    }

    /// Build the default client and, with dynamic routing, the cluster registry
    ///
    /// The default client strips tenant routing labels when configured to;
    /// cluster clients fan entries out per tenant.
    ///
    /// # Errors
    /// Returns an error when the default client cannot be built or a pattern
    /// does not compile
    #[instrument(name = "forwarder_build", skip(config))]
    pub fn build(config: &ForwarderConfig) -> Result<Self> {
        let options = ClientOptions {
            multi_tenant: false,
            remove_tenant_id: config
                .plugin
                .dynamic_tenant
                .remove_tenant_id_when_sending_to_default_url,
        };
        let default_client = new_client(&config.client, options)?;

        let registry = config.has_dynamic_hosts().then(|| {
            Arc::new(ClusterRegistry::new(
                cluster_template(&config.client),
                config.controller.clone(),
                client_factory(ClientOptions::multi_tenant()),
            ))
        });

        Self::new(config.plugin.clone(), default_client, registry)
    }

    /// Cluster registry, when dynamic routing is configured
    pub fn registry(&self) -> Option<&Arc<ClusterRegistry>> {
        self.registry.as_ref()
    }

    /// Client used for records without a dynamic host
    pub fn default_client(&self) -> &Arc<dyn DeliveryClient> {
        &self.default_client
    }

    /// Whether `name` designates a per-cluster target
    pub fn is_dynamic_host(&self, name: &str) -> bool {
        !name.is_empty()
            && self
                .dynamic_host_pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(name))
    }

    /// Client serving host `name`
    ///
    /// `None` when `name` is a dynamic host without a live cluster client.
    pub fn resolve_client(&self, name: &str) -> Option<Arc<dyn DeliveryClient>> {
        match &self.registry {
            Some(registry) if self.is_dynamic_host(name) => registry.get_client(name),
            _ => Some(Arc::clone(&self.default_client)),
        }
    }

    /// Set the configured tenant when the record field matches
    pub fn apply_dynamic_tenant(&self, record: &Record, labels: &mut LabelSet) {
        let Some(tenant) = &self.dynamic_tenant else {
            return;
        };
        if let Some(serde_json::Value::String(value)) = record.get(&tenant.field) {
            if tenant.pattern.is_match(value) {
                labels.insert(TENANT_ID_LABEL.to_string(), tenant.tenant.clone());
            }
        }
    }

    /// Route one record
    ///
    /// Records dropped on purpose (missing metadata, nothing left after key
    /// removal) return `Ok`.
    ///
    /// # Errors
    /// Returns an error when no client serves the record's host, the line
    /// cannot be built or the client rejects the entry
    pub async fn send_record(&self, mut record: Record, timestamp: DateTime<Utc>) -> Result<()> {
        if !record.contains_key(KUBERNETES_KEY) && !self.recover_metadata(&mut record) {
            return Ok(());
        }

        let mut labels = LabelSet::new();
        if self.plugin.auto_kubernetes_labels {
            if let Err(e) = auto_kubernetes_labels(&record, &mut labels) {
                record_error(error_kind::AUTO_KUBERNETES_LABELS);
                error!(error = %e, "Auto kubernetes labels failed");
            }
        }
        match &self.plugin.label_map {
            Some(mapping) => map_labels(&record, mapping, &mut labels),
            None => {
                // Label keys replace the auto kubernetes labels
                labels.clear();
                extract_labels(&record, &self.plugin.label_keys, &mut labels);
            }
        }

        let dynamic_host =
            dynamic_host_name(&record, &self.plugin.dynamic_host_path).unwrap_or_default();
        let host = if self.is_dynamic_host(&dynamic_host) {
            self.apply_dynamic_tenant(&record, &mut labels);
            dynamic_host.as_str()
        } else {
            DEFAULT_HOST
        };

        record_incoming_log(host);

        move_multi_tenant_label(&mut record, &mut labels);
        remove_keys(
            &mut record,
            self.plugin.label_keys.iter().chain(&self.plugin.remove_keys),
        );
        if record.is_empty() {
            debug!(host, "No record fields left after removing keys");
            return Ok(());
        }

        let Some(client) = self.resolve_client(&dynamic_host) else {
            record_dropped_log(host);
            warn!(host = %dynamic_host, "No client found for dynamic host, record dropped");
            return Err(ForwarderError::NoClient { host: dynamic_host });
        };

        record_incoming_log_with_endpoint(host);

        if let Some((key, value)) = &self.hostname_label {
            labels.insert(key.clone(), value.clone());
        }

        let single_value = if self.plugin.drop_single_key && record.len() == 1 {
            record.values().next().map(value_to_string)
        } else {
            None
        };
        let line = match single_value {
            Some(line) => line,
            None => create_line(&record, self.plugin.line_format).inspect_err(|_| {
                record_error(error_kind::CREATE_LINE);
            })?,
        };

        if let Err(e) = client.handle(labels, timestamp, line).await {
            record_error(error_kind::SEND_RECORD);
            error!(host, error = %e, "Error sending record");
            return Err(e.into());
        }
        Ok(())
    }

    /// Stop the default client, then every cluster client, immediately
    #[instrument(name = "forwarder_close", skip(self))]
    pub fn close(&self) {
        self.default_client.stop();
        if let Some(registry) = &self.registry {
            registry.stop_all();
        }
        info!(
            default_client = self.default_client.endpoint(),
            "Forwarder stopped"
        );
    }

    /// Drain the default client, then every cluster client
    #[instrument(name = "forwarder_close_wait", skip(self))]
    pub async fn close_wait(&self) {
        self.default_client.stop_wait().await;
        if let Some(registry) = &self.registry {
            registry.stop_all_wait().await;
        }
        info!(
            default_client = self.default_client.endpoint(),
            "Forwarder drained and stopped"
        );
    }

    /// Rebuild the `kubernetes` object from the tag when configured
    ///
    /// Returns false when the record must be dropped.
    fn recover_metadata(&self, record: &mut Record) -> bool {
        let Some(pattern) = &self.metadata_pattern else {
            return true;
        };
        let metadata = &self.plugin.kubernetes_metadata;

        let Err(e) = extract_kubernetes_metadata_from_tag(record, &metadata.tag_key, pattern)
        else {
            return true;
        };

        record_error(error_kind::METADATA_EXTRACTION);
        error!(error = %e, "Cannot extract kubernetes metadata");

        if metadata.drop_log_entry_without_k8s_metadata {
            warn!(
                tag_key = %metadata.tag_key,
                "Kubernetes metadata is missing, record dropped"
            );
            record_log_without_metadata("kubernetes");
            return false;
        }
        true
    }
}

fn compile(field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| ForwarderError::invalid_pattern(field, e))
}

/// Template for cluster clients; keeps their queues apart from the default one
fn cluster_template(client: &ClientConfig) -> ClientConfig {
    ClientConfig {
        queue_name: format!("{}-controller", client.queue_name),
        ..client.clone()
    }
}

fn resolve_hostname_label(plugin: &PluginConfig) -> Option<(String, String)> {
    let key = plugin.hostname_key.clone()?;
    if let Some(value) = &plugin.hostname_value {
        return Some((key, value.clone()));
    }
    match os_hostname() {
        Ok(value) => Some((key, value)),
        Err(e) => {
            record_error(error_kind::HOSTNAME);
            warn!(error = %e, "Cannot resolve host name, hostname label disabled");
            None
        }
    }
}

fn os_hostname() -> std::io::Result<String> {
    let name = gethostname::gethostname()
        .into_string()
        .map_err(|_| std::io::Error::other("host name is not valid UTF-8"))?;
    if name.is_empty() {
        return Err(std::io::Error::other("empty host name"));
    }
    Ok(name)
}
