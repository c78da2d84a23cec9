//! Client construction from `ClientConfig`

use std::sync::Arc;

use tracing::{debug, info};

use contracts::{ClientConfig, ClientFactory, ContractError, DeliveryClient, SinkKind};

use crate::client::BufferedClient;
use crate::error::DeliveryError;
use crate::multi_tenant::MultiTenantClient;
use crate::remove_tenant::RemoveTenantClient;
use crate::sinks::{FileSink, LogSink, NullSink};

/// Decorators applied on top of the buffered client
///
/// `multi_tenant` takes precedence over `remove_tenant_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientOptions {
    pub multi_tenant: bool,
    pub remove_tenant_id: bool,
}

impl ClientOptions {
    pub fn multi_tenant() -> Self {
        Self {
            multi_tenant: true,
            remove_tenant_id: false,
        }
    }

    pub fn remove_tenant_id() -> Self {
        Self {
            multi_tenant: false,
            remove_tenant_id: true,
        }
    }
}

/// Build a buffered client for `config` and wrap it per `options`
///
/// Must be called from within a tokio runtime.
///
/// # Errors
/// Returns an error when no runtime is available or the sink cannot be created
pub fn new_client(
    config: &ClientConfig,
    options: ClientOptions,
) -> Result<Arc<dyn DeliveryClient>, DeliveryError> {
    if tokio::runtime::Handle::try_current().is_err() {
        return Err(DeliveryError::NoRuntime {
            name: config.queue_name.clone(),
        });
    }

    let name = config.queue_name.as_str();
    let capacity = config.queue_capacity;
    let client = match config.sink {
        SinkKind::Log => BufferedClient::spawn(LogSink::new(name), &config.url, capacity),
        SinkKind::Null => BufferedClient::spawn(NullSink::new(name), &config.url, capacity),
        SinkKind::File => {
            let dir = config
                .queue_dir
                .as_deref()
                .ok_or_else(|| DeliveryError::sink_creation(name, "file sink needs queue_dir"))?;
            BufferedClient::spawn(FileSink::new(name, dir)?, &config.url, capacity)
        }
    }
    .with_static_labels(config.static_labels.clone());

    info!(
        client = %name,
        endpoint = %config.url,
        sink = ?config.sink,
        "Client created"
    );

    let client: Arc<dyn DeliveryClient> = Arc::new(client);
    if options.multi_tenant {
        debug!(client = %name, "Wrapping client for multi-tenant fan-out");
        return Ok(Arc::new(MultiTenantClient::new(client)));
    }
    if options.remove_tenant_id {
        debug!(client = %name, "Wrapping client to strip multi-tenant label");
        return Ok(Arc::new(RemoveTenantClient::new(client)));
    }
    Ok(client)
}

/// `ClientFactory` that builds clients with `new_client`
pub fn client_factory(options: ClientOptions) -> ClientFactory {
    Arc::new(move |config: &ClientConfig| {
        new_client(config, options)
            .map_err(|e| ContractError::client_creation(&config.url, e.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{LabelSet, MULTI_TENANT_LABEL, TENANT_ID_LABEL};
    use tempfile::tempdir;

    fn file_config(dir: &std::path::Path, name: &str) -> ClientConfig {
        ClientConfig {
            url: "http://vali:3100".into(),
            sink: SinkKind::File,
            queue_dir: Some(dir.to_path_buf()),
            queue_name: name.into(),
            ..ClientConfig::default()
        }
    }

    fn read_lines(path: &std::path::Path) -> Vec<contracts::LogEntry> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_new_client_outside_runtime_fails() {
        let result = new_client(&ClientConfig::default(), ClientOptions::default());
        assert!(matches!(result, Err(DeliveryError::NoRuntime { .. })));
    }

    #[tokio::test]
    async fn test_file_sink_requires_queue_dir() {
        let config = ClientConfig {
            sink: SinkKind::File,
            ..ClientConfig::default()
        };
        let result = new_client(&config, ClientOptions::default());
        assert!(matches!(result, Err(DeliveryError::SinkCreation { .. })));
    }

    #[tokio::test]
    async fn test_multi_tenant_client_writes_one_entry_per_tenant() {
        let dir = tempdir().unwrap();
        let config = file_config(dir.path(), "mt");
        let client = new_client(&config, ClientOptions::multi_tenant()).unwrap();
        assert_eq!(client.endpoint(), "http://vali:3100");

        let mut labels = LabelSet::new();
        labels.insert(MULTI_TENANT_LABEL.into(), "operator; user".into());
        client.handle(labels, Utc::now(), "line".into()).await.unwrap();
        client.stop_wait().await;

        let entries = read_lines(&dir.path().join("mt.jsonl"));
        let tenants: Vec<_> = entries
            .iter()
            .map(|entry| entry.labels[TENANT_ID_LABEL].as_str())
            .collect();
        assert_eq!(tenants, vec!["operator", "user"]);
    }

    #[tokio::test]
    async fn test_remove_tenant_client_strips_label() {
        let dir = tempdir().unwrap();
        let config = file_config(dir.path(), "rt");
        let client = new_client(&config, ClientOptions::remove_tenant_id()).unwrap();

        let mut labels = LabelSet::new();
        labels.insert(MULTI_TENANT_LABEL.into(), "operator".into());
        labels.insert("job".into(), "fluent-bit".into());
        client.handle(labels, Utc::now(), "line".into()).await.unwrap();
        client.stop_wait().await;

        let entries = read_lines(&dir.path().join("rt.jsonl"));
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].labels.contains_key(MULTI_TENANT_LABEL));
        assert_eq!(entries[0].labels["job"], "fluent-bit");
    }

    #[tokio::test]
    async fn test_client_factory_maps_errors() {
        let factory = client_factory(ClientOptions::default());
        let config = ClientConfig {
            sink: SinkKind::File,
            url: "http://broken".into(),
            ..ClientConfig::default()
        };
        let err = factory(&config).err().unwrap();
        assert!(matches!(err, ContractError::ClientCreation { ref endpoint, .. } if endpoint == "http://broken"));
    }
}
