//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Config file -> forwarder -> file sinks
//! - Cluster lifecycle while records are being routed
//! - Reserved label contract across crates

#[cfg(test)]
mod contract_tests {
    use contracts::{parse_tenants, MULTI_TENANT_LABEL, TENANT_ID_LABEL};

    #[test]
    fn test_reserved_labels_are_stable() {
        assert_eq!(MULTI_TENANT_LABEL, "__gardener_multitenant_id__");
        assert_eq!(TENANT_ID_LABEL, "__tenant_id__");
        assert_eq!(parse_tenants("  a ; ; b  "), vec!["a", "b"]);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ClientConfig, ClientFactory, ClusterEvent, ClusterSpec, ContractError, ControllerConfig,
        DeliveryClient, LogEntry, PluginConfig, Record, MULTI_TENANT_LABEL, TENANT_ID_LABEL,
    };
    use controller::ClusterRegistry;
    use delivery::{client_factory, BufferedClient, ClientOptions, FakeClient, FakeFactory};
    use forwarder::{Forwarder, ForwarderError};
    use serde_json::json;
    use tokio::sync::mpsc;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn read_entries(path: &Path) -> Vec<LogEntry> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn seed_config(queue_dir: &Path) -> String {
        format!(
            r#"
[client]
url = "http://vali.garden.svc:3100/vali/api/v1/push"
sink = "file"
queue_dir = "{}"
queue_name = "seed"

[plugin]
label_keys = ["job"]
remove_keys = ["tag"]
dynamic_host_regex = "^shoot-"

[plugin.dynamic_tenant]
tenant = "operator"
field = "type"
regex = "^event$"
remove_tenant_id_when_sending_to_default_url = true

[plugin.dynamic_host_path.kubernetes]
namespace_name = "namespace"

[controller]
dynamic_host_prefix = "http://logging."
dynamic_host_suffix = ".svc:3100/vali/api/v1/push"
"#,
            queue_dir.display()
        )
    }

    /// Config file -> Forwarder -> file sinks
    ///
    /// Verifies:
    /// 1. Default route strips the multi-tenant label
    /// 2. Cluster route fans out per tenant
    /// 3. Dynamic tenant applies to cluster records only
    #[tokio::test]
    async fn test_e2e_seed_forwarder() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::load_from_str(&seed_config(dir.path()), ConfigFormat::Toml)
            .unwrap();
        let forwarder = Forwarder::build(&config).unwrap();
        let registry = forwarder.registry().unwrap();

        registry
            .on_cluster_added("shoot--dev--app", &ClusterSpec::default())
            .unwrap();

        let now = Utc::now();
        forwarder
            .send_record(
                record(json!({
                    "log": "seed line",
                    "job": "fluent-bit",
                    "tag": "x",
                    MULTI_TENANT_LABEL: "operator;user"
                })),
                now,
            )
            .await
            .unwrap();
        forwarder
            .send_record(
                record(json!({
                    "log": "shoot line",
                    "kubernetes": {"namespace_name": "shoot--dev--app"},
                    MULTI_TENANT_LABEL: "operator; user"
                })),
                now,
            )
            .await
            .unwrap();
        forwarder
            .send_record(
                record(json!({
                    "log": "event",
                    "type": "event",
                    "kubernetes": {"namespace_name": "shoot--dev--app"}
                })),
                now,
            )
            .await
            .unwrap();

        forwarder.close_wait().await;

        let seed = read_entries(&dir.path().join("seed.jsonl"));
        assert_eq!(seed.len(), 1);
        assert!(!seed[0].labels.contains_key(MULTI_TENANT_LABEL));
        assert!(!seed[0].labels.contains_key(TENANT_ID_LABEL));
        assert_eq!(seed[0].labels["job"], "fluent-bit");
        let line: serde_json::Value = serde_json::from_str(&seed[0].line).unwrap();
        assert_eq!(line, json!({"log": "seed line"}));

        let shoot = read_entries(&dir.path().join("seed-controller-shoot--dev--app.jsonl"));
        let tenants: Vec<&str> = shoot
            .iter()
            .map(|entry| entry.labels[TENANT_ID_LABEL].as_str())
            .collect();
        assert_eq!(tenants, vec!["operator", "user", "operator"]);
        assert!(shoot.iter().all(|entry| entry.timestamp == now));
    }

    /// Records keep flowing while clusters come and go
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lifecycle_during_routing() {
        let clusters = FakeFactory::new();
        let registry = Arc::new(ClusterRegistry::new(
            ClientConfig::default(),
            ControllerConfig {
                dynamic_host_prefix: "http://".into(),
                dynamic_host_suffix: ":3100".into(),
            },
            clusters.factory(),
        ));
        let default = Arc::new(FakeClient::new("http://default:3100"));

        let mut plugin = PluginConfig::default();
        plugin.dynamic_host_regex = "^shoot-".into();
        plugin.dynamic_host_path =
            serde_json::from_value(json!({"kubernetes": {"namespace_name": "namespace"}}))
                .unwrap();
        let forwarder = Arc::new(
            Forwarder::new(plugin, default.clone(), Some(Arc::clone(&registry))).unwrap(),
        );

        let (tx, rx) = mpsc::channel(16);
        let events = tokio::spawn({
            let registry = Arc::clone(&registry);
            async move { registry.run_events(rx).await }
        });

        let mut senders = Vec::new();
        for worker in 0..4 {
            let forwarder = Arc::clone(&forwarder);
            senders.push(tokio::spawn(async move {
                let mut outcomes = (0usize, 0usize, 0usize);
                for i in 0..200 {
                    let result = forwarder
                        .send_record(
                            record(json!({
                                "log": format!("{worker}-{i}"),
                                "kubernetes": {"namespace_name": "shoot--dev--app"}
                            })),
                            Utc::now(),
                        )
                        .await;
                    match result {
                        Ok(()) => outcomes.0 += 1,
                        Err(ForwarderError::NoClient { .. }) => outcomes.1 += 1,
                        // client stopped between lookup and send
                        Err(ForwarderError::Contract(_)) => outcomes.2 += 1,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                    tokio::task::yield_now().await;
                }
                outcomes
            }));
        }

        for round in 0..10 {
            let name = "shoot--dev--app".to_string();
            tx.send(ClusterEvent::Added {
                name: name.clone(),
                spec: ClusterSpec::default(),
            })
            .await
            .unwrap();
            let mut spec = ClusterSpec::default();
            spec.labels.insert("round".into(), round.to_string());
            tx.send(ClusterEvent::Updated {
                name: name.clone(),
                spec,
            })
            .await
            .unwrap();
            tx.send(ClusterEvent::Deleted { name }).await.unwrap();
            tokio::task::yield_now().await;
        }
        drop(tx);

        let mut delivered = 0;
        let mut dropped = 0;
        let mut rejected = 0;
        for sender in senders {
            let (ok, missing, stopped) = sender.await.unwrap();
            delivered += ok;
            dropped += missing;
            rejected += stopped;
        }
        assert_eq!(events.await.unwrap(), 30);
        assert_eq!(delivered + dropped + rejected, 800);

        let accepted: usize = clusters
            .built()
            .iter()
            .map(|(_, client)| client.entries().len())
            .sum();
        assert_eq!(accepted, delivered);
        assert!(default.entries().is_empty());
    }

    /// Real buffered clients behind the registry, driven through events
    #[tokio::test]
    async fn test_registry_with_buffered_clients() {
        let dir = tempfile::tempdir().unwrap();
        let base = ClientConfig {
            sink: contracts::SinkKind::File,
            queue_dir: Some(dir.path().to_path_buf()),
            queue_name: "cluster".into(),
            ..ClientConfig::default()
        };
        let registry = ClusterRegistry::new(
            base,
            ControllerConfig::default(),
            client_factory(ClientOptions::multi_tenant()),
        );

        registry
            .apply(&ClusterEvent::Added {
                name: "a".into(),
                spec: ClusterSpec::default(),
            })
            .await
            .unwrap();

        let client = registry.get_client("a").unwrap();
        let mut labels = contracts::LabelSet::new();
        labels.insert(MULTI_TENANT_LABEL.into(), "x;y".into());
        client
            .handle(labels, Utc::now(), "line".into())
            .await
            .unwrap();

        registry
            .on_cluster_deleted("a")
            .unwrap()
            .await
            .unwrap();
        assert!(registry.get_client("a").is_none());
        assert!(client
            .handle(contracts::LabelSet::new(), Utc::now(), "late".into())
            .await
            .is_err());

        let entries = read_entries(&dir.path().join("cluster-a.jsonl"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].labels[TENANT_ID_LABEL], "y");
    }

    /// Sink that takes a while per entry
    struct SlowSink {
        written: Arc<AtomicUsize>,
    }

    impl contracts::EntrySink for SlowSink {
        fn name(&self) -> &str {
            "slow"
        }

        async fn write(&mut self, _entry: &LogEntry) -> Result<(), ContractError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.written.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    /// Closing waits for drains started by earlier deletions
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_all_wait_after_delete_drains_everything() {
        let written = Arc::new(AtomicUsize::new(0));
        let factory: ClientFactory = {
            let written = Arc::clone(&written);
            Arc::new(
                move |config: &ClientConfig| -> Result<Arc<dyn DeliveryClient>, ContractError> {
                    let sink = SlowSink {
                        written: Arc::clone(&written),
                    };
                    Ok(Arc::new(BufferedClient::spawn(
                        sink,
                        config.url.clone(),
                        config.queue_capacity,
                    )))
                },
            )
        };
        let registry = ClusterRegistry::new(
            ClientConfig::default(),
            ControllerConfig::default(),
            factory,
        );

        registry
            .on_cluster_added("a", &ClusterSpec::default())
            .unwrap();
        let client = registry.get_client("a").unwrap();
        for i in 0..5 {
            client
                .handle(contracts::LabelSet::new(), Utc::now(), format!("line {i}"))
                .await
                .unwrap();
        }

        // Drain task keeps running in the background
        let _drain = registry.on_cluster_deleted("a");
        tokio::time::sleep(Duration::from_millis(20)).await;

        registry.stop_all_wait().await;
        assert_eq!(written.load(Ordering::SeqCst), 5);
    }
}
