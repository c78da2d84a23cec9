//! Per-cluster client configuration

use contracts::{ClientConfig, ClusterSpec, ControllerConfig};

/// Derive the client configuration for cluster `name`
///
/// The endpoint is `prefix + name + suffix` unless the spec names one.
/// Queue names get the cluster name appended so file sinks never collide,
/// and spec labels extend the base static labels.
pub fn derive_client_config(
    base: &ClientConfig,
    controller: &ControllerConfig,
    name: &str,
    spec: &ClusterSpec,
) -> ClientConfig {
    let mut config = base.clone();

    config.url = match &spec.endpoint {
        Some(endpoint) => endpoint.clone(),
        None => format!(
            "{}{}{}",
            controller.dynamic_host_prefix, name, controller.dynamic_host_suffix
        ),
    };
    config.queue_name = format!("{}-{}", base.queue_name, name);
    config
        .static_labels
        .extend(spec.labels.iter().map(|(k, v)| (k.clone(), v.clone())));

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ControllerConfig {
        ControllerConfig {
            dynamic_host_prefix: "http://logging.".into(),
            dynamic_host_suffix: ".svc:3100/vali/api/v1/push".into(),
        }
    }

    #[test]
    fn test_url_from_prefix_and_suffix() {
        let config = derive_client_config(
            &ClientConfig::default(),
            &controller(),
            "shoot--dev--app",
            &ClusterSpec::default(),
        );
        assert_eq!(
            config.url,
            "http://logging.shoot--dev--app.svc:3100/vali/api/v1/push"
        );
        assert_eq!(config.queue_name, "forwarder-shoot--dev--app");
    }

    #[test]
    fn test_explicit_endpoint_and_labels() {
        let mut base = ClientConfig::default();
        base.static_labels.insert("origin".into(), "seed".into());

        let mut spec = ClusterSpec {
            endpoint: Some("http://custom:3100".into()),
            ..ClusterSpec::default()
        };
        spec.labels.insert("origin".into(), "shoot".into());
        spec.labels.insert("project".into(), "dev".into());

        let config = derive_client_config(&base, &controller(), "shoot--dev--app", &spec);
        assert_eq!(config.url, "http://custom:3100");
        assert_eq!(config.static_labels["origin"], "shoot");
        assert_eq!(config.static_labels["project"], "dev");
        assert_eq!(config.queue_capacity, base.queue_capacity);
    }
}
