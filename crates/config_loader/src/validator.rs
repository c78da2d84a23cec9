//! Config validation
//!
//! Rules:
//! - client fields are well formed (queue name, capacity, url)
//! - file sinks have a queue directory
//! - every configured pattern compiles
//! - dynamic tenant is either fully set or not set at all
//! - a dynamic host path comes with a dynamic host pattern

use contracts::{ContractError, ForwarderConfig, SinkKind};
use regex::Regex;
use ::validator::Validate;

/// Validate a ForwarderConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &ForwarderConfig) -> Result<(), ContractError> {
    validate_client(config)?;
    validate_patterns(config)?;
    validate_dynamic_tenant(config)?;
    validate_dynamic_host(config)?;
    Ok(())
}

/// Validate the default client settings
fn validate_client(config: &ForwarderConfig) -> Result<(), ContractError> {
    config.client.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|name| format!("client.{name}"))
            .unwrap_or_else(|| "client".to_string());
        ContractError::config_validation(field, errors.to_string())
    })?;

    if config.client.sink == SinkKind::File && config.client.queue_dir.is_none() {
        return Err(ContractError::config_validation(
            "client.queue_dir",
            "file sink requires a queue_dir",
        ));
    }
    Ok(())
}

/// Validate that every pattern compiles
fn validate_patterns(config: &ForwarderConfig) -> Result<(), ContractError> {
    let plugin = &config.plugin;
    let metadata = &plugin.kubernetes_metadata;
    let tag_pattern = format!("{}{}", metadata.tag_prefix, metadata.tag_expression);

    let patterns = [
        ("plugin.dynamic_host_regex", plugin.dynamic_host_regex.as_str()),
        ("plugin.dynamic_tenant.regex", plugin.dynamic_tenant.regex.as_str()),
        ("plugin.kubernetes_metadata.tag_expression", tag_pattern.as_str()),
    ];

    for (field, pattern) in patterns {
        if pattern.is_empty() {
            continue;
        }
        Regex::new(pattern).map_err(|e| {
            ContractError::config_validation(field, format!("invalid pattern '{pattern}': {e}"))
        })?;
    }
    Ok(())
}

/// Validate dynamic tenant settings
fn validate_dynamic_tenant(config: &ForwarderConfig) -> Result<(), ContractError> {
    let tenant = &config.plugin.dynamic_tenant;
    let set = [&tenant.tenant, &tenant.field, &tenant.regex]
        .iter()
        .filter(|value| !value.is_empty())
        .count();

    if set != 0 && set != 3 {
        return Err(ContractError::config_validation(
            "plugin.dynamic_tenant",
            "tenant, field and regex must be set together",
        ));
    }
    Ok(())
}

/// Validate dynamic host settings
fn validate_dynamic_host(config: &ForwarderConfig) -> Result<(), ContractError> {
    if config.has_dynamic_hosts() && config.plugin.dynamic_host_regex.is_empty() {
        return Err(ContractError::config_validation(
            "plugin.dynamic_host_regex",
            "dynamic_host_path requires a dynamic_host_regex",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::KeyMapping;
    use std::path::PathBuf;

    fn minimal_config() -> ForwarderConfig {
        ForwarderConfig::default()
    }

    #[test]
    fn test_valid_minimal() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut config = minimal_config();
        config.client.queue_capacity = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("client.queue_capacity"));
    }

    #[test]
    fn test_file_sink_without_dir() {
        let mut config = minimal_config();
        config.client.sink = SinkKind::File;
        assert!(validate(&config).is_err());

        config.client.queue_dir = Some(PathBuf::from("/tmp/queues"));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_dynamic_host_regex() {
        let mut config = minimal_config();
        config.plugin.dynamic_host_regex = "shoot-(".into();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("plugin.dynamic_host_regex"));
    }

    #[test]
    fn test_partial_dynamic_tenant() {
        let mut config = minimal_config();
        config.plugin.dynamic_tenant.tenant = "user".into();
        assert!(validate(&config).is_err());

        config.plugin.dynamic_tenant.field = "type".into();
        config.plugin.dynamic_tenant.regex = "user-exposed".into();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_dynamic_host_path_requires_regex() {
        let mut config = minimal_config();
        config.plugin.dynamic_host_path.insert(
            "kubernetes".into(),
            KeyMapping::Nested(
                [("namespace_name".to_string(), KeyMapping::Label("namespace".into()))]
                    .into_iter()
                    .collect(),
            ),
        );
        assert!(validate(&config).is_err());

        config.plugin.dynamic_host_regex = "^shoot-".into();
        assert!(validate(&config).is_ok());
    }
}
