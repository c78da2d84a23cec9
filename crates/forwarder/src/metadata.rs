//! Kubernetes metadata recovery from the record tag

use regex::Regex;
use serde_json::{Map, Value};

use contracts::Record;

use crate::error::{ForwarderError, Result};
use crate::labels::KUBERNETES_KEY;

const METADATA_FIELDS: [&str; 4] = ["pod_name", "namespace_name", "container_name", "docker_id"];

/// Parse the tag under `tag_key` and store the result as the `kubernetes` object
///
/// The pattern must capture pod name, namespace, container name and
/// container id, in that order.
///
/// # Errors
/// Returns an error when the tag is missing or does not match
pub fn extract_kubernetes_metadata_from_tag(
    record: &mut Record,
    tag_key: &str,
    pattern: &Regex,
) -> Result<()> {
    let Some(Value::String(tag)) = record.get(tag_key) else {
        return Err(ForwarderError::tag_metadata(format!(
            "the tag entry for key {tag_key:?} is missing"
        )));
    };

    let invalid = || {
        ForwarderError::tag_metadata(format!(
            "invalid format for tag {tag}, expected format: {}",
            pattern.as_str()
        ))
    };

    let captures = pattern.captures(tag).ok_or_else(invalid)?;
    let mut metadata = Map::new();
    for (index, field) in METADATA_FIELDS.iter().enumerate() {
        let value = captures.get(index + 1).ok_or_else(invalid)?;
        metadata.insert(field.to_string(), Value::String(value.as_str().to_string()));
    }

    record.insert(KUBERNETES_KEY.to_string(), Value::Object(metadata));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::KubernetesMetadataConfig;
    use serde_json::json;

    fn default_pattern() -> Regex {
        let config = KubernetesMetadataConfig::default();
        Regex::new(&format!("{}{}", config.tag_prefix, config.tag_expression)).unwrap()
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_extracts_metadata() {
        let docker_id = "a".repeat(64);
        let mut record = record(json!({
            "log": "hello",
            "tag": format!("kubernetes.var.log.containers.vali-0_garden_vali-{docker_id}.log")
        }));

        extract_kubernetes_metadata_from_tag(&mut record, "tag", &default_pattern()).unwrap();

        assert_eq!(
            record[KUBERNETES_KEY],
            json!({
                "pod_name": "vali-0",
                "namespace_name": "garden",
                "container_name": "vali",
                "docker_id": docker_id
            })
        );
    }

    #[test]
    fn test_missing_tag() {
        let mut record = record(json!({"log": "hello"}));
        let result = extract_kubernetes_metadata_from_tag(&mut record, "tag", &default_pattern());
        assert!(matches!(result, Err(ForwarderError::TagMetadata { .. })));
        assert!(!record.contains_key(KUBERNETES_KEY));
    }

    #[test]
    fn test_malformed_tag() {
        let mut record = record(json!({"tag": "kubernetes.var.log.containers.nope"}));
        let result = extract_kubernetes_metadata_from_tag(&mut record, "tag", &default_pattern());
        assert!(result.is_err());
    }
}
