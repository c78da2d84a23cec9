//! Record to label extraction

use std::collections::BTreeMap;

use serde_json::Value;

use contracts::{KeyMapping, LabelSet, Record, MULTI_TENANT_LABEL};

use crate::error::{ForwarderError, Result};

/// Record key holding the kubernetes metadata object
pub const KUBERNETES_KEY: &str = "kubernetes";

const KUBERNETES_LABELS_KEY: &str = "labels";
const SKIPPED_KUBERNETES_KEYS: [&str; 3] = ["docker_id", "pod_id", "annotations"];

/// Render a record value as label value or line
///
/// Strings are taken verbatim, everything else as JSON.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten the `kubernetes` object into `labels`
///
/// Pod labels (the nested `labels` object) become labels of their own;
/// container ids and annotations are skipped.
///
/// # Errors
/// Returns an error when the record has no `kubernetes` object
pub fn auto_kubernetes_labels(record: &Record, labels: &mut LabelSet) -> Result<()> {
    let Some(Value::Object(kubernetes)) = record.get(KUBERNETES_KEY) else {
        return Err(ForwarderError::missing_metadata(
            "kubernetes labels not found, no labels will be added",
        ));
    };

    for (key, value) in kubernetes {
        if SKIPPED_KUBERNETES_KEYS.contains(&key.as_str()) {
            continue;
        }
        match (key.as_str(), value) {
            (KUBERNETES_LABELS_KEY, Value::Object(pod_labels)) => {
                for (name, value) in pod_labels {
                    labels.insert(name.clone(), value_to_string(value));
                }
            }
            _ => {
                labels.insert(key.clone(), value_to_string(value));
            }
        }
    }
    Ok(())
}

/// Copy the listed record keys into `labels`
pub fn extract_labels(record: &Record, keys: &[String], labels: &mut LabelSet) {
    for key in keys {
        if let Some(value) = record.get(key) {
            labels.insert(key.clone(), value_to_string(value));
        }
    }
}

/// Copy string values into `labels` following a nested key mapping
pub fn map_labels(record: &Record, mapping: &BTreeMap<String, KeyMapping>, labels: &mut LabelSet) {
    for (key, mapping) in mapping {
        match (mapping, record.get(key)) {
            (KeyMapping::Label(name), Some(Value::String(value))) => {
                labels.insert(name.clone(), value.clone());
            }
            (KeyMapping::Nested(inner), Some(Value::Object(nested))) => {
                map_labels(nested, inner, labels);
            }
            _ => {}
        }
    }
}

/// Follow `path` into the record and return the string value at its leaf
pub fn dynamic_host_name(record: &Record, path: &BTreeMap<String, KeyMapping>) -> Option<String> {
    for (key, mapping) in path {
        match mapping {
            KeyMapping::Nested(inner) => {
                return match record.get(key)? {
                    Value::Object(nested) => dynamic_host_name(nested, inner),
                    _ => None,
                };
            }
            KeyMapping::Label(_) => {
                if let Some(Value::String(value)) = record.get(key) {
                    return Some(value.clone());
                }
            }
        }
    }
    None
}

/// Delete `keys` from the record
pub fn remove_keys<'a>(record: &mut Record, keys: impl IntoIterator<Item = &'a String>) {
    for key in keys {
        record.remove(key);
    }
}

/// Move the multi-tenant value from the record into `labels`
pub(crate) fn move_multi_tenant_label(record: &mut Record, labels: &mut LabelSet) {
    if let Some(Value::String(value)) = record.remove(MULTI_TENANT_LABEL) {
        labels.insert(MULTI_TENANT_LABEL.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn mapping(value: Value) -> BTreeMap<String, KeyMapping> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_auto_kubernetes_labels() {
        let record = record(json!({
            "log": "hello",
            "kubernetes": {
                "pod_name": "app-0",
                "namespace_name": "shoot--dev--app",
                "docker_id": "abc",
                "pod_id": "123",
                "annotations": {"a": "b"},
                "labels": {"app": "web", "tier": "1"}
            }
        }));

        let mut labels = LabelSet::new();
        auto_kubernetes_labels(&record, &mut labels).unwrap();

        assert_eq!(labels["pod_name"], "app-0");
        assert_eq!(labels["namespace_name"], "shoot--dev--app");
        assert_eq!(labels["app"], "web");
        assert_eq!(labels["tier"], "1");
        assert!(!labels.contains_key("docker_id"));
        assert!(!labels.contains_key("pod_id"));
        assert!(!labels.contains_key("annotations"));
        assert!(!labels.contains_key("labels"));
    }

    #[test]
    fn test_auto_kubernetes_labels_missing() {
        let mut labels = LabelSet::new();
        let result = auto_kubernetes_labels(&record(json!({"log": "x"})), &mut labels);
        assert!(matches!(result, Err(ForwarderError::MissingMetadata { .. })));
        assert!(labels.is_empty());
    }

    #[test]
    fn test_extract_labels() {
        let record = record(json!({"job": "fluent-bit", "level": 3, "log": "x"}));
        let mut labels = LabelSet::new();
        extract_labels(
            &record,
            &["job".into(), "level".into(), "absent".into()],
            &mut labels,
        );

        assert_eq!(labels.len(), 2);
        assert_eq!(labels["job"], "fluent-bit");
        assert_eq!(labels["level"], "3");
    }

    #[test]
    fn test_map_labels_nested() {
        let record = record(json!({
            "stream": "stderr",
            "kubernetes": {"namespace_name": "garden", "pod_name": "vali-0", "restarts": 2}
        }));
        let mapping = mapping(json!({
            "stream": "stream",
            "kubernetes": {"namespace_name": "namespace", "restarts": "restarts", "host": "host"}
        }));

        let mut labels = LabelSet::new();
        map_labels(&record, &mapping, &mut labels);

        assert_eq!(labels.len(), 2);
        assert_eq!(labels["stream"], "stderr");
        assert_eq!(labels["namespace"], "garden");
    }

    #[test]
    fn test_dynamic_host_name() {
        let path = mapping(json!({"kubernetes": {"namespace_name": "namespace"}}));

        let found = record(json!({"kubernetes": {"namespace_name": "shoot--dev--app"}}));
        assert_eq!(dynamic_host_name(&found, &path).as_deref(), Some("shoot--dev--app"));

        let flat = record(json!({"kubernetes": "not an object"}));
        assert_eq!(dynamic_host_name(&flat, &path), None);

        assert_eq!(dynamic_host_name(&record(json!({})), &path), None);
        assert_eq!(dynamic_host_name(&found, &BTreeMap::new()), None);
    }

    #[test]
    fn test_move_multi_tenant_label() {
        let mut record = record(json!({"log": "x", (MULTI_TENANT_LABEL): "operator;user"}));
        let mut labels = LabelSet::new();

        move_multi_tenant_label(&mut record, &mut labels);

        assert!(!record.contains_key(MULTI_TENANT_LABEL));
        assert_eq!(labels[MULTI_TENANT_LABEL], "operator;user");
    }

    #[test]
    fn test_remove_keys() {
        let mut record = record(json!({"job": "a", "log": "x", "tag": "t"}));
        let keys = vec!["job".to_string(), "tag".to_string()];
        remove_keys(&mut record, &keys);
        assert_eq!(record.len(), 1);
        assert!(record.contains_key("log"));
    }
}
