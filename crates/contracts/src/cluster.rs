//! Cluster lifecycle notifications

use serde::{Deserialize, Serialize};

use crate::LabelSet;

/// What a cluster notification carries besides its identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// Explicit endpoint; derived from the identity when absent
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Labels added to every entry sent to this cluster
    #[serde(default)]
    pub labels: LabelSet,
}

/// Lifecycle notification emitted by a cluster event source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClusterEvent {
    /// A cluster appeared
    Added {
        name: String,
        #[serde(default)]
        spec: ClusterSpec,
    },

    /// A cluster changed
    Updated {
        name: String,
        #[serde(default)]
        spec: ClusterSpec,
    },

    /// A cluster is gone
    Deleted { name: String },
}

impl ClusterEvent {
    /// Cluster identity the event refers to
    pub fn name(&self) -> &str {
        match self {
            Self::Added { name, .. } | Self::Updated { name, .. } | Self::Deleted { name } => name,
        }
    }

    /// Short event kind (used for logging/metrics)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Updated { .. } => "updated",
            Self::Deleted { .. } => "deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_from_json() {
        let event: ClusterEvent =
            serde_json::from_str(r#"{"event":"added","name":"shoot--dev--a"}"#).unwrap();
        assert_eq!(event.name(), "shoot--dev--a");
        assert_eq!(event.kind(), "added");
        assert!(matches!(event, ClusterEvent::Added { spec, .. } if spec == ClusterSpec::default()));
    }

    #[test]
    fn test_event_with_spec() {
        let event: ClusterEvent = serde_json::from_str(
            r#"{"event":"updated","name":"a","spec":{"endpoint":"http://a:3100","labels":{"team":"x"}}}"#,
        )
        .unwrap();
        match event {
            ClusterEvent::Updated { spec, .. } => {
                assert_eq!(spec.endpoint.as_deref(), Some("http://a:3100"));
                assert_eq!(spec.labels.get("team").map(String::as_str), Some("x"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }
}
