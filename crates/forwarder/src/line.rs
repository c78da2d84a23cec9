//! Log line formatting

use contracts::{LineFormat, Record};

use crate::error::{ForwarderError, Result};
use crate::labels::value_to_string;

/// Format what is left of the record as the log line
///
/// # Errors
/// Returns an error when the record cannot be serialized
pub fn create_line(record: &Record, format: LineFormat) -> Result<String> {
    match format {
        LineFormat::Json => {
            serde_json::to_string(record).map_err(|e| ForwarderError::create_line(e.to_string()))
        }
        LineFormat::KeyValue => {
            let mut keys: Vec<&String> = record.keys().collect();
            keys.sort();
            let pairs: Vec<String> = keys
                .into_iter()
                .map(|key| format!("{key}={}", value_to_string(&record[key])))
                .collect();
            Ok(pairs.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_json_line() {
        let line = create_line(&record(json!({"log": "hello", "level": 3})), LineFormat::Json)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, json!({"log": "hello", "level": 3}));
    }

    #[test]
    fn test_key_value_line_is_sorted() {
        let line = create_line(
            &record(json!({"log": "hello world", "app": "web", "count": 2})),
            LineFormat::KeyValue,
        )
        .unwrap();
        assert_eq!(line, "app=web count=2 log=hello world");
    }

    #[test]
    fn test_key_value_empty_record() {
        assert_eq!(create_line(&Record::new(), LineFormat::KeyValue).unwrap(), "");
    }
}
