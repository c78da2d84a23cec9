//! LogSink - emits entries via tracing

use contracts::{ContractError, EntrySink, LogEntry};
use tracing::{info, instrument};

/// Sink that logs entries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl EntrySink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_write", skip(self, entry), fields(sink = %self.name))]
    async fn write(&mut self, entry: &LogEntry) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            labels = ?entry.labels,
            timestamp = %entry.timestamp,
            line = %entry.line,
            "Entry delivered"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::LabelSet;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        let entry = LogEntry::new(LabelSet::new(), Utc::now(), "hello");

        let result = sink.write(&entry).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
