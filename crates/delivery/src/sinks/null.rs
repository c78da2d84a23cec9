//! NullSink - discards entries

use contracts::{ContractError, EntrySink, LogEntry};

/// Sink that accepts and forgets every entry
pub struct NullSink {
    name: String,
}

impl NullSink {
    /// Create a new NullSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl EntrySink for NullSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, _entry: &LogEntry) -> Result<(), ContractError> {
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}
