//! DeliveryClient / EntrySink traits - delivery interfaces
//!
//! `DeliveryClient` is what routing code talks to; it is object safe so that
//! decorators can wrap any client. `EntrySink` is the write side a buffered
//! client drains into.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{ClientConfig, ContractError, LabelSet, LogEntry};

/// Client delivering log entries to one endpoint
///
/// `stop` and `stop_wait` are idempotent and mutually exclusive: whichever
/// runs first decides the terminal state, later calls do nothing.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Accept one entry
    ///
    /// # Errors
    /// Returns an error when the client is stopped or the entry is rejected
    async fn handle(
        &self,
        labels: LabelSet,
        timestamp: DateTime<Utc>,
        line: String,
    ) -> Result<(), ContractError>;

    /// Stop immediately; buffered entries may be lost
    fn stop(&self);

    /// Stop after every accepted entry has been written
    async fn stop_wait(&self);

    /// Endpoint this client delivers to
    fn endpoint(&self) -> &str;
}

/// Builds a client for a derived client configuration
pub type ClientFactory =
    Arc<dyn Fn(&ClientConfig) -> Result<Arc<dyn DeliveryClient>, ContractError> + Send + Sync>;

/// Entry output trait
///
/// All sinks behind a buffered client implement this trait.
#[trait_variant::make(EntrySink: Send)]
pub trait LocalEntrySink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one entry
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, entry: &LogEntry) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
