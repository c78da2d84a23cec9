//! BufferedClient - delivery client with an isolated queue and worker task

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use contracts::{ContractError, DeliveryClient, EntrySink, LabelSet, LogEntry};

use crate::metrics::ClientMetrics;

/// Delivery client backed by a running sink worker
///
/// `handle` waits for queue capacity, so a slow sink pushes back on its
/// callers instead of dropping entries.
pub struct BufferedClient {
    /// Sink name
    name: String,
    /// Endpoint served by the sink
    endpoint: String,
    /// Labels merged into every entry
    static_labels: LabelSet,
    /// Channel to send entries to worker; `None` once stopped
    tx: Mutex<Option<mpsc::Sender<LogEntry>>>,
    /// Worker task handle; `None` once stopped
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Flips to true once the worker has flushed and closed the sink
    drained: watch::Receiver<bool>,
    /// Shared metrics
    metrics: Arc<ClientMetrics>,
}

impl BufferedClient {
    /// Create a new BufferedClient and spawn the worker task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: EntrySink + Send + 'static>(
        sink: S,
        endpoint: impl Into<String>,
        queue_capacity: usize,
    ) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(ClientMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();
        let (drained_tx, drained) = watch::channel(false);

        let worker = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
            drained_tx.send_replace(true);
        });

        Self {
            name,
            endpoint: endpoint.into(),
            static_labels: LabelSet::new(),
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            drained,
            metrics,
        }
    }

    /// Merge these labels into every entry (entry labels win)
    pub fn with_static_labels(mut self, labels: LabelSet) -> Self {
        self.static_labels = labels;
        self
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.metrics
    }

    /// Whether `stop` or `stop_wait` has been called
    pub fn is_stopped(&self) -> bool {
        self.tx.lock().is_none()
    }

    fn sender(&self) -> Result<mpsc::Sender<LogEntry>, ContractError> {
        self.tx
            .lock()
            .clone()
            .ok_or_else(|| ContractError::client_stopped(&self.endpoint))
    }
}

#[async_trait]
impl DeliveryClient for BufferedClient {
    async fn handle(
        &self,
        mut labels: LabelSet,
        timestamp: DateTime<Utc>,
        line: String,
    ) -> Result<(), ContractError> {
        let tx = self.sender()?;

        for (name, value) in &self.static_labels {
            labels
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }

        tx.send(LogEntry::new(labels, timestamp, line))
            .await
            .map_err(|_| ContractError::client_stopped(&self.endpoint))?;

        self.metrics
            .set_queue_len(tx.max_capacity() - tx.capacity());
        Ok(())
    }

    fn stop(&self) {
        let Some(tx) = self.tx.lock().take() else {
            return;
        };
        drop(tx);

        if let Some(worker) = self.worker.lock().take() {
            worker.abort();
        }

        let discarded = self.metrics.queue_len() as u64;
        self.metrics.add_discarded(discarded);
        self.metrics.set_queue_len(0);
        info!(
            client = %self.name,
            endpoint = %self.endpoint,
            discarded,
            "Client stopped"
        );
    }

    #[instrument(name = "buffered_client_stop_wait", skip(self), fields(client = %self.name))]
    async fn stop_wait(&self) {
        let tx = self.tx.lock().take();
        let Some(tx) = tx else {
            // Another caller is draining, or the worker was aborted
            let mut drained = self.drained.clone();
            let _ = drained.wait_for(|done| *done).await;
            return;
        };
        // Dropping the last sender lets the worker drain and exit
        drop(tx);

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(client = %self.name, error = ?e, "Worker task failed");
            }
        }
        info!(client = %self.name, endpoint = %self.endpoint, "Client drained and stopped");
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Worker task that consumes entries and writes to sink
#[instrument(
    name = "client_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: EntrySink>(
    mut sink: S,
    mut rx: mpsc::Receiver<LogEntry>,
    metrics: Arc<ClientMetrics>,
    name: String,
) {
    debug!(sink = %name, "Client worker started");

    while let Some(entry) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&entry).await {
            Ok(()) => {
                metrics.inc_sent_count();
            }
            Err(e) => {
                metrics.inc_failure_count();
                error!(sink = %name, error = %e, "Write failed");
                // Keep going, a single bad entry must not stall the queue
            }
        }
    }

    // Cleanup
    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Client worker stopped");
}
