//! Pipeline orchestrator - applies cluster events, then streams records.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use contracts::{ClusterEvent, ForwarderConfig, Record};
use forwarder::{Forwarder, ForwarderError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Forwarder configuration
    pub config: ForwarderConfig,

    /// Records as JSON lines (None = stdin)
    pub input: Option<PathBuf>,

    /// Cluster events as JSON lines
    pub clusters: Option<PathBuf>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the input ends or `shutdown` resolves
    ///
    /// The forwarder is always drained before returning.
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let forwarder =
            Forwarder::build(&self.config.config).context("Failed to build forwarder")?;
        let mut stats = PipelineStats::default();

        let result = self.forward(&forwarder, shutdown, &mut stats).await;

        info!("Draining clients...");
        forwarder.close_wait().await;
        stats.duration = start_time.elapsed();

        result.map(|()| stats)
    }

    async fn forward<F>(
        &self,
        forwarder: &Forwarder,
        shutdown: F,
        stats: &mut PipelineStats,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if let Some(path) = &self.config.clusters {
            stats.cluster_events_applied = apply_cluster_events(forwarder, path).await?;
            info!(
                applied = stats.cluster_events_applied,
                clusters = ?forwarder.registry().map(|r| r.cluster_names()),
                "Cluster events applied"
            );
        }

        match &self.config.input {
            Some(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                info!(input = %path.display(), "Forwarding records");
                forward_lines(forwarder, BufReader::new(file), shutdown, stats).await
            }
            None => {
                info!("Forwarding records from stdin");
                forward_lines(forwarder, BufReader::new(tokio::io::stdin()), shutdown, stats).await
            }
        }
    }
}

/// Read cluster events, one JSON object per line
async fn read_cluster_events(path: &Path) -> std::result::Result<Vec<ClusterEvent>, CliError> {
    let content = tokio::fs::read_to_string(path).await?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| CliError::invalid_line(path, index + 1, e.to_string()))
        })
        .collect()
}

async fn apply_cluster_events(forwarder: &Forwarder, path: &Path) -> Result<usize> {
    let registry = forwarder.registry().ok_or(CliError::NoRegistry)?;
    let events = read_cluster_events(path).await?;

    let (tx, rx) = mpsc::channel(events.len().max(1));
    for event in events {
        if tx.send(event).await.is_err() {
            break;
        }
    }
    drop(tx);

    Ok(registry.run_events(rx).await)
}

async fn forward_lines<R, F>(
    forwarder: &Forwarder,
    reader: R,
    shutdown: F,
    stats: &mut PipelineStats,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    loop {
        let line = tokio::select! {
            _ = &mut shutdown => {
                warn!("Shutdown requested, stop reading records");
                break;
            }
            line = lines.next_line() => line.context("Failed to read input")?,
        };
        let Some(line) = line else {
            break;
        };
        line_no += 1;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        stats.records_read += 1;

        let record: Record = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                stats.invalid_records += 1;
                warn!(line = line_no, error = %e, "Skipping invalid record");
                continue;
            }
        };

        match forwarder.send_record(record, Utc::now()).await {
            Ok(()) => stats.records_forwarded += 1,
            Err(ForwarderError::NoClient { .. }) => stats.records_dropped += 1,
            Err(e) => {
                stats.records_failed += 1;
                debug!(line = line_no, error = %e, "Record not forwarded");
            }
        }
    }

    Ok(())
}
