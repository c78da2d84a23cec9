//! Cluster event loop

use tokio::sync::mpsc;
use tracing::{error, info, instrument};

use contracts::ClusterEvent;
use observability::{error_kind, record_error};

use crate::error::Result;
use crate::registry::ClusterRegistry;

impl ClusterRegistry {
    /// Apply one lifecycle event
    ///
    /// Deletions do not wait for the drain to finish.
    ///
    /// # Errors
    /// Returns the handler error for added/updated events
    pub async fn apply(&self, event: &ClusterEvent) -> Result<()> {
        match event {
            ClusterEvent::Added { name, spec } => self.on_cluster_added(name, spec),
            ClusterEvent::Updated { name, spec } => self.on_cluster_updated(name, spec).await,
            ClusterEvent::Deleted { name } => {
                self.on_cluster_deleted(name);
                Ok(())
            }
        }
    }

    /// Apply events in order until the channel closes
    ///
    /// Handler errors are logged and counted; they never end the loop.
    /// Returns the number of events applied successfully.
    #[instrument(name = "registry_run_events", skip(self, rx))]
    pub async fn run_events(&self, mut rx: mpsc::Receiver<ClusterEvent>) -> usize {
        let mut applied = 0;

        while let Some(event) = rx.recv().await {
            match self.apply(&event).await {
                Ok(()) => applied += 1,
                Err(e) => {
                    record_error(error_kind::CLUSTER_EVENT);
                    error!(
                        cluster = event.name(),
                        kind = event.kind(),
                        error = %e,
                        "Cluster event failed"
                    );
                }
            }
        }

        info!(applied, "Cluster event channel closed");
        applied
    }
}
