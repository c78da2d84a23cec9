//! Pipeline statistics.

use std::time::Duration;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Non-empty input lines
    pub records_read: u64,

    /// Records accepted by the forwarder
    pub records_forwarded: u64,

    /// Records without a live cluster client
    pub records_dropped: u64,

    /// Records rejected for any other reason
    pub records_failed: u64,

    /// Lines that are not JSON objects
    pub invalid_records: u64,

    /// Cluster events applied to the registry
    pub cluster_events_applied: usize,

    /// Total duration of the run
    pub duration: Duration,
}

impl PipelineStats {
    /// Forwarded records per second
    pub fn records_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.records_forwarded as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of read records that were not forwarded, in percent
    pub fn loss_rate(&self) -> f64 {
        if self.records_read > 0 {
            (self.records_read - self.records_forwarded) as f64 / self.records_read as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Forwarder Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Cluster events applied: {}", self.cluster_events_applied);
        println!("   ├─ Records read: {}", self.records_read);
        println!("   ├─ Records forwarded: {}", self.records_forwarded);
        println!("   └─ Records/s: {:.2}", self.records_per_sec());

        println!("\n⚠️  Losses ({:.2}%)", self.loss_rate());
        println!("   ├─ Dropped (no client): {}", self.records_dropped);
        println!("   ├─ Failed: {}", self.records_failed);
        println!("   └─ Invalid lines: {}", self.invalid_records);

        println!();
    }
}
