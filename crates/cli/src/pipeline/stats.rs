//! Pipeline statistics.

use std::time::Duration;

use contracts::{format_rate, StoreSnapshot};
use ingestion::MetricsSnapshot;
use observability::RunStatsAggregator;

/// Statistics from a measurement run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Wall-clock length of the run
    pub duration: Duration,

    /// Measurement streams that started
    pub streams_started: usize,

    /// Line counters of the ingestion side
    pub ingestion: MetricsSnapshot,

    /// Tick statistics
    pub run: RunStatsAggregator,

    /// Store state at shutdown
    pub snapshot: StoreSnapshot,
}

impl PipelineStats {
    /// Share of received lines that were rejected, as a percentage
    pub fn drop_rate(&self) -> f64 {
        if self.ingestion.lines_received > 0 {
            self.ingestion.lines_dropped as f64 / self.ingestion.lines_received as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Measurement Run ===\n");
        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Streams started: {}", self.streams_started);
        println!("   ├─ Lines received: {}", self.ingestion.lines_received);
        println!(
            "   ├─ Lines rejected: {} ({:.2}%)",
            self.ingestion.lines_dropped,
            self.drop_rate()
        );
        println!("   ├─ Reports stored: {}", self.ingestion.reports_ingested);
        println!("   └─ Streams ended: {}", self.ingestion.sources_ended);

        println!("\n{}", self.run.summary());

        println!("Final totals ({} flows)", self.snapshot.flows.len());
        let count = self.snapshot.flows.len();
        for (i, (flow, series)) in self.snapshot.flows.iter().enumerate() {
            let prefix = if i + 1 == count { "└─" } else { "├─" };
            let rate = series
                .current_total()
                .map(format_rate)
                .unwrap_or_else(|| "-".to_string());
            println!(
                "   {} {}: {} ({} samples, {} pending)",
                prefix,
                flow,
                rate,
                series.total.len(),
                series.pending.len()
            );
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_rate() {
        let stats = PipelineStats {
            ingestion: MetricsSnapshot {
                lines_received: 200,
                lines_dropped: 50,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!((stats.drop_rate() - 25.0).abs() < 1e-12);
        assert_eq!(PipelineStats::default().drop_rate(), 0.0);
    }
}
