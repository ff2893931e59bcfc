//! Pipeline statistics.

use std::time::Duration;

use controller::ControllerStats;
use dispatcher::MetricsSnapshot;
use history::CookStatus;
use observability::MetricsSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Ticks completed
    pub ticks: u64,

    /// Ticks where the whole sample failed
    pub source_errors: u64,

    /// Snapshots evicted from history
    pub evictions: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Snapshots retained at shutdown
    pub history_len: usize,

    /// Cook status of the last snapshot
    pub final_status: Option<CookStatus>,

    /// Per-tick aggregate
    pub summary: MetricsSummary,

    /// Final counters per sink
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl PipelineStats {
    pub fn from_controller(stats: ControllerStats, duration: Duration) -> Self {
        Self {
            ticks: stats.ticks,
            source_errors: stats.source_errors,
            evictions: stats.evictions,
            duration,
            summary: stats.aggregator.summary(),
            sinks: stats.sinks,
            ..Default::default()
        }
    }

    /// Failed deliveries summed over all sinks
    pub fn sink_failures(&self) -> u64 {
        self.sinks.iter().map(|(_, m)| m.failure_count).sum()
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Pipeline Statistics                       ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {}", self.ticks);
        println!("   ├─ Source outages: {}", self.source_errors);
        println!("   ├─ History: {} retained, {} evicted", self.history_len, self.evictions);
        match &self.final_status {
            Some(status) => println!("   └─ Last status: {}", status),
            None => println!("   └─ Last status: No data"),
        }

        println!("\n{}", self.summary);

        if !self.sinks.is_empty() {
            println!("📤 Sinks (failed deliveries: {})", self.sink_failures());
            for (i, (name, m)) in self.sinks.iter().enumerate() {
                let prefix = if i == self.sinks.len() - 1 { "└─" } else { "├─" };
                println!(
                    "   {} {}: delivered={} failed={} dropped={} avg={:.2}ms",
                    prefix, name, m.delivered_count, m.failure_count, m.dropped_count, m.avg_delivery_ms
                );
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink(failures: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: 0,
            delivered_count: 5,
            failure_count: failures,
            dropped_count: 0,
            avg_delivery_ms: 0.1,
        }
    }

    #[test]
    fn test_from_controller() {
        let controller_stats = ControllerStats {
            ticks: 7,
            source_errors: 1,
            evictions: 2,
            sinks: vec![("file".into(), sink(0)), ("notify".into(), sink(3))],
            ..Default::default()
        };

        let stats = PipelineStats::from_controller(controller_stats, Duration::from_secs(35));
        assert_eq!(stats.ticks, 7);
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.sink_failures(), 3);
        assert!(stats.final_status.is_none());
    }
}
