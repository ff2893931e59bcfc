//! Pipeline metrics.
//!
//! Per-tick metrics go to the `metrics` facade (exported by Prometheus when
//! enabled) and can also be folded into a [`TickMetricsAggregator`] for an
//! end-of-run summary.

use std::collections::BTreeMap;

use contracts::Snapshot;
use metrics::{counter, gauge, histogram};

/// Record metrics for one completed tick
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_snapshot_metrics;
///
/// let snapshot = assembler.assemble(tick, timestamp, outcome);
/// record_snapshot_metrics(&snapshot, started.elapsed().as_secs_f64() * 1000.0);
/// ```
pub fn record_snapshot_metrics(snapshot: &Snapshot, tick_duration_ms: f64) {
    counter!("pit_companion_ticks_total").increment(1);
    gauge!("pit_companion_last_tick").set(snapshot.tick() as f64);
    histogram!("pit_companion_tick_duration_ms").record(tick_duration_ms);

    gauge!("pit_companion_readings_current").set(snapshot.len() as f64);
    gauge!("pit_companion_sources_failed").set(snapshot.failed().len() as f64);

    if snapshot.is_empty() {
        counter!("pit_companion_empty_snapshots_total").increment(1);
    } else if snapshot.is_partial() {
        counter!("pit_companion_partial_snapshots_total").increment(1);
    }

    for (source_id, reading) in snapshot.readings() {
        gauge!(
            "pit_companion_temperature_celsius",
            "source_id" => source_id.to_string()
        )
        .set(reading.value_c());
    }

    for source_id in snapshot.failed() {
        counter!(
            "pit_companion_source_failures_total",
            "source_id" => source_id.to_string()
        )
        .increment(1);
    }
}

/// Record a whole-sample error from the reading source
pub fn record_source_error(source_name: &str) {
    counter!(
        "pit_companion_source_errors_total",
        "source" => source_name.to_string()
    )
    .increment(1);
}

/// Record the delivery counters of one sink
pub fn record_sink_state(
    sink_name: &str,
    queue_len: usize,
    delivered: u64,
    failed: u64,
    dropped: u64,
) {
    let sink = sink_name.to_string();
    gauge!("pit_companion_sink_queue_len", "sink" => sink.clone()).set(queue_len as f64);
    gauge!("pit_companion_sink_delivered", "sink" => sink.clone()).set(delivered as f64);
    gauge!("pit_companion_sink_failures", "sink" => sink.clone()).set(failed as f64);
    gauge!("pit_companion_sink_dropped", "sink" => sink).set(dropped as f64);
}

/// Record history occupancy
pub fn record_history_len(len: usize, capacity: usize) {
    gauge!("pit_companion_history_len").set(len as f64);
    gauge!("pit_companion_history_capacity").set(capacity as f64);
}

/// In-memory tick statistics for the run summary
#[derive(Debug, Clone, Default)]
pub struct TickMetricsAggregator {
    pub total_ticks: u64,

    /// Ticks where some but not all sources failed
    pub partial_ticks: u64,

    /// Ticks without any reading
    pub empty_ticks: u64,

    /// Snapshots dropped at a full sink queue, summed over sinks
    pub dispatch_drops: u64,

    pub tick_duration_stats: RunningStats,

    /// Temperature statistics per source
    pub value_stats: BTreeMap<String, RunningStats>,

    /// Failed readings per source
    pub failure_counts: BTreeMap<String, u64>,
}

impl TickMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one tick into the statistics
    pub fn update(&mut self, snapshot: &Snapshot, tick_duration_ms: f64, dispatch_drops: usize) {
        self.total_ticks += 1;
        self.dispatch_drops += dispatch_drops as u64;
        self.tick_duration_stats.push(tick_duration_ms);

        if snapshot.is_empty() {
            self.empty_ticks += 1;
        } else if snapshot.is_partial() {
            self.partial_ticks += 1;
        }

        for (source_id, reading) in snapshot.readings() {
            self.value_stats
                .entry(source_id.to_string())
                .or_default()
                .push(reading.value_c());
        }
        for source_id in snapshot.failed() {
            *self.failure_counts.entry(source_id.to_string()).or_insert(0) += 1;
        }
    }

    /// Build the summary report
    pub fn summary(&self) -> MetricsSummary {
        let rate = |count: u64| {
            if self.total_ticks > 0 {
                count as f64 / self.total_ticks as f64 * 100.0
            } else {
                0.0
            }
        };

        MetricsSummary {
            total_ticks: self.total_ticks,
            partial_ticks: self.partial_ticks,
            empty_ticks: self.empty_ticks,
            dispatch_drops: self.dispatch_drops,
            partial_rate: rate(self.partial_ticks),
            empty_rate: rate(self.empty_ticks),
            tick_duration_ms: StatsSummary::from(&self.tick_duration_stats),
            source_values: self
                .value_stats
                .iter()
                .map(|(id, stats)| (id.clone(), StatsSummary::from(stats)))
                .collect(),
            source_failure_counts: self.failure_counts.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub partial_ticks: u64,
    pub empty_ticks: u64,
    pub dispatch_drops: u64,
    pub partial_rate: f64,
    pub empty_rate: f64,
    pub tick_duration_ms: StatsSummary,
    pub source_values: BTreeMap<String, StatsSummary>,
    pub source_failure_counts: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Tick Metrics Summary ===")?;
        writeln!(f, "Total ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Partial snapshots: {} ({:.2}%)",
            self.partial_ticks, self.partial_rate
        )?;
        writeln!(
            f,
            "Empty snapshots: {} ({:.2}%)",
            self.empty_ticks, self.empty_rate
        )?;
        writeln!(f, "Dropped at sink queues: {}", self.dispatch_drops)?;
        writeln!(f, "Tick duration (ms): {}", self.tick_duration_ms)?;

        if !self.source_values.is_empty() {
            writeln!(f, "Temperatures (C):")?;
            for (source, stats) in &self.source_values {
                writeln!(f, "  {}: {}", source, stats)?;
            }
        }

        if !self.source_failure_counts.is_empty() {
            writeln!(f, "Failed readings:")?;
            for (source, count) in &self.source_failure_counts {
                writeln!(f, "  {}: {}", source, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use contracts::SourceId;

    fn snapshot(tick: u64, values: &[(&str, f64)], failed: &[&str]) -> Snapshot {
        Snapshot::new(
            tick,
            DateTime::from_timestamp(tick as i64, 0).unwrap(),
            values.iter().map(|(id, v)| (SourceId::from(*id), *v)),
            failed.iter().map(|id| SourceId::from(*id)),
        )
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = TickMetricsAggregator::new();

        aggregator.update(&snapshot(1, &[("pit", 110.0), ("meat", 56.7)], &[]), 1.0, 0);
        aggregator.update(&snapshot(2, &[("pit", 112.0)], &["meat"]), 2.0, 1);
        aggregator.update(&snapshot(3, &[], &["pit", "meat"]), 3.0, 0);

        assert_eq!(aggregator.total_ticks, 3);
        assert_eq!(aggregator.partial_ticks, 1);
        assert_eq!(aggregator.empty_ticks, 1);
        assert_eq!(aggregator.dispatch_drops, 1);
        assert_eq!(aggregator.failure_counts.get("meat"), Some(&2));
        assert_eq!(aggregator.value_stats["pit"].count(), 2);
        assert!((aggregator.value_stats["pit"].mean() - 111.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = TickMetricsAggregator::new();
        aggregator.update(&snapshot(1, &[("pit", 110.0)], &["meat"]), 1.5, 0);

        let output = aggregator.summary().to_string();
        assert!(output.contains("Total ticks: 1"));
        assert!(output.contains("Partial snapshots: 1 (100.00%)"));
        assert!(output.contains("pit: min=110.0"));
        assert!(output.contains("meat: 1"));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_snapshot_metrics(&snapshot(1, &[("pit", 110.0)], &[]), 0.5);
        record_source_error("fixed");
        record_sink_state("log", 0, 1, 0, 0);
        record_history_len(1, 10);
    }
}
