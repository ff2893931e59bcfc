//! Periodic cook status reporting from the history.

use std::time::Duration;

use contracts::{PitBlueprint, ProbeRole, StatusThresholds};
use history::{CookStatus, HistoryReader, StatusLevel};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// What the reporter classifies and against which thresholds
#[derive(Debug, Clone)]
pub struct StatusProbes {
    thresholds: StatusThresholds,
    pit_id: Option<String>,
    meat_id: Option<String>,
}

impl StatusProbes {
    /// First pit-role and first food-role probe of the configuration
    pub fn from_blueprint(blueprint: &PitBlueprint) -> Self {
        Self {
            thresholds: blueprint.status,
            pit_id: blueprint
                .first_probe_with_role(ProbeRole::Pit)
                .map(|p| p.id.clone()),
            meat_id: blueprint
                .first_probe_with_role(ProbeRole::Food)
                .map(|p| p.id.clone()),
        }
    }

    /// Classify the latest snapshot, None while the history is empty
    pub fn current(&self, reader: &HistoryReader) -> Option<CookStatus> {
        let latest = reader.latest()?;
        Some(history::classify(
            &latest,
            &self.thresholds,
            self.pit_id.as_deref(),
            self.meat_id.as_deref(),
        ))
    }
}

/// Log the cook status every `period` until the task is aborted
pub fn spawn_status_reporter(
    reader: HistoryReader,
    probes: StatusProbes,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(status) = probes.current(&reader) else {
                continue;
            };
            match status.level {
                StatusLevel::Alert => warn!(status = %status, "Cook status"),
                _ => info!(status = %status, "Cook status"),
            }
        }
    })
}
