//! PitBlueprint - Config Loader output
//!
//! Describes the complete process configuration: sampling cadence, probes,
//! reading source, output routing and status thresholds.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use validator::Validate;

use crate::SourceId;

/// Retention window the default history capacity is sized for (six hours)
pub const DEFAULT_HISTORY_WINDOW_SECS: u64 = 6 * 60 * 60;

/// Largest accepted `app.history_capacity` (a week of one-second ticks)
pub const MAX_HISTORY_CAPACITY: usize = 7 * 24 * 60 * 60;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete process configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PitBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Sampling loop settings
    #[serde(default)]
    #[validate(nested)]
    pub app: AppConfig,

    /// Probe channels, one per source id
    #[validate(nested)]
    pub probes: Vec<ProbeConfig>,

    /// Which reading source drives the probes
    #[serde(default)]
    pub source: SourceConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,

    /// Cook status thresholds (display only, not used by the pipeline)
    #[serde(default)]
    pub status: StatusThresholds,
}

/// Sampling loop settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Seconds between ticks
    #[serde(default = "default_poll_interval")]
    #[validate(range(min = 1, max = 86400))]
    pub poll_interval_seconds: u64,

    /// Snapshots kept in memory; defaults to six hours of ticks
    #[serde(default)]
    #[validate(range(min = 1, max = MAX_HISTORY_CAPACITY))]
    pub history_capacity: Option<usize>,

    /// Log filter (`info`, `pit_companion=debug,info`, ...) used when neither
    /// RUST_LOG nor -v/-q is given
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            history_capacity: None,
            log_level: default_log_level(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Probe channel configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProbeConfig {
    /// Unique source id (also the notification key suffix)
    #[validate(length(min = 1, max = 64))]
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Hardware channel index
    #[serde(default)]
    pub channel: u8,

    /// Probe hardware type
    #[serde(default, alias = "type")]
    pub probe_type: ProbeType,

    /// What the probe measures
    #[serde(default)]
    pub role: ProbeRole,
}

impl ProbeConfig {
    /// Name for display, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Probe hardware type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeType {
    #[default]
    Thermocouple,
    Thermistor,
    Rtd,
}

/// What a probe measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeRole {
    /// Cooking chamber temperature
    Pit,
    /// Food core temperature
    #[default]
    Food,
}

/// Reading source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source type
    #[serde(default)]
    pub source_type: SourceType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// Reading source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Simulated cook (pit oscillates, food rises)
    #[default]
    Simulated,
    /// Constant value per probe
    Fixed,
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Disabled sinks are kept in the topology as no-ops
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_enabled() -> bool {
    true
}

fn default_queue_capacity() -> usize {
    16
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// Append-only file (persistence)
    File,
    /// Pub/sub notification (best effort)
    Notification,
}

/// Thresholds for the cook status label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    #[serde(default = "default_pit_target")]
    pub pit_target: f64,

    #[serde(default = "default_meat_done")]
    pub meat_done: f64,

    /// Above target + warn_margin the pit is "warm"
    #[serde(default = "default_warn_margin")]
    pub warn_margin: f64,

    /// Above target + alert_margin the pit is "too hot"
    #[serde(default = "default_alert_margin")]
    pub alert_margin: f64,

    /// Below target - cool_margin the pit is "too cool"
    #[serde(default = "default_alert_margin")]
    pub cool_margin: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            pit_target: default_pit_target(),
            meat_done: default_meat_done(),
            warn_margin: default_warn_margin(),
            alert_margin: default_alert_margin(),
            cool_margin: default_alert_margin(),
        }
    }
}

fn default_pit_target() -> f64 {
    110.0
}

fn default_meat_done() -> f64 {
    95.0
}

fn default_warn_margin() -> f64 {
    8.0
}

fn default_alert_margin() -> f64 {
    15.0
}

impl PitBlueprint {
    /// Tick interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.app.poll_interval_seconds)
    }

    /// History capacity, explicit or sized for [`DEFAULT_HISTORY_WINDOW_SECS`]
    pub fn history_capacity(&self) -> usize {
        self.app.history_capacity.unwrap_or_else(|| {
            let interval = self.app.poll_interval_seconds.max(1);
            DEFAULT_HISTORY_WINDOW_SECS.div_ceil(interval) as usize
        })
    }

    /// Configured source ids, in declaration order
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.probes.iter().map(|p| SourceId::from(p.id.as_str())).collect()
    }

    pub fn probe(&self, id: &str) -> Option<&ProbeConfig> {
        self.probes.iter().find(|p| p.id == id)
    }

    /// First probe with the given role
    pub fn first_probe_with_role(&self, role: ProbeRole) -> Option<&ProbeConfig> {
        self.probes.iter().find(|p| p.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blueprint(interval: u64, capacity: Option<usize>) -> PitBlueprint {
        PitBlueprint {
            version: ConfigVersion::V1,
            app: AppConfig {
                poll_interval_seconds: interval,
                history_capacity: capacity,
                log_level: "info".into(),
            },
            probes: vec![ProbeConfig {
                id: "pit".into(),
                name: String::new(),
                channel: 0,
                probe_type: ProbeType::Thermocouple,
                role: ProbeRole::Pit,
            }],
            source: SourceConfig::default(),
            sinks: vec![],
            status: StatusThresholds::default(),
        }
    }

    #[test]
    fn test_default_history_capacity_covers_six_hours() {
        assert_eq!(blueprint(5, None).history_capacity(), 4320);
        assert_eq!(blueprint(7, None).history_capacity(), 3086);
        assert_eq!(blueprint(5, Some(10)).history_capacity(), 10);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let bp = blueprint(5, None);
        assert_eq!(bp.probes[0].display_name(), "pit");
        assert_eq!(bp.first_probe_with_role(ProbeRole::Pit).unwrap().id, "pit");
        assert!(bp.first_probe_with_role(ProbeRole::Food).is_none());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let bp = blueprint(0, None);
        assert!(bp.validate().is_err());
        assert!(blueprint(1, None).validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_history_capacity() {
        assert!(blueprint(1, Some(MAX_HISTORY_CAPACITY)).validate().is_ok());
        assert!(blueprint(1, Some(MAX_HISTORY_CAPACITY + 1)).validate().is_err());
        assert!(blueprint(1, Some(usize::MAX)).validate().is_err());
        assert!(blueprint(1, Some(0)).validate().is_err());
    }
}
