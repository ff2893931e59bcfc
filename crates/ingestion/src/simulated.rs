//! Simulated cook source
//!
//! Lets the whole pipeline run without probes attached:
//! - pit probes swing slowly around the target with a little noise
//! - food probes follow a cooking curve that flattens towards the done temp

use std::collections::HashMap;
use std::time::{Duration, Instant};

use contracts::{ContractError, ProbeRole, ReadingSource, SampleOutcome, SourceId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::error::{IngestionError, Result};

/// Simulated source configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedConfig {
    /// Pit temperature the oscillation is centred on
    pub pit_target: f64,

    /// Pit oscillation amplitude
    pub pit_swing: f64,

    /// Food temperature at start
    pub meat_start: f64,

    /// Food temperature the curve approaches
    pub meat_done: f64,

    /// Probability that a single probe read fails
    pub failure_rate: f64,

    /// RNG seed (None = seeded from the OS)
    pub seed: Option<u64>,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            pit_target: 110.0,
            pit_swing: 5.0,
            meat_start: 8.0,
            meat_done: 95.0,
            failure_rate: 0.0,
            seed: None,
        }
    }
}

impl SimulatedConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        for (key, value) in params {
            match key.as_str() {
                "pit_target" => config.pit_target = parse_f64(key, value)?,
                "pit_swing" => config.pit_swing = parse_f64(key, value)?,
                "meat_start" => config.meat_start = parse_f64(key, value)?,
                "meat_done" => config.meat_done = parse_f64(key, value)?,
                "failure_rate" => {
                    let rate = parse_f64(key, value)?;
                    if !(0.0..=1.0).contains(&rate) {
                        return Err(IngestionError::invalid_param(
                            key,
                            format!("must be within [0, 1], got {rate}"),
                        ));
                    }
                    config.failure_rate = rate;
                }
                "seed" => {
                    let seed = value
                        .trim()
                        .parse()
                        .map_err(|e| IngestionError::invalid_param(key, format!("{e}")))?;
                    config.seed = Some(seed);
                }
                other => {
                    debug!(param = %other, "ignoring unknown simulated source parameter");
                }
            }
        }

        Ok(config)
    }
}

pub(crate) fn parse_f64(key: &str, value: &str) -> Result<f64> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|e| IngestionError::invalid_param(key, format!("invalid number '{value}': {e}")))?;
    if !parsed.is_finite() {
        return Err(IngestionError::invalid_param(key, "value must be finite"));
    }
    Ok(parsed)
}

/// Pit temperature after `minutes` of cooking, before noise
pub fn pit_curve(config: &SimulatedConfig, minutes: f64) -> f64 {
    config.pit_target + config.pit_swing * (minutes / 5.0).sin()
}

/// Food temperature after `minutes` of cooking, before noise
///
/// Rises quickly at first and approaches `meat_done` over roughly an hour.
pub fn food_curve(config: &SimulatedConfig, minutes: f64) -> f64 {
    let progress = 1.0 - (-minutes / 60.0).exp();
    config.meat_start + (config.meat_done - config.meat_start) * progress
}

/// Simulated probe source
pub struct SimulatedSource {
    probes: Vec<(SourceId, ProbeRole)>,
    config: SimulatedConfig,
    rng: StdRng,
    started: Instant,
}

impl SimulatedSource {
    /// Create a new simulated source for the given probes
    pub fn new(probes: Vec<(SourceId, ProbeRole)>, config: SimulatedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        debug!(
            probes = probes.len(),
            pit_target = config.pit_target,
            meat_done = config.meat_done,
            failure_rate = config.failure_rate,
            "simulated source created"
        );

        Self {
            probes,
            config,
            rng,
            started: Instant::now(),
        }
    }

    /// Sample as if `elapsed` had passed since the cook started
    pub fn sample_at(&mut self, elapsed: Duration) -> SampleOutcome {
        let minutes = elapsed.as_secs_f64() / 60.0;
        let mut outcome = SampleOutcome::new();

        for (id, role) in &self.probes {
            if self.config.failure_rate > 0.0
                && self.rng.random_bool(self.config.failure_rate.min(1.0))
            {
                trace!(source_id = %id, "simulated probe failure");
                outcome.record_failure(id.clone());
                continue;
            }

            let value = match role {
                ProbeRole::Pit => {
                    pit_curve(&self.config, minutes) + self.rng.random_range(-0.7..=0.7)
                }
                ProbeRole::Food => {
                    let noisy = food_curve(&self.config, minutes)
                        + self.rng.random_range(-0.4..=0.4);
                    let (low, high) = food_bounds(&self.config);
                    noisy.clamp(low, high)
                }
            };
            outcome.record(id.clone(), value);
        }

        outcome
    }
}

fn food_bounds(config: &SimulatedConfig) -> (f64, f64) {
    let low = config.meat_start.min(config.meat_done + 5.0);
    let high = config.meat_start.max(config.meat_done + 5.0);
    (low, high)
}

impl ReadingSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulated"
    }

    fn source_ids(&self) -> Vec<SourceId> {
        self.probes.iter().map(|(id, _)| id.clone()).collect()
    }

    fn sample(&mut self) -> std::result::Result<SampleOutcome, ContractError> {
        let elapsed = self.started.elapsed();
        Ok(self.sample_at(elapsed))
    }
}
