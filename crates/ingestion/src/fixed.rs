//! Fixed-value source
//!
//! Returns the same temperature for every probe on every tick. Handy for CI
//! and for checking sink wiring end to end.

use std::collections::{BTreeMap, HashMap};

use contracts::{ContractError, ReadingSource, SampleOutcome, SourceId};

use crate::error::Result;
use crate::simulated::parse_f64;

/// Value used for probes without an explicit `value.<id>` parameter
pub const DEFAULT_FIXED_VALUE: f64 = 110.0;

/// Constant-value source
#[derive(Debug, Clone)]
pub struct FixedSource {
    values: BTreeMap<SourceId, f64>,
    order: Vec<SourceId>,
}

impl FixedSource {
    /// Create from explicit values
    pub fn new(values: impl IntoIterator<Item = (SourceId, f64)>) -> Self {
        let mut order = Vec::new();
        let mut map = BTreeMap::new();
        for (id, value) in values {
            if map.insert(id.clone(), value).is_none() {
                order.push(id);
            }
        }
        Self { values: map, order }
    }

    /// Create from params map (`value.<probe_id>` and optional `default`)
    pub fn from_params(ids: &[SourceId], params: &HashMap<String, String>) -> Result<Self> {
        let default = match params.get("default") {
            Some(value) => parse_f64("default", value)?,
            None => DEFAULT_FIXED_VALUE,
        };

        let mut values = Vec::with_capacity(ids.len());
        for id in ids {
            let key = format!("value.{id}");
            let value = match params.get(&key) {
                Some(raw) => parse_f64(&key, raw)?,
                None => default,
            };
            values.push((id.clone(), value));
        }
        Ok(Self::new(values))
    }
}

impl ReadingSource for FixedSource {
    fn name(&self) -> &str {
        "fixed"
    }

    fn source_ids(&self) -> Vec<SourceId> {
        self.order.clone()
    }

    fn sample(&mut self) -> std::result::Result<SampleOutcome, ContractError> {
        let mut outcome = SampleOutcome::new();
        for (id, value) in &self.values {
            outcome.record(id.clone(), *value);
        }
        Ok(outcome)
    }
}
