//! Reading / Snapshot - the per-tick data model
//!
//! A [`Snapshot`] is everything captured at one sampling instant. The only way
//! to put a [`Reading`] into a snapshot is through the snapshot's own
//! constructor, which stamps it with the snapshot timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::SourceId;

/// Wall-clock instant used for every timestamp in the pipeline
pub type Timestamp = DateTime<Utc>;

/// One probe's measurement at one sampling instant (degrees Celsius)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    timestamp: Timestamp,
    source_id: SourceId,
    value_c: f64,
}

impl Reading {
    /// Sampling instant shared with the owning snapshot
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Probe that produced the value
    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    /// Temperature in degrees Celsius
    pub fn value_c(&self) -> f64 {
        self.value_c
    }
}

/// All readings captured at one sampling instant, keyed by probe
///
/// May be partial (some probes failed) or empty (all probes failed). Both are
/// valid and are delivered like any other snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    tick: u64,
    timestamp: Timestamp,
    readings: BTreeMap<SourceId, Reading>,
    failed: BTreeSet<SourceId>,
}

impl Snapshot {
    /// Build a snapshot from already-validated values.
    ///
    /// Every reading receives `timestamp`. A probe listed in both `values` and
    /// `failed` is treated as failed.
    pub fn new(
        tick: u64,
        timestamp: Timestamp,
        values: impl IntoIterator<Item = (SourceId, f64)>,
        failed: impl IntoIterator<Item = SourceId>,
    ) -> Self {
        let failed: BTreeSet<SourceId> = failed.into_iter().collect();
        let readings = values
            .into_iter()
            .filter(|(id, _)| !failed.contains(id))
            .map(|(source_id, value_c)| {
                let reading = Reading {
                    timestamp,
                    source_id: source_id.clone(),
                    value_c,
                };
                (source_id, reading)
            })
            .collect();

        Self {
            tick,
            timestamp,
            readings,
            failed,
        }
    }

    /// Snapshot with no readings, used when every probe failed
    pub fn empty(
        tick: u64,
        timestamp: Timestamp,
        failed: impl IntoIterator<Item = SourceId>,
    ) -> Self {
        Self::new(tick, timestamp, std::iter::empty(), failed)
    }

    /// Tick number that produced this snapshot
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn readings(&self) -> &BTreeMap<SourceId, Reading> {
        &self.readings
    }

    /// Probes that did not produce a valid reading this tick
    pub fn failed(&self) -> &BTreeSet<SourceId> {
        &self.failed
    }

    pub fn get(&self, source_id: &str) -> Option<&Reading> {
        self.readings.get(source_id)
    }

    /// Value for one probe, if it reported this tick
    pub fn value(&self, source_id: &str) -> Option<f64> {
        self.get(source_id).map(Reading::value_c)
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.readings.contains_key(source_id)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// True when every probe failed (total outage)
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// True when at least one probe failed
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}
