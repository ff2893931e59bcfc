//! Snapshot assembly.
//!
//! Turns a raw [`SampleOutcome`] into a [`Snapshot`]:
//! - only finite values of configured sources become readings
//! - non-finite values and unreported configured sources count as failed
//! - values for unknown sources are dropped with a warning

use std::collections::{BTreeMap, BTreeSet};

use contracts::{SampleOutcome, Snapshot, SourceId, Timestamp};
use tracing::{debug, warn};

/// Builds snapshots against the configured set of sources
#[derive(Debug, Clone)]
pub struct SnapshotAssembler {
    configured: BTreeSet<SourceId>,
}

impl SnapshotAssembler {
    pub fn new(source_ids: impl IntoIterator<Item = SourceId>) -> Self {
        Self {
            configured: source_ids.into_iter().collect(),
        }
    }

    pub fn configured(&self) -> &BTreeSet<SourceId> {
        &self.configured
    }

    /// Build the snapshot for one tick; every reading gets `timestamp`
    pub fn assemble(&self, tick: u64, timestamp: Timestamp, outcome: SampleOutcome) -> Snapshot {
        let SampleOutcome { values, failed } = outcome;

        let mut valid = BTreeMap::new();
        let mut failures = BTreeSet::new();

        for (source_id, value) in values {
            if !self.configured.contains(&source_id) {
                warn!(tick, source_id = %source_id, "Ignoring reading for unconfigured source");
                continue;
            }
            if !value.is_finite() {
                warn!(tick, source_id = %source_id, value, "Non-finite reading treated as failure");
                failures.insert(source_id);
                continue;
            }
            valid.insert(source_id, value);
        }

        for source_id in failed {
            if self.configured.contains(&source_id) {
                valid.remove(&source_id);
                failures.insert(source_id);
            } else {
                debug!(tick, source_id = %source_id, "Ignoring failure for unconfigured source");
            }
        }

        for source_id in &self.configured {
            if !valid.contains_key(source_id) && !failures.contains(source_id) {
                debug!(tick, source_id = %source_id, "No reading reported");
                failures.insert(source_id.clone());
            }
        }

        Snapshot::new(tick, timestamp, valid, failures)
    }

    /// Empty snapshot for a tick where the whole sample failed
    pub fn outage(&self, tick: u64, timestamp: Timestamp) -> Snapshot {
        Snapshot::empty(tick, timestamp, self.configured.iter().cloned())
    }
}
