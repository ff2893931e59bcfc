//! ReadingSource trait - probe data source abstraction
//!
//! Decouples the controller from concrete probe implementations. Simulated,
//! fixed-value and hardware-backed readers all implement the same trait.

use std::collections::{BTreeSet, HashMap};

use crate::{ContractError, SourceId};

/// Result of one `sample()` call
///
/// Failure is per probe: a probe that could not be read is listed in `failed`
/// and the other probes are still reported in `values`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleOutcome {
    /// Successfully read probes, degrees Celsius
    pub values: HashMap<SourceId, f64>,

    /// Probes that could not be read this time
    pub failed: BTreeSet<SourceId>,
}

impl SampleOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful read
    pub fn record(&mut self, source_id: impl Into<SourceId>, value_c: f64) {
        let source_id = source_id.into();
        self.failed.remove(&source_id);
        self.values.insert(source_id, value_c);
    }

    /// Record a failed read
    pub fn record_failure(&mut self, source_id: impl Into<SourceId>) {
        let source_id = source_id.into();
        self.values.remove(&source_id);
        self.failed.insert(source_id);
    }

    /// Builder-style [`record`](Self::record)
    pub fn with(mut self, source_id: impl Into<SourceId>, value_c: f64) -> Self {
        self.record(source_id, value_c);
        self
    }

    /// Builder-style [`record_failure`](Self::record_failure)
    pub fn with_failure(mut self, source_id: impl Into<SourceId>) -> Self {
        self.record_failure(source_id);
        self
    }
}

/// Probe reading source
///
/// Called once per tick by the controller. Sampling is expected to be fast and
/// bounded; implementations must not block on a single hung probe.
///
/// # Errors
/// `sample` returns `Err` only when nothing at all could be read (e.g. the bus
/// is gone). The controller treats that as a total outage for the tick.
///
/// # Example
///
/// ```ignore
/// let mut source: Box<dyn ReadingSource> = ingestion::create_source(&blueprint)?;
/// let outcome = source.sample()?;
/// for (id, value) in &outcome.values {
///     println!("{id}: {value:.1}");
/// }
/// ```
pub trait ReadingSource: Send {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Probe ids this source is expected to report
    fn source_ids(&self) -> Vec<SourceId>;

    /// Read every probe once
    fn sample(&mut self) -> Result<SampleOutcome, ContractError>;
}
