//! Scripted source
//!
//! Constant per-probe values with failures, value overrides and whole-sample
//! errors pinned to specific calls. Used to drive deterministic scenarios.
//! Calls are numbered from 1.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use contracts::{ContractError, ReadingSource, SampleOutcome, SourceId};

/// Deterministic source for tests and demos
#[derive(Debug, Default)]
pub struct ScriptedSource {
    values: BTreeMap<SourceId, f64>,
    always_failing: BTreeSet<SourceId>,
    failures: HashMap<u64, BTreeSet<SourceId>>,
    overrides: HashMap<u64, Vec<(SourceId, f64)>>,
    errors: HashSet<u64>,
    calls: Arc<AtomicU64>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe reports `value` on every call unless scripted otherwise
    pub fn with_value(mut self, id: impl Into<SourceId>, value: f64) -> Self {
        self.values.insert(id.into(), value);
        self
    }

    /// Probe fails on every call
    pub fn failing_always(mut self, id: impl Into<SourceId>) -> Self {
        self.always_failing.insert(id.into());
        self
    }

    /// Probe fails on call `call`
    pub fn fail_on(mut self, call: u64, id: impl Into<SourceId>) -> Self {
        self.failures.entry(call).or_default().insert(id.into());
        self
    }

    /// Probe reports `value` on call `call` (may be NaN/Inf)
    pub fn value_on(mut self, call: u64, id: impl Into<SourceId>, value: f64) -> Self {
        self.overrides
            .entry(call)
            .or_default()
            .push((id.into(), value));
        self
    }

    /// Whole sample errors on call `call`
    pub fn error_on(mut self, call: u64) -> Self {
        self.errors.insert(call);
        self
    }

    /// Shared counter of `sample()` calls, readable after the source is moved
    pub fn call_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.calls)
    }
}

impl ReadingSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn source_ids(&self) -> Vec<SourceId> {
        self.values
            .keys()
            .chain(self.always_failing.iter())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn sample(&mut self) -> Result<SampleOutcome, ContractError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if self.errors.contains(&call) {
            return Err(ContractError::source_read(
                self.name(),
                format!("scripted outage on call {call}"),
            ));
        }

        let mut outcome = SampleOutcome::new();
        for (id, value) in &self.values {
            outcome.record(id.clone(), *value);
        }
        if let Some(overrides) = self.overrides.get(&call) {
            for (id, value) in overrides {
                outcome.record(id.clone(), *value);
            }
        }
        for id in &self.always_failing {
            outcome.record_failure(id.clone());
        }
        if let Some(failing) = self.failures.get(&call) {
            for id in failing {
                outcome.record_failure(id.clone());
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_applies_per_call() {
        let mut source = ScriptedSource::new()
            .with_value("pit", 110.0)
            .with_value("meat", 56.7)
            .fail_on(2, "meat")
            .value_on(3, "pit", f64::NAN)
            .error_on(4);

        let first = source.sample().unwrap();
        assert_eq!(first.values.len(), 2);

        let second = source.sample().unwrap();
        assert!(second.failed.contains("meat"));
        assert_eq!(second.values.get("pit"), Some(&110.0));

        let third = source.sample().unwrap();
        assert!(third.values["pit"].is_nan());

        assert!(source.sample().is_err());
        assert_eq!(source.call_counter().load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_source_ids_include_failing_probes() {
        let source = ScriptedSource::new()
            .with_value("pit", 110.0)
            .failing_always("meat");
        assert_eq!(
            source.source_ids(),
            vec![SourceId::from("meat"), SourceId::from("pit")]
        );
    }
}
