//! DisabledSink - explicit no-op

use contracts::{ContractError, DataSink, Snapshot};
use tracing::{debug, info};

/// Sink that accepts and discards every snapshot
///
/// Stands in for sinks turned off in config or whose endpoint was unreachable
/// at startup, so the topology stays the same either way.
pub struct DisabledSink {
    name: String,
    reason: String,
    discarded: u64,
}

impl DisabledSink {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let name = name.into();
        let reason = reason.into();
        info!(sink = %name, reason = %reason, "Sink disabled");
        Self {
            name,
            reason,
            discarded: 0,
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl DataSink for DisabledSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&mut self, _snapshot: &Snapshot) -> Result<(), ContractError> {
        self.discarded += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, discarded = self.discarded, "DisabledSink closed");
        Ok(())
    }
}
