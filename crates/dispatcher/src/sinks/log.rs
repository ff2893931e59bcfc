//! LogSink - logs snapshot summary via tracing

use contracts::{ContractError, DataSink, Snapshot};
use tracing::{info, instrument};

/// Sink that logs one line per snapshot
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_snapshot_summary(&self, snapshot: &Snapshot) {
        info!(
            sink = %self.name,
            tick = snapshot.tick(),
            timestamp = %snapshot.timestamp(),
            readings = snapshot.len(),
            failed = snapshot.failed().len(),
            values = %format_values(snapshot),
            "Snapshot received"
        );
    }
}

/// `pit=110.0 meat=56.7`, failed probes shown as `id=--`
pub(crate) fn format_values(snapshot: &Snapshot) -> String {
    let readings = snapshot
        .readings()
        .iter()
        .map(|(id, reading)| format!("{id}={:.1}", reading.value_c()));
    let failed = snapshot.failed().iter().map(|id| format!("{id}=--"));
    readings.chain(failed).collect::<Vec<_>>().join(" ")
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_deliver",
        skip(self, snapshot),
        fields(sink = %self.name, tick = snapshot.tick())
    )]
    async fn deliver(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
        self.log_snapshot_summary(snapshot);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
