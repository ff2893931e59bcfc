//! Controller error types

use history::HistoryError;
use thiserror::Error;

/// Errors that end the control loop
///
/// Per-tick problems (failed probes, source outages, sink failures) are
/// absorbed by the loop and never surface here.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// History invariant violated while appending
    #[error("history invariant violated at tick {tick}: {source}")]
    History {
        tick: u64,
        #[source]
        source: HistoryError,
    },
}

impl ControllerError {
    pub fn history(tick: u64, source: HistoryError) -> Self {
        Self::History { tick, source }
    }
}
