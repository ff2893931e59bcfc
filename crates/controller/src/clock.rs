//! Runtime clock

use chrono::{TimeDelta, Utc};
use contracts::{Clock, Timestamp};
use tokio::time::Instant;

/// Wall-clock anchor advanced by the tokio monotonic clock
///
/// Timestamps never go backwards even if the system clock is adjusted, and
/// follow tokio's paused time in tests.
#[derive(Debug, Clone)]
pub struct TokioClock {
    anchor_wall: Timestamp,
    anchor: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Anchor the clock at a fixed wall-clock time
    pub fn starting_at(anchor_wall: Timestamp) -> Self {
        Self {
            anchor_wall,
            anchor: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        let elapsed = TimeDelta::from_std(self.anchor.elapsed()).unwrap_or(TimeDelta::MAX);
        self.anchor_wall
            .checked_add_signed(elapsed)
            .unwrap_or(self.anchor_wall)
    }
}
