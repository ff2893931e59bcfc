//! History error types

use contracts::Timestamp;
use thiserror::Error;

/// History buffer error
///
/// Every variant is an invariant violation; callers treat them as fatal.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Appended snapshot is older than the newest retained one
    #[error("out-of-order append: tick {tick} at {timestamp} is older than newest {newest}")]
    OutOfOrder {
        tick: u64,
        timestamp: Timestamp,
        newest: Timestamp,
    },

    /// A thread panicked while holding the history lock
    #[error("history lock poisoned")]
    Poisoned,

    /// Capacity must be at least one snapshot
    #[error("history capacity must be greater than zero")]
    ZeroCapacity,
}

/// History Result alias
pub type Result<T> = std::result::Result<T, HistoryError>;
