//! # History
//!
//! Bounded in-memory history of snapshots.
//!
//! Responsibilities:
//! - Retain the last N snapshots, oldest evicted first
//! - Reject out-of-order appends
//! - Serve latest snapshot and per-source series to concurrent readers
//! - Classify the cook status from a snapshot
//!
//! ## Usage Example
//!
//! ```ignore
//! use history::HistoryBuffer;
//!
//! let mut history = HistoryBuffer::new(blueprint.history_capacity())?;
//! let reader = history.reader();
//!
//! history.append(snapshot)?;
//! for (ts, value) in &reader.series("meat") {
//!     println!("{ts} {value}");
//! }
//! ```

mod buffer;
mod error;
mod series;
pub mod status;

pub use buffer::{HistoryBuffer, HistoryReader};
pub use error::{HistoryError, Result};
pub use series::{Series, SeriesIter};
pub use status::{classify, CookStatus, StatusLevel};
