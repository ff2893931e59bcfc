//! # Contracts
//!
//! Shared interface contracts for the pit companion pipeline.
//! Every other crate depends on this one; it depends on none of them.
//!
//! ## Time Model
//! - Snapshot timestamps are UTC wall-clock instants (`chrono::DateTime<Utc>`)
//! - The timestamp is taken once per tick, from an injected [`Clock`]
//! - `tick` numbers are monotonically increasing and used for ordering/diagnostics

mod blueprint;
mod clock;
mod error;
mod sink;
mod snapshot;
mod source;
mod source_id;

pub use blueprint::*;
pub use clock::{Clock, ManualClock};
pub use error::*;
pub use sink::*;
pub use snapshot::{Reading, Snapshot, Timestamp};
pub use source::{ReadingSource, SampleOutcome};
pub use source_id::SourceId;
