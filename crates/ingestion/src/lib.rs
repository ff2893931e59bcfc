//! # Ingestion
//!
//! Reading source implementations.
//!
//! Responsibilities:
//! - Simulated cook source (no hardware needed)
//! - Fixed-value source
//! - Scripted source for deterministic scenarios
//! - Build the configured source from a `PitBlueprint`
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::create_source;
//!
//! let mut source = create_source(&blueprint)?;
//! let outcome = source.sample()?;
//! ```
//!
//! ## Scripted Testing
//!
//! ```ignore
//! use ingestion::ScriptedSource;
//!
//! let source = ScriptedSource::new()
//!     .with_value("pit", 110.0)
//!     .with_value("meat", 56.7)
//!     .fail_on(2, "meat");
//! ```

mod error;
mod factory;
mod fixed;
mod scripted;
mod simulated;

// Re-exports
pub use contracts::{ReadingSource, SampleOutcome};
pub use error::{IngestionError, Result};
pub use factory::create_source;
pub use fixed::{FixedSource, DEFAULT_FIXED_VALUE};
pub use scripted::ScriptedSource;
pub use simulated::{food_curve, pit_curve, SimulatedConfig, SimulatedSource};
