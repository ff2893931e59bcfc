//! DataSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, Snapshot};

/// Snapshot output trait
///
/// All sink implementations must implement this trait. The dispatcher never
/// calls `deliver` concurrently on the same sink, and always in tick order.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one snapshot
    ///
    /// # Errors
    /// Returns delivery error (should include context). The dispatcher logs it
    /// and moves on; it is never retried.
    async fn deliver(&mut self, snapshot: &Snapshot) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
