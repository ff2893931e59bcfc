//! # Integration Tests
//!
//! End-to-end scenarios for the sampling pipeline.
//!
//! - scripted source -> controller -> history + sinks
//! - failure isolation between probes and between sinks
//! - shutdown and scheduling behavior under tokio's paused clock

#[cfg(test)]
mod support;

#[cfg(test)]
mod e2e_tests;

#[cfg(test)]
mod property_tests;

