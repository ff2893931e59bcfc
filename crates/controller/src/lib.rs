//! # Controller
//!
//! The tick loop of the pit companion.
//!
//! Each tick:
//! - reads the clock once and samples the source
//! - assembles a [`contracts::Snapshot`] (unknown sources dropped, missing ones failed)
//! - appends it to the history
//! - enqueues it to every sink without waiting for delivery
//!
//! Shutdown is observed between ticks only; on exit the sink queues are drained.
//!
//! ## Usage
//!
//! ```ignore
//! use controller::{Controller, ControllerConfig, IntervalScheduler, TokioClock};
//!
//! let controller = Controller::new(
//!     source,
//!     Arc::new(TokioClock::new()),
//!     IntervalScheduler::new(Duration::from_secs(5)),
//!     HistoryBuffer::new(720)?,
//!     dispatcher,
//!     ControllerConfig::default(),
//! );
//! let shutdown = async {
//!     let _ = tokio::signal::ctrl_c().await;
//! };
//! let stats = controller.run(shutdown).await?;
//! ```

mod assembler;
mod clock;
mod controller;
mod error;
mod scheduler;

pub use assembler::SnapshotAssembler;
pub use clock::TokioClock;
pub use controller::{Controller, ControllerConfig, ControllerStats, TickReport, TickState};
pub use error::ControllerError;
pub use scheduler::{IntervalScheduler, LocalScheduler, ManualScheduler, Scheduler, TickDriver};
