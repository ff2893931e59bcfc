//! # Dispatcher
//!
//! Snapshot fan-out.
//!
//! Responsibilities:
//! - Enqueue each snapshot to every sink without waiting
//! - Fan-out to multiple sinks, one queue and worker each
//! - Isolate slow or failing sinks from the sampling loop

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, Snapshot};
pub use dispatcher::{
    create_dispatcher, create_sink_handle, DEFAULT_DRAIN_TIMEOUT, DispatchReport, Dispatcher, DispatcherBuilder,
    DispatcherConfig,
};
pub use error::DispatcherError;
pub use handle::{ClosingSink, SinkHandle};
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{
    DisabledSink, FileFormat, FileSink, FileSinkConfig, LogSink, NotificationConfig,
    NotificationSink, Publisher, UdpPublisher,
};
