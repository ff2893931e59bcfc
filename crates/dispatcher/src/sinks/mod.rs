//! Sink implementations
//!
//! Contains LogSink, FileSink, NotificationSink and DisabledSink.

mod disabled;
mod file;
mod log;
mod notification;

pub use self::disabled::DisabledSink;
pub use self::file::{FileFormat, FileSink, FileSinkConfig, CSV_HEADER};
pub use self::log::LogSink;
pub use self::notification::{
    format_payload, LocalPublisher, NotificationConfig, NotificationSink, Publisher, UdpPublisher,
    DEFAULT_NAMESPACE,
};
