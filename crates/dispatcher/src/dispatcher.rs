//! Dispatcher - fan-out of snapshots to sinks

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use contracts::{SinkConfig, SinkType, Snapshot};

use crate::error::DispatcherError;
use crate::handle::{ClosingSink, SinkHandle};
use crate::metrics::MetricsSnapshot;
use crate::sinks::{DisabledSink, FileSink, LogSink, NotificationConfig, NotificationSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Sink configurations
    pub sinks: Vec<SinkConfig>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    extra: Vec<SinkHandle>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            extra: Vec::new(),
        }
    }

    /// Add an already running sink next to the configured ones
    pub fn with_handle(mut self, handle: SinkHandle) -> Self {
        self.extra.push(handle);
        self
    }

    /// Build and start the dispatcher
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let mut handles = Self::initialize_handles(&self.config).await?;
        handles.extend(self.extra);
        Ok(Dispatcher::with_handles(handles))
    }

    #[instrument(
        name = "dispatcher_initialize_handles",
        skip(config),
        fields(sink_count = config.sinks.len())
    )]
    async fn initialize_handles(
        config: &DispatcherConfig,
    ) -> Result<Vec<SinkHandle>, DispatcherError> {
        let mut handles = Vec::with_capacity(config.sinks.len());
        for sink_config in &config.sinks {
            handles.push(create_sink_handle(sink_config).await?);
        }
        Ok(handles)
    }
}

/// Create a SinkHandle from configuration
///
/// Disabled sinks and notification endpoints that cannot be reached become a
/// [`DisabledSink`]; invalid parameters are an error.
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    let capacity = config.queue_capacity;

    if !config.enabled {
        let sink = DisabledSink::new(&config.name, "disabled in config");
        return Ok(SinkHandle::spawn(sink, capacity));
    }

    match config.sink_type {
        SinkType::Log => Ok(SinkHandle::spawn(LogSink::new(&config.name), capacity)),
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)?;
            Ok(SinkHandle::spawn(sink, capacity))
        }
        SinkType::Notification => {
            let notification = NotificationConfig::from_params(&config.name, &config.params)?;
            let addr = notification.addr.clone();
            match NotificationSink::connect(&config.name, notification).await {
                Ok(sink) => Ok(SinkHandle::spawn(sink, capacity)),
                Err(e) => {
                    warn!(
                        sink = %config.name,
                        addr = %addr,
                        error = %e,
                        "Notification endpoint unavailable, continuing without it"
                    );
                    let sink = DisabledSink::new(&config.name, e.to_string());
                    Ok(SinkHandle::spawn(sink, capacity))
                }
            }
        }
    }
}

/// Outcome of enqueueing one snapshot to every sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Sinks that accepted the snapshot
    pub queued: usize,
    /// Sinks whose queue was full or closed
    pub dropped: usize,
}

/// Upper bound on draining sink queues at shutdown
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Fans snapshots out to sinks, each behind its own queue and worker
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles
    pub fn with_handles(handles: Vec<SinkHandle>) -> Self {
        info!(sinks = handles.len(), "Dispatcher started");
        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.handles.iter().map(SinkHandle::name).collect()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Enqueue a snapshot to every sink without waiting for delivery
    pub fn dispatch(&self, snapshot: Arc<Snapshot>) -> DispatchReport {
        let mut report = DispatchReport::default();
        for handle in &self.handles {
            if handle.try_send(Arc::clone(&snapshot)) {
                report.queued += 1;
            } else {
                report.dropped += 1;
            }
        }
        report
    }

    /// Drain every sink queue, then flush and close the sinks
    ///
    /// Bounded by [`DEFAULT_DRAIN_TIMEOUT`]. Returns the final metrics of
    /// each sink.
    pub async fn shutdown(self) -> Vec<(String, MetricsSnapshot)> {
        self.shutdown_within(DEFAULT_DRAIN_TIMEOUT).await
    }

    /// Drain every sink queue for at most `limit`
    ///
    /// All queues are closed up front so the workers drain side by side.
    /// Workers still running when `limit` expires are aborted and their
    /// remaining snapshots are lost.
    #[instrument(
        name = "dispatcher_shutdown",
        skip(self),
        fields(sinks = self.handles.len(), limit_ms = limit.as_millis() as u64)
    )]
    pub async fn shutdown_within(self, limit: Duration) -> Vec<(String, MetricsSnapshot)> {
        let mut closing: Vec<ClosingSink> =
            self.handles.into_iter().map(SinkHandle::close).collect();

        let drained = tokio::time::timeout(limit, async {
            for sink in closing.iter_mut() {
                sink.join().await;
            }
        })
        .await;

        if drained.is_err() {
            for sink in closing.iter().filter(|s| !s.is_finished()) {
                warn!(
                    sink = sink.name(),
                    queued = sink.metrics().queue_len(),
                    delivered = sink.metrics().delivered_count(),
                    "Sink drain timed out, abandoning queued snapshots"
                );
                sink.abort();
            }
        }

        info!(timed_out = drained.is_err(), "Dispatcher shutdown complete");
        closing
            .iter()
            .map(|s| (s.name().to_string(), s.metrics().snapshot()))
            .collect()
    }
}

/// Convenience function to create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs))]
pub async fn create_dispatcher(sink_configs: Vec<SinkConfig>) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config).build().await
}
