//! SinkHandle - manages a sink with isolated queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, instrument, warn};

use contracts::{DataSink, Snapshot};

use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send snapshots to worker
    tx: mpsc::Sender<Arc<Snapshot>>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: DataSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Enqueue a snapshot without waiting
    ///
    /// Returns true if queued, false if the queue was full (snapshot dropped
    /// for this sink only) or the worker is gone.
    pub fn try_send(&self, snapshot: Arc<Snapshot>) -> bool {
        match self.tx.try_send(snapshot) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(s)) => {
                self.metrics.inc_dropped_count();
                warn!(
                    sink = %self.name,
                    tick = s.tick(),
                    "Queue full, snapshot dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(s)) => {
                self.metrics.inc_dropped_count();
                error!(sink = %self.name, tick = s.tick(), "Sink worker closed unexpectedly");
                false
            }
        }
    }

    /// Shutdown the sink worker gracefully
    ///
    /// Queued snapshots are still delivered before the sink is flushed and
    /// closed.
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        let mut closing = self.close();
        closing.join().await;
        debug!(sink = %closing.name, "SinkHandle shutdown complete");
    }

    /// Close the queue and hand back the still running worker
    ///
    /// The worker keeps delivering what is queued, then flushes and closes
    /// the sink.
    pub fn close(self) -> ClosingSink {
        // Dropping the sender ends the worker loop once the queue is empty
        drop(self.tx);
        ClosingSink {
            name: self.name,
            metrics: self.metrics,
            worker_handle: self.worker_handle,
            joined: false,
        }
    }
}

/// A sink whose queue is closed and whose worker is draining it
pub struct ClosingSink {
    name: String,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
    joined: bool,
}

impl ClosingSink {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    pub fn is_finished(&self) -> bool {
        self.joined || self.worker_handle.is_finished()
    }

    /// Wait for the worker to finish; cancel safe
    pub async fn join(&mut self) {
        if self.joined {
            return;
        }
        let result = (&mut self.worker_handle).await;
        self.joined = true;
        if let Err(e) = result {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
    }

    /// Stop the worker without delivering what is left in its queue
    pub fn abort(&self) {
        self.worker_handle.abort();
    }
}

/// Worker task that consumes snapshots and delivers them to the sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: DataSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Arc<Snapshot>>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(snapshot) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        let started = Instant::now();
        let result = sink.deliver(&snapshot).await;
        metrics.add_delivery_time(started.elapsed());

        match result {
            Ok(()) => {
                metrics.inc_delivered_count();
            }
            Err(e) => {
                // Not retried; the next snapshot supersedes this one
                metrics.inc_failure_count();
                error!(
                    sink = %name,
                    tick = snapshot.tick(),
                    error = %e,
                    "Delivery failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}
