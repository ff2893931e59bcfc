//! The control loop: sample, assemble, append to history, fan out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use contracts::{Clock, ReadingSource, Snapshot};
use dispatcher::{DispatchReport, Dispatcher, MetricsSnapshot, DEFAULT_DRAIN_TIMEOUT};
use history::{HistoryBuffer, HistoryReader};
use observability::TickMetricsAggregator;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::assembler::SnapshotAssembler;
use crate::error::ControllerError;
use crate::scheduler::Scheduler;

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Stop after this many ticks (None = run until shutdown)
    pub max_ticks: Option<u64>,
    /// How long sink queues may drain on exit before they are abandoned
    pub drain_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_ticks: None,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

/// Where the controller is within a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickState {
    /// Waiting for the scheduler
    Idle,
    /// Reading the clock and the source
    Sampling,
    /// Appending to history and enqueueing to sinks
    Distributing,
}

/// Result of one tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub snapshot: Arc<Snapshot>,
    /// The whole sample failed and an empty snapshot was produced
    pub outage: bool,
    /// History was full and dropped its oldest snapshot
    pub evicted: bool,
    pub dispatch: DispatchReport,
    pub duration: Duration,
}

/// Statistics of one run
#[derive(Debug, Clone, Default)]
pub struct ControllerStats {
    pub ticks: u64,
    pub source_errors: u64,
    pub evictions: u64,
    pub aggregator: TickMetricsAggregator,
    /// Final per-sink counters, filled in after the sinks are drained
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

/// Drives the sampling pipeline
///
/// Owns the history writer and the dispatcher; everything else is injected.
pub struct Controller<S> {
    source: Box<dyn ReadingSource>,
    clock: Arc<dyn Clock>,
    scheduler: S,
    assembler: SnapshotAssembler,
    history: HistoryBuffer,
    dispatcher: Dispatcher,
    config: ControllerConfig,
    state: TickState,
    next_tick: u64,
    stats: ControllerStats,
}

impl<S: Scheduler> Controller<S> {
    pub fn new(
        source: Box<dyn ReadingSource>,
        clock: Arc<dyn Clock>,
        scheduler: S,
        history: HistoryBuffer,
        dispatcher: Dispatcher,
        config: ControllerConfig,
    ) -> Self {
        let assembler = SnapshotAssembler::new(source.source_ids());
        Self {
            source,
            clock,
            scheduler,
            assembler,
            history,
            dispatcher,
            config,
            state: TickState::Idle,
            next_tick: 1,
            stats: ControllerStats::default(),
        }
    }

    /// Read handle on the history this controller writes
    pub fn history(&self) -> HistoryReader {
        self.history.reader()
    }

    pub fn state(&self) -> TickState {
        self.state
    }

    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }

    /// Run one tick: sample, assemble, append, enqueue
    ///
    /// Only a history invariant violation is returned as an error.
    #[instrument(name = "controller_tick", skip(self), fields(tick = self.next_tick))]
    pub fn tick(&mut self) -> Result<TickReport, ControllerError> {
        let started = Instant::now();
        let tick = self.next_tick;
        self.next_tick += 1;

        self.state = TickState::Sampling;
        let timestamp = self.clock.now();
        let (snapshot, outage) = match self.source.sample() {
            Ok(outcome) => (self.assembler.assemble(tick, timestamp, outcome), false),
            Err(e) => {
                warn!(
                    tick,
                    source = self.source.name(),
                    error = %e,
                    "Sample failed, recording total outage"
                );
                observability::record_source_error(self.source.name());
                self.stats.source_errors += 1;
                (self.assembler.outage(tick, timestamp), true)
            }
        };
        let snapshot = Arc::new(snapshot);

        self.state = TickState::Distributing;
        let evicted = match self.history.append(Arc::clone(&snapshot)) {
            Ok(evicted) => evicted.is_some(),
            Err(e) => {
                self.state = TickState::Idle;
                error!(tick, error = %e, "History append failed");
                return Err(ControllerError::history(tick, e));
            }
        };
        let dispatch = self.dispatcher.dispatch(Arc::clone(&snapshot));
        let duration = started.elapsed();
        self.state = TickState::Idle;

        self.record(&snapshot, evicted, dispatch, duration);

        debug!(
            tick,
            readings = snapshot.len(),
            failed = snapshot.failed().len(),
            queued = dispatch.queued,
            dropped = dispatch.dropped,
            "Tick complete"
        );

        Ok(TickReport {
            snapshot,
            outage,
            evicted,
            dispatch,
            duration,
        })
    }

    fn record(
        &mut self,
        snapshot: &Snapshot,
        evicted: bool,
        dispatch: DispatchReport,
        duration: Duration,
    ) {
        let duration_ms = duration.as_secs_f64() * 1000.0;
        self.stats.ticks += 1;
        if evicted {
            self.stats.evictions += 1;
        }
        self.stats
            .aggregator
            .update(snapshot, duration_ms, dispatch.dropped);

        observability::record_snapshot_metrics(snapshot, duration_ms);
        observability::record_history_len(self.history.len(), self.history.capacity());
        for (name, metrics) in self.dispatcher.metrics() {
            observability::record_sink_state(
                &name,
                metrics.queue_len,
                metrics.delivered_count,
                metrics.failure_count,
                metrics.dropped_count,
            );
        }
    }

    /// Run until `shutdown` resolves, the scheduler ends or `max_ticks` is hit
    ///
    /// Shutdown is only observed between ticks, so a tick in progress always
    /// completes. On exit the sink queues get `drain_timeout` to empty before
    /// the sinks are closed, also when the loop ends with a fatal error.
    #[instrument(name = "controller_run", skip(self, shutdown))]
    pub async fn run<F>(mut self, shutdown: F) -> Result<ControllerStats, ControllerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            source = self.source.name(),
            sources = self.assembler.configured().len(),
            sinks = self.dispatcher.len(),
            history_capacity = self.history.capacity(),
            max_ticks = ?self.config.max_ticks,
            "Controller started"
        );

        let result = loop {
            if let Some(max) = self.config.max_ticks {
                if self.stats.ticks >= max {
                    info!(ticks = self.stats.ticks, "Tick limit reached");
                    break Ok(());
                }
            }

            self.state = TickState::Idle;
            let ticked = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                ticked = self.scheduler.next_tick() => ticked,
            };

            if !ticked {
                info!("Scheduler finished");
                break Ok(());
            }

            if let Err(e) = self.tick() {
                break Err(e);
            }
        };

        let Controller {
            dispatcher,
            config,
            mut stats,
            ..
        } = self;
        stats.sinks = dispatcher.shutdown_within(config.drain_timeout).await;

        match result {
            Ok(()) => {
                info!(ticks = stats.ticks, "Controller stopped");
                Ok(stats)
            }
            Err(e) => {
                error!(error = %e, "Controller stopped on fatal error");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use chrono::DateTime;
    use contracts::{ContractError, DataSink, ManualClock};
    use dispatcher::SinkHandle;
    use ingestion::ScriptedSource;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct CollectingSink {
        seen: Arc<Mutex<Vec<Arc<Snapshot>>>>,
    }

    impl DataSink for CollectingSink {
        fn name(&self) -> &str {
            "collect"
        }

        async fn deliver(&mut self, snapshot: &Snapshot) -> Result<(), ContractError> {
            self.seen.lock().unwrap().push(Arc::new(snapshot.clone()));
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn clock() -> ManualClock {
        ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
    }

    fn controller(
        source: ScriptedSource,
        clock: ManualClock,
        capacity: usize,
        sink: CollectingSink,
    ) -> (Controller<ManualScheduler>, crate::scheduler::TickDriver) {
        let (scheduler, driver) = ManualScheduler::new();
        let dispatcher = Dispatcher::with_handles(vec![SinkHandle::spawn(sink, 16)]);
        let controller = Controller::new(
            Box::new(source),
            Arc::new(clock),
            scheduler,
            HistoryBuffer::new(capacity).unwrap(),
            dispatcher,
            ControllerConfig::default(),
        );
        (controller, driver)
    }

    #[tokio::test]
    async fn test_tick_assembles_and_distributes() {
        let source = ScriptedSource::new()
            .with_value("pit", 110.0)
            .with_value("meat", 56.7)
            .fail_on(2, "meat")
            .error_on(3);
        let clock = clock();
        let sink = CollectingSink::default();
        let (mut controller, _driver) = controller(source, clock.clone(), 10, sink.clone());
        let reader = controller.history();

        let first = controller.tick().unwrap();
        assert_eq!(first.snapshot.tick(), 1);
        assert_eq!(first.snapshot.len(), 2);
        assert_eq!(first.dispatch.queued, 1);
        assert_eq!(controller.state(), TickState::Idle);

        clock.advance(Duration::from_secs(1));
        let second = controller.tick().unwrap();
        assert!(second.snapshot.failed().contains("meat"));
        assert_eq!(second.snapshot.value("pit"), Some(110.0));

        clock.advance(Duration::from_secs(1));
        let third = controller.tick().unwrap();
        assert!(third.outage);
        assert!(third.snapshot.is_empty());

        assert_eq!(reader.len(), 3);
        assert_eq!(controller.stats().source_errors, 1);
        assert_eq!(controller.stats().aggregator.partial_ticks, 1);
        assert_eq!(controller.stats().aggregator.empty_ticks, 1);
    }

    #[tokio::test]
    async fn test_clock_going_backwards_is_fatal() {
        let source = ScriptedSource::new().with_value("pit", 110.0);
        let clock = clock();
        let sink = CollectingSink::default();
        let (controller, driver) = controller(source, clock.clone(), 10, sink.clone());

        // Second tick is stamped earlier than the first
        let rewind = clock.clone();
        let start = clock.now();
        clock.advance(Duration::from_secs(10));
        driver.tick();

        let handle = tokio::spawn(controller.run(std::future::pending::<()>()));
        // Let the first tick happen before rewinding
        while sink.seen.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        rewind.set(start);
        driver.tick();

        let err = handle.await.unwrap().unwrap_err();
        assert!(matches!(err, ControllerError::History { tick: 2, .. }));
        // Sinks were drained before returning
        assert_eq!(sink.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_at_max_ticks() {
        let source = ScriptedSource::new().with_value("pit", 110.0);
        let sink = CollectingSink::default();
        let (mut controller, driver) = controller(source, clock(), 2, sink.clone());
        controller.config.max_ticks = Some(3);
        let reader = controller.history();
        driver.ticks(5);

        let stats = controller.run(std::future::pending::<()>()).await.unwrap();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.evictions, 1);
        assert_eq!(reader.len(), 2);
        assert_eq!(stats.sinks[0].1.delivered_count, 3);
        assert_eq!(sink.seen.lock().unwrap().len(), 3);
    }
}
