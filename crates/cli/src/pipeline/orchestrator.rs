//! Pipeline orchestrator - wires source, history, sinks and the control loop.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::PitBlueprint;
use controller::{Controller, ControllerConfig, IntervalScheduler, TokioClock};
use dispatcher::DEFAULT_DRAIN_TIMEOUT;
use history::HistoryBuffer;
use tracing::{info, warn};

use super::status::{spawn_status_reporter, StatusProbes};
use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The loaded configuration, CLI overrides applied
    pub blueprint: PitBlueprint,

    /// Maximum number of ticks (None = until shutdown)
    pub max_ticks: Option<u64>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Cook status log period (None = disabled)
    pub status_interval: Option<Duration>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves or the tick limit is reached
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()> + Send,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        info!("Creating reading source...");
        let source = ingestion::create_source(blueprint).context("Failed to create reading source")?;

        info!("Setting up sinks...");
        if blueprint.sinks.iter().all(|s| !s.enabled) {
            warn!("No enabled sinks - snapshots are only kept in memory");
        }
        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone())
            .await
            .context("Failed to create dispatcher")?;
        info!(sinks = ?dispatcher.sink_names(), "Dispatcher ready");

        let history = HistoryBuffer::new(blueprint.history_capacity())
            .context("Failed to create history buffer")?;
        let reader = history.reader();

        let controller = Controller::new(
            source,
            Arc::new(TokioClock::new()),
            IntervalScheduler::new(blueprint.poll_interval()),
            history,
            dispatcher,
            ControllerConfig {
                max_ticks: self.config.max_ticks,
                // Exit within one tick of the shutdown signal
                drain_timeout: blueprint.poll_interval().min(DEFAULT_DRAIN_TIMEOUT),
            },
        );

        let probes = StatusProbes::from_blueprint(blueprint);
        let reporter = self
            .config
            .status_interval
            .map(|period| spawn_status_reporter(reader.clone(), probes.clone(), period));

        info!(
            interval_secs = blueprint.app.poll_interval_seconds,
            max_ticks = ?self.config.max_ticks,
            "Pipeline running"
        );

        let result = controller.run(shutdown).await;

        if let Some(reporter) = reporter {
            reporter.abort();
        }

        let controller_stats = result.map_err(CliError::from)?;

        let mut stats = PipelineStats::from_controller(controller_stats, start_time.elapsed());
        stats.history_len = reader.len();
        stats.final_status = probes.current(&reader);

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            ticks = stats.ticks,
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}
