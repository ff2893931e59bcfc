//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::PitBlueprint;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args)?;

    info!(
        interval_secs = blueprint.app.poll_interval_seconds,
        probes = blueprint.probes.len(),
        source = ?blueprint.source.source_type,
        sinks = blueprint.sinks.len(),
        history_capacity = blueprint.history_capacity(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        status_interval: (args.status_interval > 0)
            .then(|| Duration::from_secs(args.status_interval)),
    });

    info!("Starting pipeline...");

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        ticks = stats.ticks,
        source_errors = stats.source_errors,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("Pit Companion finished");
    Ok(())
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(blueprint: &mut PitBlueprint, args: &RunArgs) -> Result<(), CliError> {
    if let Some(interval) = args.interval {
        if interval == 0 {
            return Err(CliError::invalid_override(
                "--interval",
                "poll interval must be at least 1 second",
            ));
        }
        info!(interval_secs = interval, "Overriding poll interval from CLI");
        blueprint.app.poll_interval_seconds = interval;
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Received shutdown signal, stopping after the current tick...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &PitBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Sampling:");
    println!("  Interval: {}s", blueprint.app.poll_interval_seconds);
    println!("  History: {} snapshots", blueprint.history_capacity());
    println!("  Source: {:?}", blueprint.source.source_type);

    println!("\nProbes ({}):", blueprint.probes.len());
    for probe in &blueprint.probes {
        println!(
            "  - {} ({}) channel {} {:?}/{:?}",
            probe.id,
            probe.display_name(),
            probe.channel,
            probe.role,
            probe.probe_type
        );
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            let state = if sink.enabled { "" } else { " [disabled]" };
            println!("  - {} ({:?}){}", sink.name, sink.sink_type, state);
        }
    }

    println!();
}
