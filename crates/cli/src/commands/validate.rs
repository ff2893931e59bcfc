//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{PitBlueprint, ProbeRole, SinkType};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Debug, Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Debug, Serialize)]
struct ConfigSummary {
    version: String,
    poll_interval_seconds: u64,
    history_capacity: usize,
    probe_count: usize,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(&args.config);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();

    if !path.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", path.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(path) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    poll_interval_seconds: blueprint.app.poll_interval_seconds,
                    history_capacity: blueprint.history_capacity(),
                    probe_count: blueprint.probes.len(),
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &PitBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.iter().all(|s| !s.enabled) {
        warnings.push("No enabled sinks - snapshots are only kept in memory".to_string());
    }

    let persisted = blueprint
        .sinks
        .iter()
        .any(|s| s.enabled && s.sink_type == SinkType::File);
    if !persisted {
        warnings.push("No file sink enabled - readings will not be persisted".to_string());
    }

    if blueprint.first_probe_with_role(ProbeRole::Pit).is_none() {
        warnings.push("No probe has role 'pit' - cook status will report 'No data'".to_string());
    }
    if blueprint.first_probe_with_role(ProbeRole::Food).is_none() {
        warnings.push("No probe has role 'food' - cook status will report 'No data'".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Interval: {}s", summary.poll_interval_seconds);
            println!("  History: {} snapshots", summary.history_capacity);
            println!("  Probes: {}", summary.probe_count);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
