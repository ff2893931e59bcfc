//! Config validation
//!
//! Rules:
//! - field constraints declared on the contract types (`validator` derives)
//! - `app.log_level` made of `level` or `target=level` directives
//! - at least one probe, probe ids unique and usable as a key segment
//! - source params reference configured probes and parse as numbers
//! - sink names unique and non-empty, required sink params present
//! - status thresholds finite, margins non-negative

use std::collections::HashSet;

use contracts::{ContractError, PitBlueprint, SinkType, SourceType};
use ::validator::Validate;

/// Validate a PitBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &PitBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_log_level(blueprint)?;
    validate_probe_ids(blueprint)?;
    validate_source(blueprint)?;
    validate_sinks(blueprint)?;
    validate_status(blueprint)?;
    Ok(())
}

/// Declarative field constraints
fn validate_fields(blueprint: &PitBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|e| ContractError::config_validation("blueprint", e.to_string()))
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

fn validate_log_level(blueprint: &PitBlueprint) -> Result<(), ContractError> {
    let filter = blueprint.app.log_level.trim();
    if filter.is_empty() {
        return Err(ContractError::config_validation(
            "app.log_level",
            "log level cannot be empty",
        ));
    }
    for directive in filter.split(',') {
        let level = directive
            .rsplit_once('=')
            .map_or(directive, |(_, level)| level)
            .trim();
        if !LOG_LEVELS.iter().any(|known| known.eq_ignore_ascii_case(level)) {
            return Err(ContractError::config_validation(
                "app.log_level",
                format!("unknown log level '{level}'"),
            ));
        }
    }
    Ok(())
}

/// Probe id uniqueness and shape
fn validate_probe_ids(blueprint: &PitBlueprint) -> Result<(), ContractError> {
    if blueprint.probes.is_empty() {
        return Err(ContractError::config_validation(
            "probes",
            "at least one probe must be configured",
        ));
    }

    let mut seen = HashSet::new();
    for probe in &blueprint.probes {
        if !seen.insert(probe.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("probes[id={}]", probe.id),
                "duplicate probe id",
            ));
        }
        if probe.id.contains('/') || probe.id.chars().any(char::is_whitespace) {
            return Err(ContractError::config_validation(
                format!("probes[id={}]", probe.id),
                "probe id cannot contain '/' or whitespace",
            ));
        }
    }
    Ok(())
}

/// Source parameters
fn validate_source(blueprint: &PitBlueprint) -> Result<(), ContractError> {
    let params = &blueprint.source.params;

    match blueprint.source.source_type {
        SourceType::Fixed => {
            for (key, value) in params {
                let field = format!("source.params.{key}");
                if let Some(probe_id) = key.strip_prefix("value.") {
                    if blueprint.probe(probe_id).is_none() {
                        return Err(ContractError::config_validation(
                            field,
                            format!("probe '{probe_id}' is not configured"),
                        ));
                    }
                }
                parse_finite(&field, value)?;
            }
        }
        SourceType::Simulated => {
            for (key, value) in params {
                let field = format!("source.params.{key}");
                match key.as_str() {
                    "seed" => {
                        value.parse::<u64>().map_err(|e| {
                            ContractError::config_validation(&field, e.to_string())
                        })?;
                    }
                    "failure_rate" => {
                        let rate = parse_finite(&field, value)?;
                        if !(0.0..=1.0).contains(&rate) {
                            return Err(ContractError::config_validation(
                                field,
                                format!("failure_rate must be within [0, 1], got {rate}"),
                            ));
                        }
                    }
                    _ => {
                        parse_finite(&field, value)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Sink configuration
fn validate_sinks(blueprint: &PitBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
        if !sink.enabled {
            continue;
        }

        match sink.sink_type {
            SinkType::Log => {}
            SinkType::File => {
                require_param(&sink.name, &sink.params, "path")?;
                if let Some(format) = sink.params.get("format") {
                    if !matches!(format.as_str(), "csv" | "jsonl") {
                        return Err(ContractError::config_validation(
                            format!("sinks[{}].params.format", sink.name),
                            format!("unknown format '{format}', expected csv or jsonl"),
                        ));
                    }
                }
            }
            SinkType::Notification => {
                require_param(&sink.name, &sink.params, "addr")?;
            }
        }
    }
    Ok(())
}

/// Status thresholds
fn validate_status(blueprint: &PitBlueprint) -> Result<(), ContractError> {
    let status = &blueprint.status;
    let values = [
        ("status.pit_target", status.pit_target),
        ("status.meat_done", status.meat_done),
        ("status.warn_margin", status.warn_margin),
        ("status.alert_margin", status.alert_margin),
        ("status.cool_margin", status.cool_margin),
    ];
    for (field, value) in values {
        if !value.is_finite() {
            return Err(ContractError::config_validation(
                field,
                "threshold must be finite",
            ));
        }
    }
    if status.warn_margin < 0.0 || status.alert_margin < 0.0 || status.cool_margin < 0.0 {
        return Err(ContractError::config_validation(
            "status",
            "margins must be >= 0",
        ));
    }
    if status.warn_margin > status.alert_margin {
        return Err(ContractError::config_validation(
            "status.warn_margin / status.alert_margin",
            format!(
                "warn_margin ({}) must be <= alert_margin ({})",
                status.warn_margin, status.alert_margin
            ),
        ));
    }
    Ok(())
}

fn require_param(
    sink_name: &str,
    params: &std::collections::HashMap<String, String>,
    key: &str,
) -> Result<(), ContractError> {
    match params.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(ContractError::config_validation(
            format!("sinks[{sink_name}].params.{key}"),
            format!("missing '{key}' parameter"),
        )),
    }
}

fn parse_finite(field: &str, value: &str) -> Result<f64, ContractError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(v) => Err(ContractError::config_validation(
            field,
            format!("value must be finite, got {v}"),
        )),
        Err(e) => Err(ContractError::config_validation(
            field,
            format!("invalid number '{value}': {e}"),
        )),
    }
}
