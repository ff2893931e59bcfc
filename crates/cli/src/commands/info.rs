//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::PitBlueprint;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Debug, Serialize)]
struct ConfigInfo {
    version: String,
    sampling: SamplingInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    probes: Vec<ProbeInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    status: StatusInfo,
}

#[derive(Debug, Serialize)]
struct SamplingInfo {
    poll_interval_seconds: u64,
    history_capacity: usize,
    source_type: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    source_params: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
struct ProbeInfo {
    id: String,
    name: String,
    channel: u8,
    probe_type: String,
    role: String,
}

#[derive(Debug, Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    enabled: bool,
    queue_capacity: usize,
}

#[derive(Debug, Serialize)]
struct StatusInfo {
    pit_target: f64,
    meat_done: f64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args.probes, args.sinks);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &PitBlueprint, with_probes: bool, with_sinks: bool) -> ConfigInfo {
    let probes = if with_probes {
        blueprint
            .probes
            .iter()
            .map(|p| ProbeInfo {
                id: p.id.clone(),
                name: p.display_name().to_string(),
                channel: p.channel,
                probe_type: format!("{:?}", p.probe_type),
                role: format!("{:?}", p.role),
            })
            .collect()
    } else {
        Vec::new()
    };

    let sinks = if with_sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                enabled: s.enabled,
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        sampling: SamplingInfo {
            poll_interval_seconds: blueprint.app.poll_interval_seconds,
            history_capacity: blueprint.history_capacity(),
            source_type: format!("{:?}", blueprint.source.source_type),
            source_params: blueprint.source.params.clone(),
        },
        probes,
        sinks,
        status: StatusInfo {
            pit_target: blueprint.status.pit_target,
            meat_done: blueprint.status.meat_done,
        },
    }
}

fn print_config_info(blueprint: &PitBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Pit Companion Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⏱  Sampling");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Interval: {}s", blueprint.app.poll_interval_seconds);
    println!("   ├─ History: {} snapshots", blueprint.history_capacity());
    println!("   └─ Source: {:?}", blueprint.source.source_type);

    println!("\n🌡  Probes ({})", blueprint.probes.len());
    for (i, probe) in blueprint.probes.iter().enumerate() {
        let prefix = if i == blueprint.probes.len() - 1 { "└─" } else { "├─" };
        if args.probes {
            println!(
                "   {} {} \"{}\" (channel {}, {:?}, {:?})",
                prefix,
                probe.id,
                probe.display_name(),
                probe.channel,
                probe.probe_type,
                probe.role
            );
        } else {
            println!("   {} {}", prefix, probe.id);
        }
    }

    println!("\n🍖 Status Thresholds");
    println!("   ├─ Pit target: {:.1}C", blueprint.status.pit_target);
    println!("   └─ Meat done: {:.1}C", blueprint.status.meat_done);

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let prefix = if i == blueprint.sinks.len() - 1 { "└─" } else { "├─" };
            let state = if sink.enabled { "" } else { " [disabled]" };
            println!("   {} {} ({:?}){}", prefix, sink.name, sink.sink_type, state);
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    #[test]
    fn test_info_json_sections() {
        let blueprint = ConfigLoader::load_from_str(
            r#"
            [[probes]]
            id = "pit"
            name = "Pit"
            role = "pit"

            [[probes]]
            id = "meat"

            [[sinks]]
            name = "console"
            sink_type = "log"
            enabled = false
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let info = build_config_info(&blueprint, true, false);
        assert_eq!(info.probes.len(), 2);
        assert_eq!(info.probes[1].name, "meat");
        assert!(info.sinks.is_empty());

        let json = serde_json::to_value(build_config_info(&blueprint, false, true)).unwrap();
        assert!(json.get("probes").is_none());
        assert_eq!(json["sinks"][0]["enabled"], false);
        assert_eq!(json["sampling"]["source_type"], "Simulated");
    }
}
