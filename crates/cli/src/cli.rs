//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use config_loader::ConfigLoader;
use observability::ObservabilityConfig;
use std::path::{Path, PathBuf};

/// Pit Companion - temperature probe sampler for smokers and grills
#[derive(Parser, Debug)]
#[command(
    name = "pit-companion",
    author,
    version,
    about = "Temperature probe sampling pipeline",
    long_about = "Samples the configured temperature probes on a fixed interval, keeps a \n\
                  bounded in-memory history and fans every snapshot out to the \n\
                  configured sinks (log, file, notification)."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PIT_COMPANION_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "PIT_COMPANION_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Level forced by -v/-q, if any
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.quiet {
            return Some("warn");
        }
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }

    /// Logging setup: -v/-q first, then `app.log_level` from the config file
    ///
    /// An unreadable config leaves the default in place; the command itself
    /// reports the error once logging is up.
    pub fn observability_config(&self) -> ObservabilityConfig {
        let config = ObservabilityConfig {
            log_format: self.log_format.into(),
            metrics_port: None,
            ..ObservabilityConfig::default()
        };

        if let Some(level) = self.log_level_override() {
            return ObservabilityConfig {
                default_log_level: level.to_string(),
                ..config
            };
        }
        match ConfigLoader::load_from_path(self.command.config_path()) {
            Ok(blueprint) => config.with_app_config(&blueprint.app),
            Err(_) => config,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the sampling loop until Ctrl-C / SIGTERM
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

impl Commands {
    pub fn config_path(&self) -> &Path {
        match self {
            Commands::Run(args) => &args.config,
            Commands::Validate(args) => &args.config,
            Commands::Info(args) => &args.config,
        }
    }
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML, JSON or YAML)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "PIT_COMPANION_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the poll interval in seconds
    #[arg(long, env = "PIT_COMPANION_INTERVAL")]
    pub interval: Option<u64>,

    /// Stop after this many ticks (0 = unlimited)
    #[arg(long, default_value = "0", env = "PIT_COMPANION_MAX_TICKS")]
    pub max_ticks: u64,

    /// Seconds between cook status log lines (0 = disabled)
    #[arg(long, default_value = "60", env = "PIT_COMPANION_STATUS_INTERVAL")]
    pub status_interval: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "PIT_COMPANION_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed probe information
    #[arg(long)]
    pub probes: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
