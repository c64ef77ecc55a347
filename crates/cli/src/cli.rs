//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// flowmeter - per-flow TCP+UDP bandwidth monitor
#[derive(Parser, Debug)]
#[command(
    name = "flowmeter",
    author,
    version,
    about = "Per-flow TCP+UDP bandwidth monitor",
    long_about = "Runs iperf servers and a link probe, reconciles the per-protocol rate \n\
                  reports of every client into a combined per-flow rate, and detects \n\
                  flows that stopped reporting."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FLOWMETER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FLOWMETER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Level used when `RUST_LOG` is not set
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the listeners and monitor flows until stopped
    Run(RunArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); flags below override it
    #[arg(short, long, env = "FLOWMETER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interface receiving the measured traffic
    #[arg(short, long, env = "FLOWMETER_INTERFACE")]
    pub interface: Option<String>,

    /// TCP listener ports (comma separated)
    #[arg(short = 't', long = "tcp", value_delimiter = ',')]
    pub tcp_ports: Vec<u16>,

    /// UDP listener ports (comma separated)
    #[arg(short = 'u', long = "udp", value_delimiter = ',')]
    pub udp_ports: Vec<u16>,

    /// Run length in seconds (0 = until Ctrl+C)
    #[arg(short, long, env = "FLOWMETER_DURATION")]
    pub duration: Option<f64>,

    /// Flows that must be active at the liveness check
    #[arg(long)]
    pub expect: Option<usize>,

    /// Experiment time of the liveness check (seconds)
    #[arg(long)]
    pub check_after: Option<f64>,

    /// Where to write the final snapshot (JSON)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Flows below this rate are left out of the per-tick log line (e.g. 10k, 1.5m)
    #[arg(long, default_value = "10k", value_parser = parse_rate_arg)]
    pub noise_floor: u64,

    /// Consumer tick period in milliseconds
    #[arg(long, default_value = "1000", env = "FLOWMETER_TICK_MS")]
    pub tick_ms: u64,

    /// Resolve and validate the configuration, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FLOWMETER_METRICS_PORT")]
    pub metrics_port: u16,
}

fn parse_rate_arg(raw: &str) -> Result<u64, String> {
    contracts::parse_rate(raw).ok_or_else(|| format!("invalid rate '{raw}' (expected e.g. 10k, 45.5m)"))
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "flowmeter.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "flowmeter.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the command line of every spawned process
    #[arg(long)]
    pub commands: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
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
