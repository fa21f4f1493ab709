//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::SimulatedMotion;
use std::path::PathBuf;

/// HAR Monitor - real-time activity recognition and sudden-stop detection
#[derive(Parser, Debug)]
#[command(
    name = "har-monitor",
    author,
    version,
    about = "Real-time activity recognition and sudden-stop detection",
    long_about = "Rule-based human activity recognition over accelerometer, gyroscope and \n\
                  magnetometer streams.\n\n\
                  Runs a monitoring session over a simulated motion profile or a recorded \n\
                  JSONL file, classifies each tick and routes events to configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "HAR_MONITOR_VERBOSE")]
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
        env = "HAR_MONITOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a monitoring session
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration and activity signatures
    Info(InfoArgs),

    /// Write a synthetic JSONL recording for replay
    Record(RecordArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "HAR_MONITOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the source with a simulated motion profile
    #[arg(long, value_enum, conflicts_with = "replay")]
    pub motion: Option<MotionArg>,

    /// Override the source with a JSONL recording
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Override the GPS provider with a fixed speed (m/s)
    #[arg(long)]
    pub gps_speed: Option<f64>,

    /// Session duration in seconds (0 = until Ctrl+C or the replay ends)
    #[arg(short, long, default_value = "30", env = "HAR_MONITOR_DURATION")]
    pub duration: u64,

    /// Seconds between status log lines
    #[arg(long, default_value = "5")]
    pub status_interval: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "HAR_MONITOR_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "monitor.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show engine tunables
    #[arg(long)]
    pub engine: bool,

    /// Show the activity signature table
    #[arg(long)]
    pub signatures: bool,
}

/// Arguments for the `record` command
#[derive(Parser, Debug)]
pub struct RecordArgs {
    /// Output JSONL path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Motion profile to synthesize
    #[arg(long, value_enum, default_value = "walking")]
    pub motion: MotionArg,

    /// Recording length in seconds
    #[arg(short, long, default_value = "10")]
    pub duration: u64,

    /// Readings per second per channel
    #[arg(long, default_value = "50")]
    pub rate_hz: f64,

    /// Timestamp of the first reading (epoch ms); current time when omitted
    #[arg(long)]
    pub start_ms: Option<u64>,
}

/// Simulated motion profile
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionArg {
    Idle,
    Walking,
    Running,
    /// Running bursts followed by abrupt stillness
    SuddenStop,
}

impl From<MotionArg> for SimulatedMotion {
    fn from(motion: MotionArg) -> Self {
        match motion {
            MotionArg::Idle => SimulatedMotion::Idle,
            MotionArg::Walking => SimulatedMotion::Walking,
            MotionArg::Running => SimulatedMotion::Running,
            MotionArg::SuddenStop => SimulatedMotion::SuddenStop,
        }
    }
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
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
