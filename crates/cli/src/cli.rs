//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Pose Streamer - latest-value tracking pose broadcaster
#[derive(Parser, Debug)]
#[command(
    name = "pose-streamer",
    author,
    version,
    about = "Sample tracked poses at a fixed cadence and stream them as hex lines",
    long_about = "Samples the head-mounted display pose (and optionally every auxiliary \n\
                  tracked device) at a fixed interval and streams each frame as one hex \n\
                  line, either to standard output or to every connected TCP client.\n\n\
                  Press Enter on an empty line to stop."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "POSE_STREAMER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all diagnostics except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (always written to standard error)
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "POSE_STREAMER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream frames until an empty line is entered
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply without one
    #[arg(short, long, env = "POSE_STREAMER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sampling interval in milliseconds (minimum 1)
    #[arg(short, long, env = "POSE_STREAMER_INTERVAL_MS")]
    pub interval: Option<u64>,

    /// TCP port to serve; 0 writes to standard output
    #[arg(short, long, env = "POSE_STREAMER_PORT")]
    pub port: Option<u16>,

    /// Listen address for TCP delivery
    #[arg(long, env = "POSE_STREAMER_BIND")]
    pub bind: Option<String>,

    /// Append auxiliary device records to every line
    #[arg(long)]
    pub aux: bool,

    /// Maximum simultaneous TCP clients
    #[arg(long, env = "POSE_STREAMER_MAX_CONNECTIONS")]
    pub max_connections: Option<usize>,

    /// Prometheus metrics port
    #[arg(long, env = "POSE_STREAMER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Replay a recorded stream instead of generating frames
    #[arg(long, env = "POSE_STREAMER_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Stop replay at the last frame instead of looping
    #[arg(long, requires = "replay")]
    pub replay_once: bool,

    /// Resolve and validate configuration, print it, and exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long)]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
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
