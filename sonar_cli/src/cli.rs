//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "sonar", version, about = "Ultrasonic range finder CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/sonar_config.toml")]
    pub config: PathBuf,

    /// Print reports and errors as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the sensor and print periodic distance/velocity reports
    Run {
        /// Stop after this many polls (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        polls: Option<u64>,
        /// Override poll.interval_ms from the config
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
        /// Override poll.report_every from the config
        #[arg(long, value_name = "N")]
        report_every: Option<u32>,
    },
    /// Fill one window and check that echoes come back
    SelfCheck,
}
