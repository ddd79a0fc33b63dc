//! CLI command definitions
//!
//! Defines the clap commands and global options for the probe CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::common::paths;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in, fetch customer, tour and schedule, then create a booking
    Booking,

    /// Create a booking, then start a payment for it
    Pay {
        /// Payment provider: momo or zalopay
        provider: String,
    },

    /// Fetch an endpoint and list the shape of its data payload
    Schema {
        /// Endpoint path, e.g. /api/tours
        path: String,
    },

    /// Run a YAML scenario file
    Run {
        /// Path to the scenario file
        scenario: PathBuf,
    },

    /// Show the effective configuration with secrets elided
    Config,
}

/// Options accepted by every command
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL (overrides config and PROBE_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Default per-call timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Print the outcome as JSON instead of the console report
    #[arg(long, global = true)]
    pub json: bool,

    /// Also write the outcome as JSON to this file
    #[arg(long, global = true)]
    pub report: Option<PathBuf>,

    /// Show requests as they are sent and debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Append detailed logs to the default log file
    #[arg(long, global = true)]
    pub log: bool,

    /// Append detailed logs to this file
    #[arg(long, global = true, conflicts_with = "log")]
    pub log_file: Option<PathBuf>,
}

impl GlobalArgs {
    /// Where file logging should go, if anywhere
    pub fn log_path(&self) -> Option<PathBuf> {
        match &self.log_file {
            Some(path) => Some(path.clone()),
            None if self.log => paths::default_log_file(),
            None => None,
        }
    }
}
