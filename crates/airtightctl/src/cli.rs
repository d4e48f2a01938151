//! Command-line interface definition

use airtight_common::config::config_path;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "airtightctl")]
#[command(about = "AirTIGHT - Linux audio stability optimizer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value_os_t = config_path())]
    pub config: PathBuf,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Audit hardware, init system and dependencies
    Audit,

    /// Live CPU/RAM/under-run tracker (Ctrl+C to stop)
    Monitor {
        /// Milliseconds between samples (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Sample a window and show the plan without applying it
    Analyze {
        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Read the system profile from a JSON file instead of auditing
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,
    },

    /// Sample, decide and apply the plan
    Run {
        /// Apply without asking
        #[arg(short, long)]
        yes: bool,

        /// Fail instead of re-running through sudo
        #[arg(long)]
        no_elevate: bool,

        /// Emit JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Read the system profile from a JSON file instead of auditing
        #[arg(long, value_name = "FILE")]
        profile: Option<PathBuf>,
    },

    /// Restore configuration files from their AirTIGHT backups
    Rollback {
        /// Restore without asking
        #[arg(short, long)]
        yes: bool,
    },
}
