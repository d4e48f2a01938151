//! AirTIGHT Control - audit, sample, decide and apply audio stability fixes

use airtight_common::config::AirtightConfig;
use airtightctl::cli::{Cli, Commands};
use airtightctl::commands::{self, RunOptions};
use airtightctl::logging;
use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AirtightConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    logging::init(&config.logging.level, cli.verbose);
    debug!("AirTIGHT v{} config: {:?}", env!("CARGO_PKG_VERSION"), config);

    match cli.command {
        Commands::Audit => commands::audit(),
        Commands::Monitor { interval_ms } => commands::monitor(&config, interval_ms),
        Commands::Analyze { json, profile } => {
            commands::analyze(&config, json, profile.as_deref())
        }
        Commands::Run {
            yes,
            no_elevate,
            json,
            profile,
        } => commands::run(
            &config,
            &RunOptions {
                yes,
                no_elevate,
                json,
                profile,
            },
        ),
        Commands::Rollback { yes } => commands::rollback(&config, yes),
    }
}
