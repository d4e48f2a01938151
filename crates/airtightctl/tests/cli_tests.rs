//! CLI surface tests
//!
//! Parse real argument vectors through clap; nothing is executed.

use airtightctl::cli::{Cli, Commands};
use clap::Parser;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("airtightctl").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_default_config_path() {
    let cli = parse(&["audit"]);
    assert_eq!(cli.config, PathBuf::from("/etc/airtight/config.toml"));
    assert!(!cli.verbose);
    assert_eq!(cli.command, Commands::Audit);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["analyze", "--json", "-v", "--config", "/tmp/a.toml"]);
    assert!(cli.verbose);
    assert_eq!(cli.config, PathBuf::from("/tmp/a.toml"));
    assert_eq!(
        cli.command,
        Commands::Analyze {
            json: true,
            profile: None
        }
    );
}

#[test]
fn test_run_flags() {
    let cli = parse(&["run", "--yes", "--no-elevate", "--profile", "host.json"]);
    assert_eq!(
        cli.command,
        Commands::Run {
            yes: true,
            no_elevate: true,
            json: false,
            profile: Some(PathBuf::from("host.json")),
        }
    );
}

#[test]
fn test_run_defaults_are_interactive() {
    let cli = parse(&["run"]);
    assert_eq!(
        cli.command,
        Commands::Run {
            yes: false,
            no_elevate: false,
            json: false,
            profile: None,
        }
    );
}

#[test]
fn test_monitor_interval() {
    let cli = parse(&["monitor", "--interval-ms", "250"]);
    assert_eq!(
        cli.command,
        Commands::Monitor {
            interval_ms: Some(250)
        }
    );
}

#[test]
fn test_rollback_short_yes() {
    let cli = parse(&["rollback", "-y"]);
    assert_eq!(cli.command, Commands::Rollback { yes: true });
}

#[test]
fn test_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["airtightctl", "optimize"]).is_err());
    assert!(Cli::try_parse_from(["airtightctl"]).is_err());
}
