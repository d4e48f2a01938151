//! Tracing setup for airtightctl
//!
//! Logs go to stderr so the tables and JSON on stdout stay clean.
//! `RUST_LOG` wins over the configured level; `-v` raises it to info.

use tracing_subscriber::EnvFilter;

/// Filter directive for a configured level and the verbose flag
pub fn filter_directive(configured: &str, verbose: bool) -> String {
    let configured = configured.trim().to_lowercase();
    let level = match configured.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => configured.as_str(),
        _ => "warn",
    };
    if verbose && matches!(level, "warn" | "error" | "off") {
        "info".to_string()
    } else {
        level.to_string()
    }
}

pub fn init(configured: &str, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(configured, verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
