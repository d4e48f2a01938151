//! airtightctl library - exposes modules for integration tests

pub mod cli;
pub mod commands;
pub mod display;
pub mod elevation;
pub mod logging;
pub mod profiler;
pub mod prompt;
