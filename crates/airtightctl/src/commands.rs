//! Command implementations

use crate::display;
use crate::elevation;
use crate::profiler::Profiler;
use crate::prompt;
use airtight_common::analysis::Analysis;
use airtight_common::command_exec::{CommandRunner, SystemRunner};
use airtight_common::config::AirtightConfig;
use airtight_common::error::AirtightError;
use airtight_common::privilege::Privilege;
use airtight_common::profile::SystemProfile;
use airtight_common::remediation::{ExecutionReport, RemediationExecutor};
use airtight_common::sampler::{PwTopCounter, Sampler, SysinfoGauge};
use airtight_common::telemetry::TelemetrySample;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Options for `airtightctl run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub yes: bool,
    pub no_elevate: bool,
    pub json: bool,
    pub profile: Option<PathBuf>,
}

/// JSON record of a `run`
#[derive(Debug, Serialize)]
pub struct RunRecord {
    pub analysis: Analysis,
    /// Absent when nothing was applied
    pub report: Option<ExecutionReport>,
}

/// What the apply gate of `run` decided
#[derive(Debug)]
pub enum ApplyDecision {
    /// Empty plan, the executor was not invoked
    NothingToDo,
    /// The user said no, the executor was not invoked
    Declined,
    Applied(ExecutionReport),
}

impl ApplyDecision {
    pub fn into_report(self) -> Option<ExecutionReport> {
        match self {
            ApplyDecision::Applied(report) => Some(report),
            ApplyDecision::NothingToDo | ApplyDecision::Declined => None,
        }
    }
}

/// Ask, then apply the plan of `analysis`. `confirm` is only consulted for
/// a non-empty plan.
pub fn apply_if_approved<R, F>(
    runner: &R,
    config: &AirtightConfig,
    privilege: Privilege,
    analysis: &Analysis,
    confirm: F,
) -> Result<ApplyDecision>
where
    R: CommandRunner,
    F: FnOnce() -> Result<bool>,
{
    if !analysis.needs_action() {
        return Ok(ApplyDecision::NothingToDo);
    }
    if !confirm()? {
        info!("Plan declined: {:?}", analysis.plan.as_slice());
        return Ok(ApplyDecision::Declined);
    }

    let executor = RemediationExecutor::new(runner, &config.paths, &config.scheduler, privilege);
    let report = executor.apply(&analysis.plan, &analysis.profile)?;
    info!(
        "Applied plan: {} remediation(s), {} failure(s)",
        report.results.len(),
        report.failures()
    );
    Ok(ApplyDecision::Applied(report))
}

/// Read a profile record from disk
pub fn load_profile(path: &Path) -> Result<SystemProfile> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    SystemProfile::from_json(&json)
        .with_context(|| format!("Invalid profile {}", path.display()))
}

fn acquire_profile(profile_file: Option<&Path>, show: bool) -> Result<SystemProfile> {
    let profile = match profile_file {
        Some(path) => load_profile(path)?,
        None => Profiler::new(&SystemRunner).audit(),
    };
    if show {
        let hint = Profiler::new(&SystemRunner).install_hint(&profile.missing_dependencies);
        display::print_audit(&profile, hint.as_deref());
    }
    Ok(profile)
}

fn new_sampler(config: &AirtightConfig) -> Sampler<PwTopCounter<SystemRunner>, SysinfoGauge> {
    Sampler::new(
        PwTopCounter::new(SystemRunner),
        SysinfoGauge::new(),
        config.sampling.sample_high_cpu_percent,
    )
}

fn sample_window(config: &AirtightConfig, show: bool) -> Vec<TelemetrySample> {
    let ticks = config.sampling.effective_ticks();
    let interval = config.sampling.effective_interval();
    info!("Sampling {} ticks every {:?}", ticks, interval);

    let mut sampler = new_sampler(config);
    if show {
        display::print_phase(&format!(
            "Phase 2: Live Health Check ({} samples)...",
            ticks
        ));
        display::print_tracker_header(false);
    }
    sampler.collect_window(ticks, interval, |sample| {
        if show {
            display::print_tracker_row(sample, false);
        }
    })
}

/// Elevated, or replaced by an elevated copy of this process
fn ensure_privilege(no_elevate: bool) -> Result<Privilege> {
    let privilege = Privilege::current();
    if privilege.is_elevated() {
        return Ok(privilege);
    }
    if no_elevate {
        return Err(AirtightError::PrivilegeRequired.into());
    }
    match elevation::reexec_with_sudo()? {}
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `airtightctl audit`
pub fn audit() -> Result<()> {
    acquire_profile(None, true)?;
    Ok(())
}

/// `airtightctl monitor`
pub fn monitor(config: &AirtightConfig, interval_ms: Option<u64>) -> Result<()> {
    let mut sampling = config.sampling.clone();
    if let Some(ms) = interval_ms {
        sampling.interval_ms = ms;
    }
    let interval = sampling.effective_interval();

    println!("{}", airtight_common::SEPARATOR);
    println!("   AirTIGHT LIVE PERFORMANCE TRACKER   (Ctrl+C to stop)");
    println!("{}", airtight_common::SEPARATOR);
    display::print_tracker_header(true);

    let mut sampler = new_sampler(config);
    loop {
        let sample = sampler.sample();
        display::print_tracker_row(&sample, true);
        std::thread::sleep(interval);
    }
}

/// `airtightctl analyze`
pub fn analyze(config: &AirtightConfig, json: bool, profile_file: Option<&Path>) -> Result<()> {
    if !json {
        display::print_banner("ANALYSIS (DRY RUN)");
        display::print_phase("Phase 1: System Audit...");
    }
    let profile = acquire_profile(profile_file, !json)?;
    let samples = sample_window(config, !json);
    let analysis = Analysis::from_window(profile, samples, &config.policy);

    if json {
        return print_json(&analysis);
    }
    display::print_summary(&analysis.summary);
    display::print_verdicts(&analysis.verdicts);
    display::print_plan(&analysis.plan);
    Ok(())
}

/// `airtightctl run`
pub fn run(config: &AirtightConfig, options: &RunOptions) -> Result<()> {
    let privilege = ensure_privilege(options.no_elevate)?;
    let show = !options.json;

    if show {
        display::print_banner("INTERACTIVE ANALYSIS");
        display::print_phase("Phase 1: System Audit...");
    }
    let profile = acquire_profile(options.profile.as_deref(), show)?;
    let samples = sample_window(config, show);
    let analysis = Analysis::from_window(profile, samples, &config.policy);

    if show {
        display::print_summary(&analysis.summary);
        display::print_plan(&analysis.plan);
    }

    let decision = apply_if_approved(&SystemRunner, config, privilege, &analysis, || {
        if options.yes {
            return Ok(true);
        }
        let question = "Apply recommended optimizations?";
        if options.json {
            // Keep stdout pure JSON
            let stdin = io::stdin();
            Ok(prompt::confirm_with(&mut stdin.lock(), &mut io::stderr(), question)?)
        } else {
            Ok(prompt::confirm(question)?)
        }
    })?;

    if show {
        match &decision {
            ApplyDecision::NothingToDo => {
                println!("\n[OK] No optimizations required. System is AirTIGHT.")
            }
            ApplyDecision::Declined => println!("[*] No changes applied."),
            ApplyDecision::Applied(report) => display::print_execution_report(report),
        }
    }
    finish_run(options, analysis, decision.into_report())
}

fn finish_run(
    options: &RunOptions,
    analysis: Analysis,
    report: Option<ExecutionReport>,
) -> Result<()> {
    if options.json {
        print_json(&RunRecord { analysis, report })?;
    }
    Ok(())
}

/// `airtightctl rollback`
pub fn rollback(config: &AirtightConfig, yes: bool) -> Result<()> {
    let privilege = ensure_privilege(false)?;

    if !yes {
        println!("Files that may be restored:");
        for path in config.paths.managed_files() {
            println!("  {}", path.display());
        }
        if !prompt::confirm("Restore the pre-AirTIGHT configuration?")? {
            println!("[*] Rollback cancelled. No changes were made.");
            return Ok(());
        }
    }

    let entries = airtight_common::rollback::rollback(&config.paths, privilege)?;
    display::print_rollback(&entries);
    println!("\nReboot to return kernel modules to their previous settings.");
    Ok(())
}
