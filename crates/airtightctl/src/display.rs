//! Terminal rendering for airtightctl
//!
//! ASCII only. Colors come from owo-colors; row layout is built without
//! colors so it can be checked in tests.

use airtight_common::decision::{Plan, RuleVerdict};
use airtight_common::profile::SystemProfile;
use airtight_common::remediation::{ExecutionReport, Outcome};
use airtight_common::rollback::{RollbackAction, RollbackEntry};
use airtight_common::telemetry::{HealthStatus, TelemetrySample, TelemetrySummary};
use airtight_common::{SEPARATOR, THIN_SEPARATOR};
use owo_colors::OwoColorize;

const WIDTH: usize = 60;

/// Longest chip line shown in the audit
const CHIP_ID_MAX: usize = 45;

fn centered(text: &str) -> String {
    format!("{:^width$}", text, width = WIDTH)
}

pub fn print_banner(mode: &str) {
    println!("{}", SEPARATOR);
    println!(
        "{}",
        centered("AirTIGHT: UNIVERSAL LINUX AUDIO OPTIMIZER").bright_white().bold()
    );
    println!("{}", centered(&format!("Mode: {}", mode)).dimmed());
    println!("{}", SEPARATOR);
}

pub fn print_phase(text: &str) {
    println!("\n{} {}", "[*]".cyan(), text);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max).collect();
    format!("{}...", head)
}

pub fn print_audit(profile: &SystemProfile, install_hint: Option<&str>) {
    println!();
    println!("{}", SEPARATOR);
    println!("{}", centered("AirTIGHT UNIVERSAL AUDIT").bold());
    println!("{}", SEPARATOR);
    println!("[*] OS Distro    : {}", profile.distro);
    println!("[*] Init System  : {}", profile.init_system);
    println!("[*] Chip Vendor  : {}", profile.vendor_name);
    println!(
        "[*] Device ID    : {}",
        profile
            .chip_id
            .as_deref()
            .map(|id| truncate(id, CHIP_ID_MAX))
            .unwrap_or_else(|| "Not found".to_string())
    );
    println!("[*] Audio Server : {}", profile.audio_server);
    println!("{}", THIN_SEPARATOR);

    if profile.is_ready() {
        println!("{} System Environment: READY", "[OK]".green().bold());
    } else {
        let missing: Vec<&str> = profile
            .missing_dependencies
            .iter()
            .map(String::as_str)
            .collect();
        println!("{} Missing: {}", "[!]".yellow().bold(), missing.join(", "));
        if let Some(hint) = install_hint {
            println!("{} Run: {}", "[?]".cyan(), hint);
        }
    }
    println!("{}", SEPARATOR);
}

pub fn tracker_header(with_ram: bool) -> String {
    if with_ram {
        format!(
            "{:<10} | {:<8} | {:<8} | {:<6} | STATUS",
            "TIME", "CPU %", "RAM %", "XRUNS"
        )
    } else {
        format!("{:<10} | {:<8} | {:<6} | STATUS", "TIME", "CPU %", "XRUNS")
    }
}

fn alert_label(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::UnderrunDetected => "STUTTER",
        HealthStatus::HighCpu => "LOAD",
        HealthStatus::Stable => "ok",
    }
}

/// One tracker line without colors
pub fn tracker_row(sample: &TelemetrySample, with_ram: bool) -> String {
    let time = sample
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S")
        .to_string();
    let cpu = format!("{:.1}", sample.cpu_percent);
    if with_ram {
        format!(
            "{:<10} | {:<8} | {:<8} | {:<6} | {}",
            time,
            cpu,
            format!("{:.1}", sample.ram_percent),
            sample.new_underruns,
            alert_label(sample.status)
        )
    } else {
        format!(
            "{:<10} | {:<8} | {:<6} | {}",
            time,
            cpu,
            sample.new_underruns,
            alert_label(sample.status)
        )
    }
}

pub fn print_tracker_header(with_ram: bool) {
    println!("{}", tracker_header(with_ram).bold());
    println!("{}", THIN_SEPARATOR);
}

pub fn print_tracker_row(sample: &TelemetrySample, with_ram: bool) {
    let row = tracker_row(sample, with_ram);
    match sample.status {
        HealthStatus::UnderrunDetected => println!("{}", row.red()),
        HealthStatus::HighCpu => println!("{}", row.yellow()),
        HealthStatus::Stable => println!("{}", row),
    }
}

pub fn print_summary(summary: &TelemetrySummary) {
    println!("{}", THIN_SEPARATOR);
    println!(
        "Window: {} under-runs, peak CPU {:.1}%, status {}",
        summary.total_underruns, summary.peak_cpu, summary.status
    );
}

pub fn print_verdicts(verdicts: &[RuleVerdict]) {
    println!();
    for verdict in verdicts {
        let mark = if verdict.fired {
            "[x]".yellow().bold().to_string()
        } else {
            "[ ]".dimmed().to_string()
        };
        println!("{} {:<26} {}", mark, verdict.remediation.as_str(), verdict.reason.dimmed());
    }
}

pub fn print_plan(plan: &Plan) {
    println!();
    if plan.is_empty() {
        println!("{}", plan.recommendations().green());
    } else {
        println!("{}", plan.recommendations().yellow());
    }
}

fn outcome_mark(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Applied => "[OK]".green().bold().to_string(),
        Outcome::AlreadyApplied => "[==]".cyan().to_string(),
        Outcome::Skipped(_) => "[--]".dimmed().to_string(),
        Outcome::Failed(_) => "[!!]".red().bold().to_string(),
    }
}

pub fn print_execution_report(report: &ExecutionReport) {
    for result in &report.results {
        println!(
            "\n{} {}: {}",
            outcome_mark(&result.outcome),
            result.remediation.title(),
            result.outcome
        );
        for note in &result.notes {
            println!("     {}", note.dimmed());
        }
    }

    println!();
    println!("{}", SEPARATOR);
    if report.all_already_applied() {
        println!("{}", centered("NOTHING TO DO: SYSTEM ALREADY AirTIGHT").green());
    } else if report.failures() > 0 {
        println!(
            "{}",
            centered(&format!("COMPLETED WITH {} FAILURE(S)", report.failures())).red()
        );
    } else {
        println!("{}", centered("OPTIMIZATION COMPLETE").green().bold());
    }
    if report.reboot_recommended() {
        println!("{}", centered("Reboot recommended for kernel-level changes").yellow());
    }
    println!("{}", SEPARATOR);
}

pub fn print_rollback(entries: &[RollbackEntry]) {
    println!();
    for entry in entries {
        let (mark, text) = match &entry.action {
            RollbackAction::Restored => (
                "[OK]".green().to_string(),
                "restored from backup".to_string(),
            ),
            RollbackAction::Removed => (
                "[OK]".green().to_string(),
                "removed (did not exist before)".to_string(),
            ),
            RollbackAction::NoBackup => (
                "[--]".dimmed().to_string(),
                "no backup, untouched".to_string(),
            ),
            RollbackAction::Failed(reason) => (
                "[!!]".red().bold().to_string(),
                format!("failed, backup kept: {}", reason),
            ),
        };
        println!("{} {}: {}", mark, entry.path.display(), text);
    }
}
