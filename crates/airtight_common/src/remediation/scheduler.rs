//! RT scheduler boost
//!
//! Grants the audio group real-time scheduling and memory locking through a
//! PAM limits file, then raises the priority of running audio-path
//! processes. RTKit is preferred when installed; otherwise renice/ionice.

use super::persist::{persist_block, PersistOutcome};
use super::{Outcome, RemediationResult};
use crate::command_exec::CommandRunner;
use crate::config::{PathSettings, SchedulerSettings};
use crate::decision::RemediationId;
use crate::error::AirtightError;
use tracing::{debug, info};

pub const RT_LIMITS_BLOCK: &str = "# AirTIGHT Real-Time Audio Limits\n\
@audio   -   rtprio   95\n\
@audio   -   memlock  unlimited\n\
@audio   -   nice    -15\n";

/// How priorities are raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityBackend {
    /// Ask the RealtimeKit daemon
    RtKit,
    /// renice + ionice directly
    Manual,
}

impl PriorityBackend {
    pub fn detect<R: CommandRunner>(runner: &R) -> Self {
        if runner.is_available("rtkitctl") {
            PriorityBackend::RtKit
        } else {
            PriorityBackend::Manual
        }
    }
}

fn pids_of<R: CommandRunner>(runner: &R, name: &str) -> Result<Vec<String>, AirtightError> {
    let output = runner.run("pgrep", &["-x", name])?;
    // pgrep exits 1 when nothing matches
    if !output.success() {
        return Ok(Vec::new());
    }
    Ok(output
        .stdout
        .split_whitespace()
        .filter(|pid| pid.chars().all(|c| c.is_ascii_digit()))
        .map(|pid| pid.to_string())
        .collect())
}

fn boost_pid<R: CommandRunner>(
    runner: &R,
    backend: PriorityBackend,
    pid: &str,
) -> Result<(), AirtightError> {
    let steps: Vec<(&str, Vec<&str>)> = match backend {
        PriorityBackend::RtKit => vec![("rtkitctl", vec!["set-rtprio", pid, "10"])],
        PriorityBackend::Manual => vec![
            ("renice", vec!["-n", "-12", "-p", pid]),
            ("ionice", vec!["-c", "2", "-n", "0", "-p", pid]),
        ],
    };

    for (program, args) in steps {
        let output = runner.run(program, &args)?;
        if !output.success() {
            return Err(AirtightError::ReloadFailed(format!(
                "{} for PID {}: {}",
                program,
                pid,
                output.failure_summary()
            )));
        }
    }
    Ok(())
}

pub(super) fn boost_scheduler<R: CommandRunner>(
    runner: &R,
    paths: &PathSettings,
    settings: &SchedulerSettings,
) -> RemediationResult {
    let mut result = RemediationResult::new(RemediationId::BoostScheduler);
    let limits = paths.limits_conf();

    // Limits persist across reboots, process priorities do not
    let outcome = match persist_block(&limits, RT_LIMITS_BLOCK) {
        Ok(PersistOutcome::AlreadyPresent) => {
            info!("RT limits already in place: {}", limits.display());
            result.note(format!("RT limits already present in {}", limits.display()));
            Outcome::AlreadyApplied
        }
        Ok(PersistOutcome::Written { backup }) => {
            if let Some(backup) = backup {
                result.note(format!("Backup created: {}", backup.display()));
            }
            result.note(format!(
                "RT limits written: {} (re-login required)",
                limits.display()
            ));
            result.reboot_required = true;
            Outcome::Applied
        }
        Err(e) => {
            result.degraded(e);
            return result.finish(Outcome::Failed(format!(
                "could not write {}",
                limits.display()
            )));
        }
    };

    if !runner.is_available("pgrep") {
        result.degraded(AirtightError::DependencyMissing("pgrep".to_string()));
        return result.finish(outcome);
    }

    let backend = PriorityBackend::detect(runner);
    debug!("Priority backend: {:?}", backend);

    let mut boosted = 0usize;
    for target in &settings.targets {
        let pids = match pids_of(runner, target) {
            Ok(pids) => pids,
            Err(e) => {
                result.degraded(e);
                continue;
            }
        };
        for pid in pids {
            match boost_pid(runner, backend, &pid) {
                Ok(()) => {
                    boosted += 1;
                    result.note(format!("PID {} ({}) boosted via {:?}", pid, target, backend));
                }
                Err(e) => result.degraded(e),
            }
        }
    }

    if boosted == 0 {
        result.note("No running audio processes boosted");
    }
    result.finish(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_exec::CommandOutput;
    use crate::remediation::backup_path;
    use crate::remediation::testing::RecordingRunner;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_manual_boost_fallback() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        let runner = RecordingRunner::default()
            .without("rtkitctl")
            .respond("pgrep -x pipewire", CommandOutput::ok("101\n102\n"))
            .respond("pgrep -x wireplumber", CommandOutput::failed(1, ""))
            .respond("pgrep -x bluetoothd", CommandOutput::failed(1, ""));

        let result = boost_scheduler(&runner, &paths, &SchedulerSettings::default());

        assert_eq!(result.outcome, Outcome::Applied);
        assert!(runner.called("renice -n -12 -p 101"));
        assert!(runner.called("ionice -c 2 -n 0 -p 102"));
        assert!(!runner.called("rtkitctl"));
        assert_eq!(fs::read_to_string(paths.limits_conf()).unwrap(), RT_LIMITS_BLOCK);
        assert!(backup_path(&paths.limits_conf()).exists());
    }

    #[test]
    fn test_rtkit_preferred() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        let runner = RecordingRunner::default()
            .respond("pgrep -x pipewire", CommandOutput::ok("77\n"));
        let settings = SchedulerSettings {
            targets: vec!["pipewire".to_string()],
        };

        let result = boost_scheduler(&runner, &paths, &settings);
        assert_eq!(result.outcome, Outcome::Applied);
        assert!(runner.called("rtkitctl set-rtprio 77 10"));
        assert!(!runner.called("renice"));
    }

    #[test]
    fn test_existing_limits_still_boost_processes() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        fs::create_dir_all(&paths.limits_dir).unwrap();
        fs::write(paths.limits_conf(), RT_LIMITS_BLOCK).unwrap();

        let runner = RecordingRunner::default()
            .without("rtkitctl")
            .respond("pgrep -x pipewire", CommandOutput::ok("314\n"));
        let settings = SchedulerSettings {
            targets: vec!["pipewire".to_string()],
        };
        let result = boost_scheduler(&runner, &paths, &settings);

        assert_eq!(result.outcome, Outcome::AlreadyApplied);
        assert!(!result.reboot_required);
        assert!(runner.called("renice -n -12 -p 314"));
        assert!(runner.called("ionice -c 2 -n 0 -p 314"));
        assert_eq!(fs::read_to_string(paths.limits_conf()).unwrap(), RT_LIMITS_BLOCK);
        assert!(!backup_path(&paths.limits_conf()).exists());
    }

    #[test]
    fn test_failed_boost_is_noted_not_fatal() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        let runner = RecordingRunner::default()
            .without("rtkitctl")
            .respond("pgrep -x pipewire", CommandOutput::ok("5\n"))
            .respond("renice -n -12 -p 5", CommandOutput::failed(1, "permission denied"));
        let settings = SchedulerSettings {
            targets: vec!["pipewire".to_string()],
        };

        let result = boost_scheduler(&runner, &paths, &settings);
        assert_eq!(result.outcome, Outcome::Applied);
        assert!(result.notes.iter().any(|n| n.contains("permission denied")));
    }
}
