//! Remediation Executor
//!
//! Applies a [`Plan`] top to bottom. Each remediation maps to one handler;
//! a handler failure becomes that remediation's outcome and the rest of the
//! plan still runs. Every handler checks persisted state first and does
//! nothing (no write, no backup, no reload) when its settings are already in
//! place.

mod coexistence;
mod persist;
mod power_save;
mod scheduler;

pub use coexistence::{coexistence_fix, CoexistenceFix};
pub use persist::{backup_path, block_present, persist_block, PersistOutcome};
pub use power_save::AUDIO_POWER_SAVE_BLOCK;
pub use scheduler::{PriorityBackend, RT_LIMITS_BLOCK};

use crate::command_exec::CommandRunner;
use crate::config::{PathSettings, SchedulerSettings};
use crate::decision::{Plan, RemediationId};
use crate::error::{AirtightError, Result};
use crate::privilege::Privilege;
use crate::profile::SystemProfile;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of a single remediation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    AlreadyApplied,
    Skipped(String),
    Failed(String),
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Applied => write!(f, "applied"),
            Outcome::AlreadyApplied => write!(f, "already applied"),
            Outcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            Outcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// What happened to one remediation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationResult {
    pub remediation: RemediationId,
    pub outcome: Outcome,

    /// Step-by-step details for the report
    pub notes: Vec<String>,

    /// Kernel or login-level changes need a reboot/re-login
    pub reboot_required: bool,
}

impl RemediationResult {
    fn new(remediation: RemediationId) -> Self {
        Self {
            remediation,
            outcome: Outcome::Applied,
            notes: Vec::new(),
            reboot_required: false,
        }
    }

    fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    fn finish(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Non-fatal step error: recorded, remediation continues
    fn degraded(&mut self, err: AirtightError) {
        if err.is_benign() {
            info!("{}: {}", self.remediation, err);
        } else {
            warn!("{}: {}", self.remediation, err);
        }
        self.note(err.to_string());
    }
}

/// Results in plan order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub results: Vec<RemediationResult>,
}

impl ExecutionReport {
    pub fn get(&self, id: RemediationId) -> Option<&RemediationResult> {
        self.results.iter().find(|r| r.remediation == id)
    }

    pub fn reboot_recommended(&self) -> bool {
        self.results.iter().any(|r| r.reboot_required)
    }

    pub fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
            .count()
    }

    pub fn all_already_applied(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.outcome == Outcome::AlreadyApplied)
    }
}

/// Applies plans through a [`CommandRunner`]
pub struct RemediationExecutor<'a, R: CommandRunner> {
    runner: &'a R,
    paths: &'a PathSettings,
    scheduler: &'a SchedulerSettings,
    privilege: Privilege,
}

impl<'a, R: CommandRunner> RemediationExecutor<'a, R> {
    pub fn new(
        runner: &'a R,
        paths: &'a PathSettings,
        scheduler: &'a SchedulerSettings,
        privilege: Privilege,
    ) -> Self {
        Self {
            runner,
            paths,
            scheduler,
            privilege,
        }
    }

    /// Apply every remediation in `plan`, in order.
    ///
    /// Fails only when privilege is missing, before anything is touched.
    pub fn apply(&self, plan: &Plan, profile: &SystemProfile) -> Result<ExecutionReport> {
        if !self.privilege.is_elevated() {
            return Err(AirtightError::PrivilegeRequired);
        }

        let mut report = ExecutionReport::default();
        for id in plan.iter() {
            info!("Executing: {}", id.title());
            let result = match id {
                RemediationId::BoostScheduler => {
                    scheduler::boost_scheduler(self.runner, self.paths, self.scheduler)
                }
                RemediationId::FixBluetoothCoexistence => {
                    coexistence::fix_bluetooth_coexistence(self.runner, self.paths, profile)
                }
                RemediationId::DisableAudioPowerSave => {
                    power_save::disable_audio_power_save(self.runner, self.paths)
                }
            };
            info!("{}: {}", id, result.outcome);
            report.results.push(result);
        }

        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingRunner;
    use super::*;
    use crate::profile::{InitSystem, Vendor};
    use std::fs;
    use tempfile::TempDir;

    fn profile() -> SystemProfile {
        SystemProfile {
            vendor_name: Vendor::Intel,
            init_system: InitSystem::Systemd,
            audio_server: "PipeWire".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unprivileged_apply_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        let scheduler = SchedulerSettings::default();
        let runner = RecordingRunner::default();
        let executor =
            RemediationExecutor::new(&runner, &paths, &scheduler, Privilege::Unprivileged);

        let plan = Plan::from_requests([RemediationId::DisableAudioPowerSave]);
        let err = executor.apply(&plan, &profile()).unwrap_err();
        assert!(matches!(err, AirtightError::PrivilegeRequired));
        assert!(runner.calls().is_empty());
        assert!(!paths.audio_conf().exists());
    }

    #[test]
    fn test_empty_plan_empty_report() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        let scheduler = SchedulerSettings::default();
        let runner = RecordingRunner::default();
        let executor = RemediationExecutor::new(&runner, &paths, &scheduler, Privilege::Elevated);

        let report = executor.apply(&Plan::default(), &profile()).unwrap();
        assert!(report.results.is_empty());
        assert!(!report.reboot_recommended());
    }

    #[test]
    fn test_failure_does_not_stop_plan() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        // Limits dir is a file: the scheduler boost cannot persist
        fs::create_dir_all(temp.path().join("etc/security")).unwrap();
        fs::write(&paths.limits_dir, "not a directory").unwrap();

        let scheduler = SchedulerSettings::default();
        let runner = RecordingRunner::default();
        let executor = RemediationExecutor::new(&runner, &paths, &scheduler, Privilege::Elevated);

        let plan = Plan::from_requests([
            RemediationId::BoostScheduler,
            RemediationId::DisableAudioPowerSave,
        ]);
        let report = executor.apply(&plan, &profile()).unwrap();

        assert_eq!(report.results.len(), 2);
        assert!(matches!(
            report.get(RemediationId::BoostScheduler).unwrap().outcome,
            Outcome::Failed(_)
        ));
        assert_eq!(
            report.get(RemediationId::DisableAudioPowerSave).unwrap().outcome,
            Outcome::Applied
        );
        assert_eq!(report.failures(), 1);
    }

    #[test]
    fn test_report_follows_plan_order() {
        let temp = TempDir::new().unwrap();
        let paths = PathSettings::rooted_at(temp.path());
        let scheduler = SchedulerSettings::default();
        let runner = RecordingRunner::default();
        let executor = RemediationExecutor::new(&runner, &paths, &scheduler, Privilege::Elevated);

        let plan = Plan::from_requests([
            RemediationId::DisableAudioPowerSave,
            RemediationId::FixBluetoothCoexistence,
            RemediationId::BoostScheduler,
        ]);
        let report = executor.apply(&plan, &profile()).unwrap();
        let order: Vec<RemediationId> = report.results.iter().map(|r| r.remediation).collect();
        assert_eq!(order, plan.as_slice());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&Outcome::Skipped("no tweaks".into())).unwrap();
        assert_eq!(json, r#"{"kind":"skipped","reason":"no tweaks"}"#);
        let json = serde_json::to_string(&Outcome::AlreadyApplied).unwrap();
        assert_eq!(json, r#"{"kind":"already_applied"}"#);
    }
}
