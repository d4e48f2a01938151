//! Bluetooth/Wi-Fi coexistence fix
//!
//! Persists vendor-specific wireless module options, reloads the module when
//! it is loaded (reboot pending otherwise) and restarts Bluetooth through the
//! detected init system.

use super::persist::{persist_block, PersistOutcome};
use super::{Outcome, RemediationResult};
use crate::command_exec::CommandRunner;
use crate::config::PathSettings;
use crate::decision::RemediationId;
use crate::error::AirtightError;
use crate::profile::{SystemProfile, Vendor};
use std::fs;
use std::path::Path;
use tracing::info;

const BLUETOOTH_SERVICE: &str = "bluetooth";

/// Module options for a chipset vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoexistenceFix {
    Supported {
        /// Module reloaded after the options change
        module: &'static str,
        block: &'static str,
    },
    Unsupported,
}

pub fn coexistence_fix(vendor: Vendor) -> CoexistenceFix {
    match vendor {
        Vendor::Realtek => CoexistenceFix::Supported {
            module: "rtw88_core",
            block: "# AirTIGHT Coexistence Fix\n\
                    options rtw88_core disable_lps_deep=y\n\
                    options rtw_pci disable_aspm=y\n",
        },
        Vendor::Intel => CoexistenceFix::Supported {
            module: "iwlwifi",
            block: "# AirTIGHT Stability Fix\n\
                    options iwlwifi power_save=0\n",
        },
        Vendor::Broadcom => CoexistenceFix::Supported {
            module: "brcmfmac",
            block: "# AirTIGHT Stability Fix\n\
                    options brcmfmac roamoff=1\n",
        },
        Vendor::MediaTek | Vendor::Qualcomm | Vendor::Unknown => CoexistenceFix::Unsupported,
    }
}

/// Whether `module` appears in a /proc/modules style table
fn module_loaded(proc_modules: &Path, module: &str) -> Result<bool, AirtightError> {
    let table = fs::read_to_string(proc_modules)?;
    Ok(table
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|name| name == module))
}

fn reload_module<R: CommandRunner>(runner: &R, module: &str) -> Result<(), AirtightError> {
    if !runner.is_available("modprobe") {
        return Err(AirtightError::DependencyMissing("modprobe".to_string()));
    }
    for args in [vec!["-r", module], vec![module]] {
        let output = runner.run("modprobe", &args)?;
        if !output.success() {
            return Err(AirtightError::ReloadFailed(format!(
                "modprobe {}: {}",
                args.join(" "),
                output.failure_summary()
            )));
        }
    }
    Ok(())
}

fn restart_bluetooth<R: CommandRunner>(
    runner: &R,
    profile: &SystemProfile,
) -> Result<String, AirtightError> {
    let (program, args) = profile
        .init_system
        .restart_command(BLUETOOTH_SERVICE)
        .ok_or_else(|| AirtightError::UnknownInitSystem(profile.init_system.to_string()))?;
    if !runner.is_available(program) {
        return Err(AirtightError::DependencyMissing(program.to_string()));
    }

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let output = runner.run(program, &args)?;
    if !output.success() {
        return Err(AirtightError::ReloadFailed(format!(
            "{} {}: {}",
            program,
            args.join(" "),
            output.failure_summary()
        )));
    }
    Ok(format!(
        "Bluetooth service restarted via {}",
        profile.init_system
    ))
}

pub(super) fn fix_bluetooth_coexistence<R: CommandRunner>(
    runner: &R,
    paths: &PathSettings,
    profile: &SystemProfile,
) -> RemediationResult {
    let mut result = RemediationResult::new(RemediationId::FixBluetoothCoexistence);
    info!("Evaluating Bluetooth/Wi-Fi coexistence for {}", profile.vendor_name);

    let (module, block) = match coexistence_fix(profile.vendor_name) {
        CoexistenceFix::Supported { module, block } => (module, block),
        CoexistenceFix::Unsupported => {
            let reason = AirtightError::UnknownVendor(profile.vendor_name.to_string());
            return result.finish(Outcome::Skipped(reason.to_string()));
        }
    };

    let conf = paths.coexistence_conf();
    match persist_block(&conf, block) {
        Ok(PersistOutcome::AlreadyPresent) => {
            result.note(format!("Coexistence fix already present in {}", conf.display()));
            return result.finish(Outcome::AlreadyApplied);
        }
        Ok(PersistOutcome::Written { backup }) => {
            if let Some(backup) = backup {
                result.note(format!("Backup created: {}", backup.display()));
            }
            result.note(format!("Coexistence config written: {}", conf.display()));
        }
        Err(e) => {
            result.degraded(e);
            return result.finish(Outcome::Failed(format!("could not write {}", conf.display())));
        }
    }

    match module_loaded(&paths.proc_modules, module) {
        Ok(true) => {
            info!("Reloading {} (network may flicker)", module);
            match reload_module(runner, module) {
                Ok(()) => result.note(format!("Module {} reloaded", module)),
                Err(e) => {
                    result.reboot_required = true;
                    result.degraded(e);
                }
            }
        }
        Ok(false) => {
            result.reboot_required = true;
            result.note(format!("Module {} not loaded; reboot pending", module));
        }
        Err(e) => {
            result.reboot_required = true;
            result.degraded(e);
            result.note("Could not verify kernel module state; reboot pending");
        }
    }

    match restart_bluetooth(runner, profile) {
        Ok(note) => result.note(note),
        Err(e) => {
            result.degraded(e);
            result.note("Restart the Bluetooth service manually if needed");
        }
    }

    result.finish(Outcome::Applied)
}
