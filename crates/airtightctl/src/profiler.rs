//! Host audit
//!
//! Collects the static facts the decision engine reads: wireless chipset
//! vendor (from `lspci -nn`), init system, running audio server, missing
//! tools and the distribution name.

use airtight_common::command_exec::CommandRunner;
use airtight_common::profile::{InitSystem, SystemProfile, Vendor, UNKNOWN};
use std::collections::BTreeSet;
use std::fs;
use tracing::{debug, warn};

/// Tool -> package that ships it
pub const DEPENDENCIES: [(&str, &str); 3] = [
    ("lspci", "pciutils"),
    ("pw-top", "pipewire"),
    ("bluetoothctl", "bluez"),
];

/// Process name -> audio server label, first match wins
const AUDIO_SERVERS: [(&str, &str); 2] = [("pipewire", "PipeWire"), ("pulseaudio", "PulseAudio")];

/// Find the first network/wireless controller from a known vendor.
///
/// Returns the vendor and the matching line. PCI ids are matched as
/// `[vvvv:` so device ids never match as vendors.
pub fn parse_lspci(output: &str) -> (Vendor, Option<String>) {
    for line in output.lines() {
        if !(line.contains("Network") || line.contains("Wireless")) {
            continue;
        }
        let lower = line.to_lowercase();
        for vendor in Vendor::ALL {
            let Some(id) = vendor.pci_id() else {
                continue;
            };
            if lower.contains(&format!("[{}:", id)) {
                return (vendor, Some(line.trim().to_string()));
            }
        }
    }
    (Vendor::Unknown, None)
}

/// `PRETTY_NAME` from an os-release file
pub fn parse_os_release(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let value = line.strip_prefix("PRETTY_NAME=")?;
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Package-manager command for installing `missing`
pub fn install_hint<R: CommandRunner>(runner: &R, missing: &BTreeSet<String>) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    let packages = missing.iter().cloned().collect::<Vec<_>>().join(" ");
    let hint = if runner.is_available("apt") {
        format!("sudo apt install {}", packages)
    } else if runner.is_available("pacman") {
        format!("sudo pacman -S {}", packages)
    } else if runner.is_available("dnf") {
        format!("sudo dnf install {}", packages)
    } else {
        "Please install missing packages manually.".to_string()
    };
    Some(hint)
}

pub struct Profiler<'a, R: CommandRunner> {
    runner: &'a R,
}

impl<'a, R: CommandRunner> Profiler<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Run every probe. Probe failures fall back to `Unknown`.
    pub fn audit(&self) -> SystemProfile {
        let (vendor_name, chip_id) = self.detect_vendor();
        let profile = SystemProfile {
            vendor_name,
            init_system: self.detect_init_system(),
            audio_server: self.detect_audio_server(),
            missing_dependencies: self.missing_dependencies(),
            distro: self.detect_distro(),
            chip_id,
        };
        debug!("Audit complete: {:?}", profile);
        profile
    }

    pub fn detect_init_system(&self) -> InitSystem {
        if self.runner.is_available("systemctl") {
            InitSystem::Systemd
        } else if self.runner.is_available("rc-service") {
            InitSystem::OpenRC
        } else if self.runner.is_available("sv") {
            InitSystem::Runit
        } else {
            InitSystem::Unknown
        }
    }

    pub fn detect_vendor(&self) -> (Vendor, Option<String>) {
        if !self.runner.is_available("lspci") {
            return (Vendor::Unknown, None);
        }
        match self.runner.run("lspci", &["-nn"]) {
            Ok(output) if output.success() => parse_lspci(&output.stdout),
            Ok(output) => {
                warn!("lspci failed: {}", output.failure_summary());
                (Vendor::Unknown, None)
            }
            Err(e) => {
                warn!("lspci failed: {}", e);
                (Vendor::Unknown, None)
            }
        }
    }

    /// Running audio server, `ALSA` when no sound server is up
    pub fn detect_audio_server(&self) -> String {
        if !self.runner.is_available("pgrep") {
            return UNKNOWN.to_string();
        }
        for (process, label) in AUDIO_SERVERS {
            match self.runner.run("pgrep", &["-x", process]) {
                Ok(output) if output.success() => return label.to_string(),
                Ok(_) => {}
                Err(e) => debug!("pgrep {}: {}", process, e),
            }
        }
        "ALSA".to_string()
    }

    pub fn missing_dependencies(&self) -> BTreeSet<String> {
        DEPENDENCIES
            .iter()
            .filter(|(tool, _)| !self.runner.is_available(tool))
            .map(|(_, package)| package.to_string())
            .collect()
    }

    pub fn detect_distro(&self) -> String {
        if self.runner.is_available("lsb_release") {
            if let Ok(output) = self.runner.run("lsb_release", &["-sd"]) {
                let name = output.stdout.trim().trim_matches('"');
                if output.success() && !name.is_empty() {
                    return name.to_string();
                }
            }
        }
        fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| parse_os_release(&content))
            .unwrap_or_else(|| "Linux".to_string())
    }

    pub fn install_hint(&self, missing: &BTreeSet<String>) -> Option<String> {
        install_hint(self.runner, missing)
    }
}
