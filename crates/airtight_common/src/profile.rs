//! System profile - static host facts gathered once per run
//!
//! The profile is produced by the audit in `airtightctl` (or loaded from a
//! JSON file) and is read-only afterwards. Any value that cannot be
//! recognised collapses to an `Unknown` sentinel instead of being absent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Wireless chipset vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Vendor {
    Realtek,
    Intel,
    MediaTek,
    Qualcomm,
    Broadcom,
    #[default]
    Unknown,
}

impl Vendor {
    pub const ALL: [Vendor; 5] = [
        Vendor::Realtek,
        Vendor::Intel,
        Vendor::MediaTek,
        Vendor::Qualcomm,
        Vendor::Broadcom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::Realtek => "Realtek",
            Vendor::Intel => "Intel",
            Vendor::MediaTek => "MediaTek",
            Vendor::Qualcomm => "Qualcomm",
            Vendor::Broadcom => "Broadcom",
            Vendor::Unknown => "Unknown",
        }
    }

    /// PCI vendor id as printed by `lspci -nn` (lowercase hex)
    pub fn pci_id(&self) -> Option<&'static str> {
        match self {
            Vendor::Realtek => Some("10ec"),
            Vendor::Intel => Some("8086"),
            Vendor::MediaTek => Some("14c3"),
            Vendor::Qualcomm => Some("168c"),
            Vendor::Broadcom => Some("14e4"),
            Vendor::Unknown => None,
        }
    }

    /// Case-insensitive name lookup, anything else is `Unknown`
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(name))
            .unwrap_or(Vendor::Unknown)
    }
}

impl From<String> for Vendor {
    fn from(name: String) -> Self {
        Vendor::from_name(&name)
    }
}

impl From<Vendor> for String {
    fn from(vendor: Vendor) -> Self {
        vendor.as_str().to_string()
    }
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Service manager used to restart daemons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum InitSystem {
    Systemd,
    OpenRC,
    Runit,
    #[default]
    Unknown,
}

impl InitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitSystem::Systemd => "Systemd",
            InitSystem::OpenRC => "OpenRC",
            InitSystem::Runit => "Runit",
            InitSystem::Unknown => "Unknown",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "systemd" => InitSystem::Systemd,
            "openrc" => InitSystem::OpenRC,
            "runit" => InitSystem::Runit,
            _ => InitSystem::Unknown,
        }
    }

    /// Command restarting `service`, or `None` when no manager is known
    pub fn restart_command(&self, service: &str) -> Option<(&'static str, Vec<String>)> {
        match self {
            InitSystem::Systemd => Some((
                "systemctl",
                vec!["restart".to_string(), service.to_string()],
            )),
            InitSystem::OpenRC => Some((
                "rc-service",
                vec![service.to_string(), "restart".to_string()],
            )),
            InitSystem::Runit => Some(("sv", vec!["restart".to_string(), service.to_string()])),
            InitSystem::Unknown => None,
        }
    }
}

impl From<String> for InitSystem {
    fn from(name: String) -> Self {
        InitSystem::from_name(&name)
    }
}

impl From<InitSystem> for String {
    fn from(init: InitSystem) -> Self {
        init.as_str().to_string()
    }
}

impl std::fmt::Display for InitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const UNKNOWN: &str = "Unknown";

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Static facts about the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemProfile {
    /// Wireless chipset vendor
    #[serde(default)]
    pub vendor_name: Vendor,

    /// Detected init system
    #[serde(default)]
    pub init_system: InitSystem,

    /// Active audio server (matched case-insensitively)
    #[serde(default = "unknown")]
    pub audio_server: String,

    /// Packages providing tools that were not found
    #[serde(default)]
    pub missing_dependencies: BTreeSet<String>,

    /// Distribution description
    #[serde(default = "unknown")]
    pub distro: String,

    /// The lspci line the vendor was matched from
    #[serde(default)]
    pub chip_id: Option<String>,
}

impl Default for SystemProfile {
    fn default() -> Self {
        Self {
            vendor_name: Vendor::Unknown,
            init_system: InitSystem::Unknown,
            audio_server: unknown(),
            missing_dependencies: BTreeSet::new(),
            distro: unknown(),
            chip_id: None,
        }
    }
}

impl SystemProfile {
    /// Load a profile record from JSON, filling gaps with `Unknown`
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let mut profile: SystemProfile = serde_json::from_str(json)?;
        if profile.audio_server.trim().is_empty() {
            profile.audio_server = unknown();
        }
        Ok(profile)
    }

    pub fn is_ready(&self) -> bool {
        self.missing_dependencies.is_empty()
    }
}
