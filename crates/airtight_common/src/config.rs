//! AirTIGHT Configuration
//!
//! Configuration lives in /etc/airtight/config.toml. Every field has a
//! default, so a missing file (or a partial one) is always usable.

use crate::decision::DecisionPolicy;
use crate::error::{AirtightError, Result};
use crate::telemetry::SAMPLE_HIGH_CPU_PERCENT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// System configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/airtight";
const CONFIG_FILE: &str = "config.toml";

/// Sampling window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingSettings {
    /// Ticks per window (valid: 1-60)
    #[serde(default = "default_ticks")]
    pub ticks: u32,

    /// Pause between ticks in milliseconds (valid: 100-10000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Per-tick CPU level reported as high load
    #[serde(default = "default_sample_high_cpu")]
    pub sample_high_cpu_percent: f32,
}

fn default_ticks() -> u32 {
    5
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_sample_high_cpu() -> f32 {
    SAMPLE_HIGH_CPU_PERCENT
}

impl SamplingSettings {
    pub fn effective_ticks(&self) -> u32 {
        self.ticks.clamp(1, 60)
    }

    pub fn effective_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.clamp(100, 10_000))
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            interval_ms: default_interval_ms(),
            sample_high_cpu_percent: default_sample_high_cpu(),
        }
    }
}

/// Scheduler boost settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Process names on the audio path
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,
}

fn default_targets() -> Vec<String> {
    vec![
        "pipewire".to_string(),
        "wireplumber".to_string(),
        "bluetoothd".to_string(),
    ]
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            targets: default_targets(),
        }
    }
}

/// Locations of everything the executor reads or writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_modprobe_dir")]
    pub modprobe_dir: PathBuf,

    #[serde(default = "default_limits_dir")]
    pub limits_dir: PathBuf,

    /// Loaded-module table
    #[serde(default = "default_proc_modules")]
    pub proc_modules: PathBuf,
}

fn default_modprobe_dir() -> PathBuf {
    PathBuf::from("/etc/modprobe.d")
}

fn default_limits_dir() -> PathBuf {
    PathBuf::from("/etc/security/limits.d")
}

fn default_proc_modules() -> PathBuf {
    PathBuf::from("/proc/modules")
}

impl PathSettings {
    /// Bluetooth/Wi-Fi coexistence module options
    pub fn coexistence_conf(&self) -> PathBuf {
        self.modprobe_dir.join("airtight_coex.conf")
    }

    /// Audio controller power-save module options
    pub fn audio_conf(&self) -> PathBuf {
        self.modprobe_dir.join("airtight_audio.conf")
    }

    /// PAM real-time limits for the audio group
    pub fn limits_conf(&self) -> PathBuf {
        self.limits_dir.join("airtight_audio.conf")
    }

    /// Every file AirTIGHT may write, in plan order
    pub fn managed_files(&self) -> Vec<PathBuf> {
        vec![self.limits_conf(), self.coexistence_conf(), self.audio_conf()]
    }

    /// Paths rooted somewhere else, for tests and chroots
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            modprobe_dir: root.join("etc/modprobe.d"),
            limits_dir: root.join("etc/security/limits.d"),
            proc_modules: root.join("proc/modules"),
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            modprobe_dir: default_modprobe_dir(),
            limits_dir: default_limits_dir(),
            proc_modules: default_proc_modules(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AirtightConfig {
    #[serde(default)]
    pub sampling: SamplingSettings,

    #[serde(default)]
    pub policy: DecisionPolicy,

    #[serde(default)]
    pub scheduler: SchedulerSettings,

    #[serde(default)]
    pub paths: PathSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AirtightConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| AirtightError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AirtightError::Config(e.to_string()))
    }
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    PathBuf::from(SYSTEM_CONFIG_DIR).join(CONFIG_FILE)
}
