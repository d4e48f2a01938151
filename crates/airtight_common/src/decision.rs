//! Decision Engine - telemetry and host facts to a remediation plan
//!
//! Rules are evaluated independently and never short-circuit. The result is
//! always the fixed priority list filtered to the requested remediations, so
//! ordering does not depend on rule order and nothing appears twice.
//!
//! Rules:
//! 1. CPU pressure (peak above the high-CPU threshold, or a `HighCpu`
//!    window) asks for a scheduler boost.
//! 2. Under-runs on an idle CPU with a known wireless chipset point at radio
//!    coexistence. The band between the coexistence ceiling and the high-CPU
//!    threshold proposes neither fix.
//! 3. Under-runs with a matching audio server ask for the power-save fix.

use crate::profile::{SystemProfile, Vendor};
use crate::telemetry::{HealthStatus, TelemetrySummary, SUMMARY_HIGH_CPU_PERCENT};
use serde::{Deserialize, Serialize};

/// Remediations AirTIGHT knows how to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationId {
    BoostScheduler,
    FixBluetoothCoexistence,
    DisableAudioPowerSave,
}

/// Execution priority. CPU starvation first, then the coexistence fix,
/// then the least invasive audio-only change.
pub const PRIORITY_ORDER: [RemediationId; 3] = [
    RemediationId::BoostScheduler,
    RemediationId::FixBluetoothCoexistence,
    RemediationId::DisableAudioPowerSave,
];

impl RemediationId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemediationId::BoostScheduler => "boost_scheduler",
            RemediationId::FixBluetoothCoexistence => "fix_bluetooth_coexistence",
            RemediationId::DisableAudioPowerSave => "disable_audio_power_save",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            RemediationId::BoostScheduler => "Apply RT scheduler boost",
            RemediationId::FixBluetoothCoexistence => "Apply Bluetooth/Wi-Fi coexistence fix",
            RemediationId::DisableAudioPowerSave => "Disable audio power save",
        }
    }
}

impl std::fmt::Display for RemediationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered, duplicate-free subsequence of [`PRIORITY_ORDER`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Plan(Vec<RemediationId>);

impl Plan {
    /// Build a plan from any set of requests, in any order, with repeats
    pub fn from_requests<I>(requested: I) -> Self
    where
        I: IntoIterator<Item = RemediationId>,
    {
        let requested: Vec<RemediationId> = requested.into_iter().collect();
        Plan(
            PRIORITY_ORDER
                .iter()
                .copied()
                .filter(|id| requested.contains(id))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, id: RemediationId) -> bool {
        self.0.contains(&id)
    }

    pub fn first(&self) -> Option<RemediationId> {
        self.0.first().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = RemediationId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[RemediationId] {
        &self.0
    }

    /// Text block listing the recommendations
    pub fn recommendations(&self) -> String {
        if self.is_empty() {
            return "[OK] System is stable. No optimization required.".to_string();
        }
        let mut report = vec!["[!] AirTIGHT recommendations:".to_string()];
        for id in self.iter() {
            report.push(format!("  -> {}", id.title()));
        }
        report.join("\n")
    }
}

impl<'de> Deserialize<'de> for Plan {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let ids = Vec::<RemediationId>::deserialize(deserializer)?;
        Ok(Plan::from_requests(ids))
    }
}

/// Thresholds and match lists the rules read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPolicy {
    /// Peak CPU above which the scheduler boost is proposed
    #[serde(default = "default_high_cpu")]
    pub high_cpu_percent: f32,

    /// Peak CPU must stay below this for the coexistence fix
    #[serde(default = "default_coexistence_ceiling")]
    pub coexistence_cpu_ceiling: f32,

    /// Chipset vendors with a coexistence fix
    #[serde(default = "default_coexistence_vendors")]
    pub coexistence_vendors: Vec<Vendor>,

    /// Audio-server substrings (case-insensitive) that enable the power-save fix
    #[serde(default = "default_power_save_servers")]
    pub power_save_audio_servers: Vec<String>,
}

fn default_high_cpu() -> f32 {
    SUMMARY_HIGH_CPU_PERCENT
}

fn default_coexistence_ceiling() -> f32 {
    60.0
}

fn default_coexistence_vendors() -> Vec<Vendor> {
    vec![Vendor::Realtek, Vendor::Intel, Vendor::Broadcom]
}

fn default_power_save_servers() -> Vec<String> {
    vec!["pipewire".to_string()]
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            high_cpu_percent: default_high_cpu(),
            coexistence_cpu_ceiling: default_coexistence_ceiling(),
            coexistence_vendors: default_coexistence_vendors(),
            power_save_audio_servers: default_power_save_servers(),
        }
    }
}

impl DecisionPolicy {
    fn cpu_pressure(&self, summary: &TelemetrySummary) -> bool {
        summary.peak_cpu > self.high_cpu_percent || summary.status == HealthStatus::HighCpu
    }

    fn coexistence_suspected(&self, profile: &SystemProfile, summary: &TelemetrySummary) -> bool {
        summary.has_underruns()
            && summary.peak_cpu < self.coexistence_cpu_ceiling
            && self.coexistence_vendors.contains(&profile.vendor_name)
    }

    fn matching_audio_server(&self, profile: &SystemProfile) -> Option<&str> {
        let server = profile.audio_server.to_lowercase();
        self.power_save_audio_servers
            .iter()
            .find(|needle| !needle.is_empty() && server.contains(&needle.to_lowercase()))
            .map(|s| s.as_str())
    }

    fn power_save_suspected(&self, profile: &SystemProfile, summary: &TelemetrySummary) -> bool {
        summary.has_underruns() && self.matching_audio_server(profile).is_some()
    }

    /// Evaluate all rules. Pure: same inputs, same plan.
    pub fn evaluate(&self, profile: &SystemProfile, summary: &TelemetrySummary) -> Plan {
        let mut requested = Vec::new();

        if self.cpu_pressure(summary) {
            requested.push(RemediationId::BoostScheduler);
        }
        if self.coexistence_suspected(profile, summary) {
            requested.push(RemediationId::FixBluetoothCoexistence);
        }
        if self.power_save_suspected(profile, summary) {
            requested.push(RemediationId::DisableAudioPowerSave);
        }

        Plan::from_requests(requested)
    }

    /// Per-rule verdicts for dry runs
    pub fn explain(&self, profile: &SystemProfile, summary: &TelemetrySummary) -> Vec<RuleVerdict> {
        let boost_reason = if summary.peak_cpu > self.high_cpu_percent {
            format!(
                "peak CPU {:.1}% above {:.0}%",
                summary.peak_cpu, self.high_cpu_percent
            )
        } else if summary.status == HealthStatus::HighCpu {
            "window reported high CPU".to_string()
        } else {
            format!(
                "peak CPU {:.1}% within {:.0}%",
                summary.peak_cpu, self.high_cpu_percent
            )
        };

        let coex_reason = if !summary.has_underruns() {
            "no under-runs in window".to_string()
        } else if summary.peak_cpu >= self.coexistence_cpu_ceiling {
            format!(
                "peak CPU {:.1}% not below {:.0}%, radio contention unlikely",
                summary.peak_cpu, self.coexistence_cpu_ceiling
            )
        } else if !self.coexistence_vendors.contains(&profile.vendor_name) {
            format!("no coexistence fix for vendor {}", profile.vendor_name)
        } else {
            format!(
                "{} under-runs at {:.1}% CPU on {} chipset",
                summary.total_underruns, summary.peak_cpu, profile.vendor_name
            )
        };

        let power_reason = match (summary.has_underruns(), self.matching_audio_server(profile)) {
            (false, _) => "no under-runs in window".to_string(),
            (true, Some(needle)) => format!(
                "{} under-runs with audio server {} (matches '{}')",
                summary.total_underruns, profile.audio_server, needle
            ),
            (true, None) => format!("audio server {} not targeted", profile.audio_server),
        };

        vec![
            RuleVerdict {
                remediation: RemediationId::BoostScheduler,
                fired: self.cpu_pressure(summary),
                reason: boost_reason,
            },
            RuleVerdict {
                remediation: RemediationId::FixBluetoothCoexistence,
                fired: self.coexistence_suspected(profile, summary),
                reason: coex_reason,
            },
            RuleVerdict {
                remediation: RemediationId::DisableAudioPowerSave,
                fired: self.power_save_suspected(profile, summary),
                reason: power_reason,
            },
        ]
    }
}

/// Outcome of one rule in explain mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub remediation: RemediationId,
    pub fired: bool,
    pub reason: String,
}

/// Evaluate with the default policy
pub fn evaluate(profile: &SystemProfile, summary: &TelemetrySummary) -> Plan {
    DecisionPolicy::default().evaluate(profile, summary)
}
