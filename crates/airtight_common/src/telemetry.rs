//! Telemetry - audio health samples and their window summary
//!
//! Samples are consumed immediately; nothing outlives the sampling window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CPU level above which a whole window counts as `HighCpu`
pub const SUMMARY_HIGH_CPU_PERCENT: f32 = 80.0;

/// CPU level above which a single tick counts as `HighCpu`
pub const SAMPLE_HIGH_CPU_PERCENT: f32 = 85.0;

/// Health status of a sample or a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Stable,
    HighCpu,
    UnderrunDetected,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Stable => write!(f, "Stable"),
            HealthStatus::HighCpu => write!(f, "High CPU"),
            HealthStatus::UnderrunDetected => write!(f, "Underrun"),
        }
    }
}

/// One sampling tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Global CPU usage, 0-100
    #[serde(default)]
    pub cpu_percent: f32,

    /// Memory usage, 0-100
    #[serde(default)]
    pub ram_percent: f32,

    /// Under-runs observed since the previous tick
    #[serde(default)]
    pub new_underruns: u64,

    #[serde(default)]
    pub status: HealthStatus,
}

impl TelemetrySample {
    /// Build a sample and derive its status.
    ///
    /// Under-runs take precedence over CPU load.
    pub fn new(
        timestamp: DateTime<Utc>,
        cpu_percent: f32,
        ram_percent: f32,
        new_underruns: u64,
        high_cpu_percent: f32,
    ) -> Self {
        let cpu_percent = sanitize_percent(cpu_percent);
        let status = if new_underruns > 0 {
            HealthStatus::UnderrunDetected
        } else if cpu_percent > high_cpu_percent {
            HealthStatus::HighCpu
        } else {
            HealthStatus::Stable
        };

        Self {
            timestamp,
            cpu_percent,
            ram_percent: sanitize_percent(ram_percent),
            new_underruns,
            status,
        }
    }
}

fn sanitize_percent(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Aggregate over one sampling window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    #[serde(default)]
    pub total_underruns: u64,

    #[serde(default)]
    pub peak_cpu: f32,

    #[serde(default)]
    pub status: HealthStatus,
}

impl Default for TelemetrySummary {
    fn default() -> Self {
        Self {
            total_underruns: 0,
            peak_cpu: 0.0,
            status: HealthStatus::Stable,
        }
    }
}

impl TelemetrySummary {
    /// Sum under-runs, take the CPU peak, and classify the window.
    ///
    /// An empty window is the all-zero `Stable` summary.
    pub fn from_samples(samples: &[TelemetrySample], high_cpu_percent: f32) -> Self {
        let total_underruns = samples.iter().map(|s| s.new_underruns).sum();
        let peak_cpu = samples
            .iter()
            .map(|s| sanitize_percent(s.cpu_percent))
            .fold(0.0_f32, f32::max);

        let status = if peak_cpu > high_cpu_percent {
            HealthStatus::HighCpu
        } else {
            HealthStatus::Stable
        };

        Self {
            total_underruns,
            peak_cpu,
            status,
        }
    }

    pub fn has_underruns(&self) -> bool {
        self.total_underruns > 0
    }
}
