//! AirTIGHT Common - audio health telemetry, decision engine and remediation
//!
//! Leaf-first: the sampler produces samples, a window aggregates into a
//! summary, the decision engine turns profile + summary into a plan, and the
//! executor applies the plan idempotently.

pub mod analysis;
pub mod command_exec;
pub mod config;
pub mod decision;
pub mod error;
pub mod privilege;
pub mod profile;
pub mod remediation;
pub mod rollback;
pub mod sampler;
pub mod telemetry;

pub use analysis::Analysis;
pub use command_exec::{CommandOutput, CommandRunner, SystemRunner};
pub use config::{AirtightConfig, PathSettings, SamplingSettings, SchedulerSettings};
pub use decision::{evaluate, DecisionPolicy, Plan, RemediationId, RuleVerdict, PRIORITY_ORDER};
pub use error::{AirtightError, Result};
pub use privilege::Privilege;
pub use profile::{InitSystem, SystemProfile, Vendor};
pub use remediation::{ExecutionReport, Outcome, RemediationExecutor, RemediationResult};
pub use rollback::{rollback, RollbackAction, RollbackEntry};
pub use sampler::{PwTopCounter, ResourceGauge, Sampler, SysinfoGauge, UnderrunCounter};
pub use telemetry::{HealthStatus, TelemetrySample, TelemetrySummary};

/// Separator for terminal reports
pub const SEPARATOR: &str = "============================================================";
pub const THIN_SEPARATOR: &str = "------------------------------------------------------------";
