//! One run's analysis: profile + window -> summary -> plan

use crate::decision::{DecisionPolicy, Plan, RuleVerdict};
use crate::profile::SystemProfile;
use crate::telemetry::{TelemetrySample, TelemetrySummary};
use serde::{Deserialize, Serialize};

/// Everything the decision was based on, plus the decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub profile: SystemProfile,
    pub samples: Vec<TelemetrySample>,
    pub summary: TelemetrySummary,
    pub verdicts: Vec<RuleVerdict>,
    pub plan: Plan,
}

impl Analysis {
    /// Aggregate a complete window and evaluate the rules on it
    pub fn from_window(
        profile: SystemProfile,
        samples: Vec<TelemetrySample>,
        policy: &DecisionPolicy,
    ) -> Self {
        let summary = TelemetrySummary::from_samples(&samples, policy.high_cpu_percent);
        let verdicts = policy.explain(&profile, &summary);
        let plan = policy.evaluate(&profile, &summary);
        Self {
            profile,
            samples,
            summary,
            verdicts,
            plan,
        }
    }

    pub fn needs_action(&self) -> bool {
        !self.plan.is_empty()
    }
}
