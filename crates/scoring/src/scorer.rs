//! Risk scorer
//!
//! Pure aggregation: sum flag contributions, clamp to 0..=100, map the
//! total through the per-operation threshold table. No I/O here.

use fraudguard_core::{
    FlagKind, OperationKind, Recommendation, RiskAssessment, RiskFlag, Role, Severity,
};

use crate::config::ScoringConfig;

/// Maps a set of detector flags to a bounded score and a recommendation.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScoringConfig,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Aggregate flags into an assessment for one operation.
    ///
    /// The score is the saturating sum of flag scores clamped to 100.
    /// Approval is required whenever the recommendation is not an
    /// unconditional approve, and also for low-score requests made by
    /// the lowest-privilege role once they cross the approval band.
    pub fn score(
        &self,
        operation: OperationKind,
        flags: Vec<RiskFlag>,
        requester_role: Role,
    ) -> RiskAssessment {
        if flags.is_empty() {
            return RiskAssessment::clean();
        }

        let total: u32 = flags.iter().map(|f| f.score as u32).sum();
        let score = total.min(100) as u8;

        let thresholds = self.config.thresholds(operation);
        let recommendation = if score >= thresholds.deny {
            Recommendation::Deny
        } else if score >= thresholds.review {
            Recommendation::Review
        } else {
            Recommendation::Approve
        };

        let requires_approval = recommendation > Recommendation::Approve
            || (score >= thresholds.customer_approval && requester_role.is_lowest());

        let cooling_period_minutes = if self.has_hot_velocity(&flags) {
            Some(self.config.cooling_period_minutes)
        } else {
            None
        };

        let max_allowed_amount = if recommendation > Recommendation::Approve {
            Some(thresholds.max_allowed_amount)
        } else {
            None
        };

        tracing::debug!(
            operation = operation.as_str(),
            score,
            recommendation = recommendation.as_str(),
            flags = flags.len(),
            "scored operation"
        );

        RiskAssessment {
            score,
            flags,
            recommendation,
            requires_approval,
            max_allowed_amount,
            cooling_period_minutes,
        }
    }

    /// True when any velocity flag reaches high severity.
    fn has_hot_velocity(&self, flags: &[RiskFlag]) -> bool {
        flags
            .iter()
            .any(|f| f.kind == FlagKind::Velocity && f.severity >= Severity::High)
    }
}
