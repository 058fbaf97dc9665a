//! Engine configuration - composes the per-stage policies

use fraudguard_approval::ApprovalConfig;
use fraudguard_audit::NotificationPolicy;
use fraudguard_scoring::ScoringConfig;

/// Top-level configuration for a [`RiskEngine`](crate::RiskEngine)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub approval: ApprovalConfig,
    pub notification: NotificationPolicy,

    /// In-memory audit ring capacity
    pub audit_capacity: usize,

    /// Actors idle longer than this are swept from the velocity tracker
    pub stale_actor_idle_days: i64,

    /// Chargeback incidents older than this are pruned
    pub chargeback_retention_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            approval: ApprovalConfig::default(),
            notification: NotificationPolicy::default(),
            audit_capacity: 50_000,
            stale_actor_idle_days: 7,
            chargeback_retention_days: 30,
        }
    }
}
