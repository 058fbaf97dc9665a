//! Chargeback-risk detector - external risk scores and dispute history

use async_trait::async_trait;
use fraudguard_core::{FlagKind, OperationRequest, RiskFlag, Severity};
use serde::{Deserialize, Serialize};

use crate::error::SignalResult;
use crate::traits::{ActorHistory, SignalDetector};

/// Chargeback thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargebackConfig {
    /// Cached subject score at or above this is critical
    #[serde(default = "default_score_critical")]
    pub score_critical: u8,
    #[serde(default = "default_score_critical_score")]
    pub score_critical_score: u8,
    /// Cached subject score at or above this is medium
    #[serde(default = "default_score_medium")]
    pub score_medium: u8,
    #[serde(default = "default_score_medium_score")]
    pub score_medium_score: u8,
    /// Actor chargeback incidents in 30d before the critical tier fires
    #[serde(default = "default_history_critical")]
    pub history_critical: u32,
    #[serde(default = "default_history_critical_score")]
    pub history_critical_score: u8,
    #[serde(default = "default_history_high_score")]
    pub history_high_score: u8,
}

fn default_score_critical() -> u8 {
    70
}
fn default_score_critical_score() -> u8 {
    40
}
fn default_score_medium() -> u8 {
    40
}
fn default_score_medium_score() -> u8 {
    20
}
fn default_history_critical() -> u32 {
    3
}
fn default_history_critical_score() -> u8 {
    45
}
fn default_history_high_score() -> u8 {
    25
}

impl Default for ChargebackConfig {
    fn default() -> Self {
        Self {
            score_critical: default_score_critical(),
            score_critical_score: default_score_critical_score(),
            score_medium: default_score_medium(),
            score_medium_score: default_score_medium_score(),
            history_critical: default_history_critical(),
            history_critical_score: default_history_critical_score(),
            history_high_score: default_history_high_score(),
        }
    }
}

/// Consults the pre-resolved chargeback cache score and the actor's 30-day
/// dispute history. Emits nothing when no external data is available.
#[derive(Debug, Default)]
pub struct ChargebackDetector {
    config: ChargebackConfig,
}

impl ChargebackDetector {
    pub fn new(config: ChargebackConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SignalDetector for ChargebackDetector {
    fn name(&self) -> &str {
        "chargeback"
    }

    async fn detect(
        &self,
        _request: &OperationRequest,
        history: &ActorHistory,
    ) -> SignalResult<Vec<RiskFlag>> {
        let cfg = &self.config;
        let mut flags = Vec::new();

        if let Some(score) = history.chargeback_risk_score {
            if score >= cfg.score_critical {
                flags.push(
                    RiskFlag::new(
                        FlagKind::Chargeback,
                        Severity::Critical,
                        format!("subject chargeback risk score {}", score),
                        cfg.score_critical_score,
                    )
                    .with_evidence(serde_json::json!({ "cached_score": score })),
                );
            } else if score >= cfg.score_medium {
                flags.push(
                    RiskFlag::new(
                        FlagKind::Chargeback,
                        Severity::Medium,
                        format!("subject chargeback risk score {}", score),
                        cfg.score_medium_score,
                    )
                    .with_evidence(serde_json::json!({ "cached_score": score })),
                );
            }
        }

        let incidents = history.chargeback_flags_30d;
        if incidents >= cfg.history_critical {
            flags.push(
                RiskFlag::new(
                    FlagKind::Chargeback,
                    Severity::Critical,
                    format!("{} chargeback incidents in 30 days", incidents),
                    cfg.history_critical_score,
                )
                .with_evidence(serde_json::json!({ "incidents_30d": incidents })),
            );
        } else if incidents >= 1 {
            flags.push(
                RiskFlag::new(
                    FlagKind::Chargeback,
                    Severity::High,
                    format!("{} chargeback incident(s) in 30 days", incidents),
                    cfg.history_high_score,
                )
                .with_evidence(serde_json::json!({ "incidents_30d": incidents })),
            );
        }

        Ok(flags)
    }
}
