//! Amount detector - high-value and suspiciously round amounts

use async_trait::async_trait;
use fraudguard_core::{FlagKind, OperationKind, OperationRequest, RiskFlag, Severity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SignalResult;
use crate::traits::{ActorHistory, SignalDetector};

/// Amount bands, tenant-agnostic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountConfig {
    /// Refunds at or above this amount are flagged high
    #[serde(default = "default_refund_high")]
    pub refund_high: Decimal,
    #[serde(default = "default_refund_high_score")]
    pub refund_high_score: u8,
    /// Payments at or above this amount are flagged critical
    #[serde(default = "default_payment_critical")]
    pub payment_critical: Decimal,
    #[serde(default = "default_payment_critical_score")]
    pub payment_critical_score: u8,
    /// Round amounts at or above this are slightly suspicious
    #[serde(default = "default_round_floor")]
    pub round_floor: Decimal,
    /// Modulo base for the roundness check
    #[serde(default = "default_round_modulo")]
    pub round_modulo: Decimal,
    #[serde(default = "default_round_score")]
    pub round_score: u8,
}

fn default_refund_high() -> Decimal {
    Decimal::new(1_000, 0)
}
fn default_refund_high_score() -> u8 {
    30
}
fn default_payment_critical() -> Decimal {
    Decimal::new(100_000, 0)
}
fn default_payment_critical_score() -> u8 {
    40
}
fn default_round_floor() -> Decimal {
    Decimal::new(500, 0)
}
fn default_round_modulo() -> Decimal {
    Decimal::new(100, 0)
}
fn default_round_score() -> u8 {
    5
}

impl Default for AmountConfig {
    fn default() -> Self {
        Self {
            refund_high: default_refund_high(),
            refund_high_score: default_refund_high_score(),
            payment_critical: default_payment_critical(),
            payment_critical_score: default_payment_critical_score(),
            round_floor: default_round_floor(),
            round_modulo: default_round_modulo(),
            round_score: default_round_score(),
        }
    }
}

/// Flags amounts above per-operation bands plus round high amounts
#[derive(Debug, Default)]
pub struct AmountDetector {
    config: AmountConfig,
}

impl AmountDetector {
    pub fn new(config: AmountConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SignalDetector for AmountDetector {
    fn name(&self) -> &str {
        "amount"
    }

    async fn detect(
        &self,
        request: &OperationRequest,
        _history: &ActorHistory,
    ) -> SignalResult<Vec<RiskFlag>> {
        let cfg = &self.config;
        let mut flags = Vec::new();

        match request.operation {
            OperationKind::Refund if request.amount >= cfg.refund_high => {
                flags.push(
                    RiskFlag::new(
                        FlagKind::Amount,
                        Severity::High,
                        format!("refund amount {} above high band", request.amount),
                        cfg.refund_high_score,
                    )
                    .with_evidence(serde_json::json!({
                        "amount": request.amount.to_string(),
                        "band": cfg.refund_high.to_string(),
                    })),
                );
            }
            OperationKind::Payment if request.amount >= cfg.payment_critical => {
                flags.push(
                    RiskFlag::new(
                        FlagKind::Amount,
                        Severity::Critical,
                        format!("payment amount {} above critical band", request.amount),
                        cfg.payment_critical_score,
                    )
                    .with_evidence(serde_json::json!({
                        "amount": request.amount.to_string(),
                        "band": cfg.payment_critical.to_string(),
                    })),
                );
            }
            _ => {}
        }

        if request.amount >= cfg.round_floor
            && (request.amount % cfg.round_modulo) == Decimal::ZERO
        {
            flags.push(RiskFlag::new(
                FlagKind::Amount,
                Severity::Low,
                format!("suspiciously round amount {}", request.amount),
                cfg.round_score,
            ));
        }

        Ok(flags)
    }
}
