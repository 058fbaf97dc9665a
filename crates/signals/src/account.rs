//! Account-history detector - new accounts and abnormal refund ratios

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fraudguard_core::{FlagKind, OperationRequest, RiskFlag, Severity};
use serde::{Deserialize, Serialize};

use crate::error::SignalResult;
use crate::traits::{ActorHistory, SignalDetector};

/// Account-history thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountHistoryConfig {
    /// Accounts first seen within this many hours are "new"
    #[serde(default = "default_new_account_hours")]
    pub new_account_hours: i64,
    #[serde(default = "default_new_account_score")]
    pub new_account_score: u8,
    /// Refund:payment ratio above this is abnormal (percentage, 50 = 0.5)
    #[serde(default = "default_refund_ratio_percent")]
    pub refund_ratio_percent: u32,
    /// Minimum refunds recorded before the ratio check applies
    #[serde(default = "default_min_refunds")]
    pub min_refunds: u32,
    #[serde(default = "default_refund_ratio_score")]
    pub refund_ratio_score: u8,
}

fn default_new_account_hours() -> i64 {
    24
}
fn default_new_account_score() -> u8 {
    15
}
fn default_refund_ratio_percent() -> u32 {
    50
}
fn default_min_refunds() -> u32 {
    2
}
fn default_refund_ratio_score() -> u8 {
    30
}

impl Default for AccountHistoryConfig {
    fn default() -> Self {
        Self {
            new_account_hours: default_new_account_hours(),
            new_account_score: default_new_account_score(),
            refund_ratio_percent: default_refund_ratio_percent(),
            min_refunds: default_min_refunds(),
            refund_ratio_score: default_refund_ratio_score(),
        }
    }
}

/// Flags accounts with little history and accounts that refund far more
/// than they pay
#[derive(Debug, Default)]
pub struct AccountHistoryDetector {
    config: AccountHistoryConfig,
}

impl AccountHistoryDetector {
    pub fn new(config: AccountHistoryConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SignalDetector for AccountHistoryDetector {
    fn name(&self) -> &str {
        "account_history"
    }

    async fn detect(
        &self,
        _request: &OperationRequest,
        history: &ActorHistory,
    ) -> SignalResult<Vec<RiskFlag>> {
        let cfg = &self.config;
        let mut flags = Vec::new();

        if let Some(first_seen) = history.first_seen {
            let age = Utc::now() - first_seen;
            if age < Duration::hours(cfg.new_account_hours) {
                flags.push(
                    RiskFlag::new(
                        FlagKind::AccountHistory,
                        Severity::Medium,
                        "first activity less than 24h ago",
                        cfg.new_account_score,
                    )
                    .with_evidence(serde_json::json!({
                        "account_age_minutes": age.num_minutes(),
                    })),
                );
            }
        }

        if let Some(window) = &history.velocity {
            let refunds = window.week.refunds;
            let payments = window.week.payments;
            // Ratio is only meaningful once a couple of refunds exist; with
            // zero payments any refund activity counts as exceeding it.
            if refunds >= cfg.min_refunds {
                let exceeded = if payments == 0 {
                    true
                } else {
                    refunds * 100 > payments * cfg.refund_ratio_percent
                };
                if exceeded {
                    flags.push(
                        RiskFlag::new(
                            FlagKind::AccountHistory,
                            Severity::High,
                            format!("abnormal refund ratio: {} refunds vs {} payments", refunds, payments),
                            cfg.refund_ratio_score,
                        )
                        .with_evidence(serde_json::json!({
                            "refunds_week": refunds,
                            "payments_week": payments,
                        })),
                    );
                }
            }
        }

        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::{EventKind, OperationKind};
    use fraudguard_velocity::VelocityWindow;
    use rust_decimal_macros::dec;

    fn request() -> OperationRequest {
        OperationRequest::new(OperationKind::Refund, "T-1", "CUST-001", "PAY-1", dec!(20))
    }

    fn window(payments: u32, refunds: u32, age: Duration) -> VelocityWindow {
        let start = Utc::now() - age;
        let mut w = VelocityWindow::new(start);
        for _ in 0..payments {
            w.record_at(EventKind::Payment, dec!(10), start);
        }
        for _ in 0..refunds {
            w.record_at(EventKind::Refund, dec!(10), start);
        }
        w
    }

    #[tokio::test]
    async fn test_new_account_flagged() {
        let detector = AccountHistoryDetector::default();
        let history = ActorHistory::new().with_velocity(window(1, 0, Duration::hours(2)));
        let flags = detector.detect(&request(), &history).await.unwrap();

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::Medium);
        assert_eq!(flags[0].score, 15);
    }

    #[tokio::test]
    async fn test_old_account_not_flagged() {
        let detector = AccountHistoryDetector::default();
        let history = ActorHistory::new().with_velocity(window(1, 0, Duration::days(90)));
        let flags = detector.detect(&request(), &history).await.unwrap();
        assert!(flags.is_empty());
    }

    #[tokio::test]
    async fn test_single_refund_no_ratio_flag() {
        let detector = AccountHistoryDetector::default();
        let history = ActorHistory::new().with_velocity(window(0, 1, Duration::days(90)));
        let flags = detector.detect(&request(), &history).await.unwrap();
        assert!(flags.is_empty());
    }

    #[tokio::test]
    async fn test_refunds_without_payments_flagged() {
        let detector = AccountHistoryDetector::default();
        let history = ActorHistory::new().with_velocity(window(0, 3, Duration::days(90)));
        let flags = detector.detect(&request(), &history).await.unwrap();

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::High);
        assert_eq!(flags[0].score, 30);
    }

    #[tokio::test]
    async fn test_ratio_above_half_flagged() {
        let detector = AccountHistoryDetector::default();
        // 3 refunds vs 4 payments: 0.75 > 0.5
        let history = ActorHistory::new().with_velocity(window(4, 3, Duration::days(90)));
        let flags = detector.detect(&request(), &history).await.unwrap();
        assert_eq!(flags.len(), 1);
    }

    #[tokio::test]
    async fn test_healthy_ratio_not_flagged() {
        let detector = AccountHistoryDetector::default();
        // 2 refunds vs 10 payments: 0.2
        let history = ActorHistory::new().with_velocity(window(10, 2, Duration::days(90)));
        let flags = detector.detect(&request(), &history).await.unwrap();
        assert!(flags.is_empty());
    }
}
