//! Velocity detector - thresholds on the tracker's rolling counters

use async_trait::async_trait;
use fraudguard_core::{FlagKind, OperationRequest, RiskFlag, Severity};
use serde::{Deserialize, Serialize};

use crate::error::SignalResult;
use crate::traits::{ActorHistory, SignalDetector};

/// Velocity thresholds and the score each tier contributes.
///
/// Tiers within one window are exclusive (the highest matching tier wins);
/// the three windows contribute independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityConfig {
    #[serde(default = "default_hour_critical")]
    pub hour_critical: u32,
    #[serde(default = "default_hour_critical_score")]
    pub hour_critical_score: u8,
    #[serde(default = "default_hour_high")]
    pub hour_high: u32,
    #[serde(default = "default_hour_high_score")]
    pub hour_high_score: u8,
    #[serde(default = "default_day_high")]
    pub day_high: u32,
    #[serde(default = "default_day_high_score")]
    pub day_high_score: u8,
    #[serde(default = "default_day_medium")]
    pub day_medium: u32,
    #[serde(default = "default_day_medium_score")]
    pub day_medium_score: u8,
    #[serde(default = "default_week_high")]
    pub week_high: u32,
    #[serde(default = "default_week_high_score")]
    pub week_high_score: u8,
}

fn default_hour_critical() -> u32 {
    5
}
fn default_hour_critical_score() -> u8 {
    40
}
fn default_hour_high() -> u32 {
    3
}
fn default_hour_high_score() -> u8 {
    25
}
fn default_day_high() -> u32 {
    10
}
fn default_day_high_score() -> u8 {
    30
}
fn default_day_medium() -> u32 {
    5
}
fn default_day_medium_score() -> u8 {
    15
}
fn default_week_high() -> u32 {
    20
}
fn default_week_high_score() -> u8 {
    25
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            hour_critical: default_hour_critical(),
            hour_critical_score: default_hour_critical_score(),
            hour_high: default_hour_high(),
            hour_high_score: default_hour_high_score(),
            day_high: default_day_high(),
            day_high_score: default_day_high_score(),
            day_medium: default_day_medium(),
            day_medium_score: default_day_medium_score(),
            week_high: default_week_high(),
            week_high_score: default_week_high_score(),
        }
    }
}

/// Flags actors whose recent event counts cross configured tiers
#[derive(Debug, Default)]
pub struct VelocityDetector {
    config: VelocityConfig,
}

impl VelocityDetector {
    pub fn new(config: VelocityConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SignalDetector for VelocityDetector {
    fn name(&self) -> &str {
        "velocity"
    }

    async fn detect(
        &self,
        _request: &OperationRequest,
        history: &ActorHistory,
    ) -> SignalResult<Vec<RiskFlag>> {
        let Some(window) = &history.velocity else {
            return Ok(Vec::new());
        };
        let cfg = &self.config;
        let mut flags = Vec::new();

        let hour = window.hour.count();
        if hour >= cfg.hour_critical {
            flags.push(
                RiskFlag::new(
                    FlagKind::Velocity,
                    Severity::Critical,
                    format!("{} events in the last hour", hour),
                    cfg.hour_critical_score,
                )
                .with_evidence(serde_json::json!({ "hour_count": hour })),
            );
        } else if hour >= cfg.hour_high {
            flags.push(
                RiskFlag::new(
                    FlagKind::Velocity,
                    Severity::High,
                    format!("{} events in the last hour", hour),
                    cfg.hour_high_score,
                )
                .with_evidence(serde_json::json!({ "hour_count": hour })),
            );
        }

        let day = window.day.count();
        if day >= cfg.day_high {
            flags.push(
                RiskFlag::new(
                    FlagKind::Velocity,
                    Severity::High,
                    format!("{} events in the last 24h", day),
                    cfg.day_high_score,
                )
                .with_evidence(serde_json::json!({ "day_count": day })),
            );
        } else if day >= cfg.day_medium {
            flags.push(
                RiskFlag::new(
                    FlagKind::Velocity,
                    Severity::Medium,
                    format!("{} events in the last 24h", day),
                    cfg.day_medium_score,
                )
                .with_evidence(serde_json::json!({ "day_count": day })),
            );
        }

        let week = window.week.count();
        if week >= cfg.week_high {
            flags.push(
                RiskFlag::new(
                    FlagKind::Velocity,
                    Severity::High,
                    format!("{} events in the last 7 days", week),
                    cfg.week_high_score,
                )
                .with_evidence(serde_json::json!({ "week_count": week })),
            );
        }

        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fraudguard_core::{EventKind, OperationKind};
    use fraudguard_velocity::VelocityWindow;
    use rust_decimal_macros::dec;

    fn request() -> OperationRequest {
        OperationRequest::new(OperationKind::Refund, "T-1", "CUST-001", "PAY-1", dec!(20))
    }

    fn window_with(count: u32) -> VelocityWindow {
        let now = Utc::now();
        let mut w = VelocityWindow::new(now);
        for _ in 0..count {
            w.record_at(EventKind::Refund, dec!(10), now);
        }
        w
    }

    #[tokio::test]
    async fn test_no_history_no_flags() {
        let detector = VelocityDetector::default();
        let flags = detector.detect(&request(), &ActorHistory::new()).await.unwrap();
        assert!(flags.is_empty());
    }

    #[tokio::test]
    async fn test_below_thresholds_no_flags() {
        let detector = VelocityDetector::default();
        let history = ActorHistory::new().with_velocity(window_with(2));
        let flags = detector.detect(&request(), &history).await.unwrap();
        assert!(flags.is_empty());
    }

    #[tokio::test]
    async fn test_hour_high_tier() {
        let detector = VelocityDetector::default();
        let history = ActorHistory::new().with_velocity(window_with(3));
        let flags = detector.detect(&request(), &history).await.unwrap();

        // hour high fires; day is still below its medium tier
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::High);
        assert_eq!(flags[0].score, 25);
    }

    #[tokio::test]
    async fn test_hour_critical_takes_precedence_over_high() {
        let detector = VelocityDetector::default();
        let history = ActorHistory::new().with_velocity(window_with(6));
        let flags = detector.detect(&request(), &history).await.unwrap();

        let hour_flags: Vec<_> = flags
            .iter()
            .filter(|f| f.description.contains("last hour"))
            .collect();
        assert_eq!(hour_flags.len(), 1);
        assert_eq!(hour_flags[0].severity, Severity::Critical);
        assert_eq!(hour_flags[0].score, 40);

        // 6 in a day also crosses the day medium tier
        assert!(flags.iter().any(|f| f.description.contains("24h")));
    }

    #[tokio::test]
    async fn test_week_tier() {
        let detector = VelocityDetector::default();
        let history = ActorHistory::new().with_velocity(window_with(20));
        let flags = detector.detect(&request(), &history).await.unwrap();

        assert!(flags.iter().any(|f| f.description.contains("7 days") && f.score == 25));
    }
}
