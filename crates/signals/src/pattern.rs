//! Pattern/device detector - client signature and network-origin anomalies

use async_trait::async_trait;
use fraudguard_core::{FlagKind, OperationRequest, RiskFlag, Severity};
use serde::{Deserialize, Serialize};

use crate::error::SignalResult;
use crate::traits::{ActorHistory, SignalDetector};

/// Client-signature and origin thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// User agents shorter than this are suspicious
    #[serde(default = "default_min_ua_len")]
    pub min_ua_len: usize,
    #[serde(default = "default_missing_ua_score")]
    pub missing_ua_score: u8,
    #[serde(default = "default_short_ua_score")]
    pub short_ua_score: u8,
    /// Substrings that mark an automated client
    #[serde(default = "default_automation_signatures")]
    pub automation_signatures: Vec<String>,
    #[serde(default = "default_automation_score")]
    pub automation_score: u8,
    /// Requests from one origin in 24h before the high tier fires
    #[serde(default = "default_origin_high")]
    pub origin_high: u32,
    #[serde(default = "default_origin_high_score")]
    pub origin_high_score: u8,
    /// Requests from one origin in 24h before the critical tier fires
    #[serde(default = "default_origin_critical")]
    pub origin_critical: u32,
    #[serde(default = "default_origin_critical_score")]
    pub origin_critical_score: u8,
    #[serde(default = "default_blocked_origin_score")]
    pub blocked_origin_score: u8,
}

fn default_min_ua_len() -> usize {
    20
}
fn default_missing_ua_score() -> u8 {
    15
}
fn default_short_ua_score() -> u8 {
    10
}
fn default_automation_signatures() -> Vec<String> {
    ["bot", "crawler", "spider", "curl", "python-requests", "headless"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_automation_score() -> u8 {
    30
}
fn default_origin_high() -> u32 {
    5
}
fn default_origin_high_score() -> u8 {
    20
}
fn default_origin_critical() -> u32 {
    10
}
fn default_origin_critical_score() -> u8 {
    35
}
fn default_blocked_origin_score() -> u8 {
    35
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            min_ua_len: default_min_ua_len(),
            missing_ua_score: default_missing_ua_score(),
            short_ua_score: default_short_ua_score(),
            automation_signatures: default_automation_signatures(),
            automation_score: default_automation_score(),
            origin_high: default_origin_high(),
            origin_high_score: default_origin_high_score(),
            origin_critical: default_origin_critical(),
            origin_critical_score: default_origin_critical_score(),
            blocked_origin_score: default_blocked_origin_score(),
        }
    }
}

/// Flags missing/short user agents, automation signatures, repeated and
/// block-listed network origins
#[derive(Debug, Default)]
pub struct PatternDetector {
    config: PatternConfig,
}

impl PatternDetector {
    pub fn new(config: PatternConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SignalDetector for PatternDetector {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn detect(
        &self,
        request: &OperationRequest,
        history: &ActorHistory,
    ) -> SignalResult<Vec<RiskFlag>> {
        let cfg = &self.config;
        let mut flags = Vec::new();

        match request.user_agent.as_deref() {
            None | Some("") => {
                flags.push(RiskFlag::new(
                    FlagKind::Pattern,
                    Severity::Medium,
                    "missing user agent",
                    cfg.missing_ua_score,
                ));
            }
            Some(ua) => {
                let lowered = ua.to_lowercase();
                if let Some(sig) = cfg
                    .automation_signatures
                    .iter()
                    .find(|sig| lowered.contains(sig.as_str()))
                {
                    flags.push(
                        RiskFlag::new(
                            FlagKind::Pattern,
                            Severity::High,
                            format!("automation signature in user agent: {}", sig),
                            cfg.automation_score,
                        )
                        .with_evidence(serde_json::json!({ "user_agent": ua })),
                    );
                } else if ua.len() < cfg.min_ua_len {
                    flags.push(
                        RiskFlag::new(
                            FlagKind::Pattern,
                            Severity::Medium,
                            "unusually short user agent",
                            cfg.short_ua_score,
                        )
                        .with_evidence(serde_json::json!({ "user_agent": ua })),
                    );
                }
            }
        }

        if history.origin_blocked {
            flags.push(RiskFlag::new(
                FlagKind::Pattern,
                Severity::Critical,
                "request from block-listed network origin",
                cfg.blocked_origin_score,
            ));
        }

        let origin = history.origin_requests_24h;
        if origin >= cfg.origin_critical {
            flags.push(
                RiskFlag::new(
                    FlagKind::Pattern,
                    Severity::Critical,
                    format!("{} requests from the same origin in 24h", origin),
                    cfg.origin_critical_score,
                )
                .with_evidence(serde_json::json!({ "origin_requests_24h": origin })),
            );
        } else if origin >= cfg.origin_high {
            flags.push(
                RiskFlag::new(
                    FlagKind::Pattern,
                    Severity::High,
                    format!("{} requests from the same origin in 24h", origin),
                    cfg.origin_high_score,
                )
                .with_evidence(serde_json::json!({ "origin_requests_24h": origin })),
            );
        }

        Ok(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::OperationKind;
    use rust_decimal_macros::dec;

    const NORMAL_UA: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

    fn request(ua: Option<&str>) -> OperationRequest {
        let req = OperationRequest::new(OperationKind::Payment, "T-1", "CUST-001", "PAY-1", dec!(50));
        match ua {
            Some(ua) => req.with_user_agent(ua),
            None => req,
        }
    }

    #[tokio::test]
    async fn test_normal_ua_clean() {
        let detector = PatternDetector::default();
        let flags = detector
            .detect(&request(Some(NORMAL_UA)), &ActorHistory::new())
            .await
            .unwrap();
        assert!(flags.is_empty());
    }

    #[tokio::test]
    async fn test_missing_ua() {
        let detector = PatternDetector::default();
        let flags = detector.detect(&request(None), &ActorHistory::new()).await.unwrap();

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::Medium);
        assert_eq!(flags[0].score, 15);
    }

    #[tokio::test]
    async fn test_short_ua() {
        let detector = PatternDetector::default();
        let flags = detector
            .detect(&request(Some("curl-ish")), &ActorHistory::new())
            .await
            .unwrap();

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].score, 10);
    }

    #[tokio::test]
    async fn test_bot_signature() {
        let detector = PatternDetector::default();
        let flags = detector
            .detect(
                &request(Some("Googlebot/2.1 (+http://www.google.com/bot.html)")),
                &ActorHistory::new(),
            )
            .await
            .unwrap();

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::High);
        assert_eq!(flags[0].score, 30);
    }

    #[tokio::test]
    async fn test_repeated_origin_tiers() {
        let detector = PatternDetector::default();

        let history = ActorHistory::new().with_origin(5, false);
        let flags = detector.detect(&request(Some(NORMAL_UA)), &history).await.unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].score, 20);

        let history = ActorHistory::new().with_origin(12, false);
        let flags = detector.detect(&request(Some(NORMAL_UA)), &history).await.unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::Critical);
        assert_eq!(flags[0].score, 35);
    }

    #[tokio::test]
    async fn test_blocked_origin() {
        let detector = PatternDetector::default();
        let history = ActorHistory::new().with_origin(1, true);
        let flags = detector.detect(&request(Some(NORMAL_UA)), &history).await.unwrap();

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].severity, Severity::Critical);
        assert!(flags[0].description.contains("block-listed"));
    }
}
