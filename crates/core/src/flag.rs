//! Risk flags - discrete, weighted pieces of evidence
//!
//! Each detector emits zero or more flags; the scorer sums them. Flags are
//! immutable once created.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Flag severity, ordered from lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

/// Which detector family produced a flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Velocity,
    Amount,
    Pattern,
    Chargeback,
    AccountHistory,
    Instrument,
}

/// One weighted piece of risk evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub kind: FlagKind,
    pub severity: Severity,
    pub description: String,
    /// Contribution to the aggregate score, 0-100
    pub score: u8,
    /// Structured supporting data (counts, thresholds crossed, raw strings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Value>,
}

impl RiskFlag {
    pub fn new(
        kind: FlagKind,
        severity: Severity,
        description: impl Into<String>,
        score: u8,
    ) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
            score: score.min(100),
            evidence: None,
        }
    }

    /// Attach structured evidence
    pub fn with_evidence(mut self, evidence: serde_json::Value) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_score_capped_at_100() {
        let flag = RiskFlag::new(FlagKind::Amount, Severity::Critical, "test", 250);
        assert_eq!(flag.score, 100);
    }

    #[test]
    fn test_flag_serialization() {
        let flag = RiskFlag::new(FlagKind::Velocity, Severity::High, "6 events in 1h", 25)
            .with_evidence(serde_json::json!({ "hour_count": 6 }));

        let json = serde_json::to_string(&flag).unwrap();
        assert!(json.contains("velocity"));
        assert!(json.contains("high"));
        assert!(json.contains("hour_count"));

        let parsed: RiskFlag = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, flag);
    }

    #[test]
    fn test_evidence_omitted_when_none() {
        let flag = RiskFlag::new(FlagKind::Pattern, Severity::Medium, "short user agent", 10);
        let json = serde_json::to_string(&flag).unwrap();
        assert!(!json.contains("evidence"));
    }
}
