//! Risk assessments - the scorer's immutable output
//!
//! Recommendations follow a total order for aggregation and comparison:
//! `Approve < Review < Deny`. The most restrictive outcome always wins.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::flag::RiskFlag;

/// Categorical recommendation, ordered least to most restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve = 0,
    Review = 1,
    Deny = 2,
}

impl PartialOrd for Recommendation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Recommendation {
    fn cmp(&self, other: &Self) -> Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Approve => "approve",
            Recommendation::Review => "review",
            Recommendation::Deny => "deny",
        }
    }
}

/// Aggregated risk verdict for a single request
///
/// Created fresh per evaluation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Sum of flag scores, clamped to [0, 100]
    pub score: u8,
    pub flags: Vec<RiskFlag>,
    pub recommendation: Recommendation,
    pub requires_approval: bool,
    /// Largest amount the policy would wave through without review
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_allowed_amount: Option<Decimal>,
    /// Advisory delay before retrying a flagged operation; not enforced here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooling_period_minutes: Option<u32>,
}

impl RiskAssessment {
    /// Zero-risk assessment (no flags, approve)
    pub fn clean() -> Self {
        Self {
            score: 0,
            flags: Vec::new(),
            recommendation: Recommendation::Approve,
            requires_approval: false,
            max_allowed_amount: None,
            cooling_period_minutes: None,
        }
    }

    /// Fail-closed assessment used when evaluation could not complete:
    /// score forced to 100 and the operation denied.
    pub fn fail_closed(reason: impl Into<String>) -> Self {
        Self {
            score: 100,
            flags: Vec::new(),
            recommendation: Recommendation::Deny,
            requires_approval: false,
            max_allowed_amount: None,
            cooling_period_minutes: None,
        }
        .with_failure_note(reason)
    }

    fn with_failure_note(mut self, reason: impl Into<String>) -> Self {
        use crate::flag::{FlagKind, Severity};
        self.flags.push(RiskFlag::new(
            FlagKind::Pattern,
            Severity::Critical,
            format!("evaluation failed, denying: {}", reason.into()),
            100,
        ));
        self
    }

    pub fn is_deny(&self) -> bool {
        self.recommendation == Recommendation::Deny
    }

    pub fn is_review(&self) -> bool {
        self.recommendation == Recommendation::Review
    }

    pub fn is_approve(&self) -> bool {
        self.recommendation == Recommendation::Approve
    }
}
