//! Scoring thresholds - configurable per operation
//!
//! All cut points can be overridden via config file; defaults are the
//! production policy. Refunds run slightly stricter than payments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fraudguard_core::OperationKind;

/// Cut points for one operation path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Score at or above this denies outright
    pub deny: u8,
    /// Score at or above this requires human review
    pub review: u8,
    /// Score at or above this requires approval for the lowest-privilege role
    pub customer_approval: u8,
    /// Advisory ceiling reported when the recommendation is not approve
    pub max_allowed_amount: Decimal,
}

/// Per-operation threshold tables plus the cooling-off policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_payment_thresholds")]
    pub payment: Thresholds,
    #[serde(default = "default_refund_thresholds")]
    pub refund: Thresholds,
    /// Flat cooling-off attached when high-severity velocity flags appear
    #[serde(default = "default_cooling_minutes")]
    pub cooling_period_minutes: u32,
}

fn default_payment_thresholds() -> Thresholds {
    Thresholds {
        deny: 70,
        review: 40,
        customer_approval: 20,
        max_allowed_amount: Decimal::new(100_000, 0),
    }
}

fn default_refund_thresholds() -> Thresholds {
    Thresholds {
        deny: 65,
        review: 35,
        customer_approval: 20,
        max_allowed_amount: Decimal::new(1_000, 0),
    }
}

fn default_cooling_minutes() -> u32 {
    60
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            payment: default_payment_thresholds(),
            refund: default_refund_thresholds(),
            cooling_period_minutes: default_cooling_minutes(),
        }
    }
}

impl ScoringConfig {
    /// Threshold table for one operation
    pub fn thresholds(&self, operation: OperationKind) -> &Thresholds {
        match operation {
            OperationKind::Payment => &self.payment,
            OperationKind::Refund => &self.refund,
        }
    }

    /// Load from a JSON config file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_tables() {
        let config = ScoringConfig::default();

        assert_eq!(config.payment.deny, 70);
        assert_eq!(config.payment.review, 40);
        assert_eq!(config.refund.deny, 65);
        assert_eq!(config.refund.review, 35);
        assert_eq!(config.cooling_period_minutes, 60);
        assert_eq!(config.refund.max_allowed_amount, dec!(1000));
    }

    #[test]
    fn test_thresholds_lookup() {
        let config = ScoringConfig::default();
        assert_eq!(config.thresholds(OperationKind::Payment).deny, 70);
        assert_eq!(config.thresholds(OperationKind::Refund).deny, 65);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "cooling_period_minutes": 120 }"#;
        let config: ScoringConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.cooling_period_minutes, 120);
        assert_eq!(config.payment.deny, 70);
    }

    #[test]
    fn test_round_trip() {
        let config = ScoringConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ScoringConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.payment, config.payment);
    }
}
