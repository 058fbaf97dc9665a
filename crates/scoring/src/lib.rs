//! Fraudguard risk scorer
//!
//! Aggregates detector flags into one bounded score and a categorical
//! recommendation. Thresholds are configuration data, never hard-coded:
//! payment and refund paths carry separate cut points.

pub mod config;
pub mod scorer;

pub use config::{ScoringConfig, Thresholds};
pub use scorer::RiskScorer;
