//! Fraudguard risk signal detectors
//!
//! Each detector is an independent, stateless-per-call evaluator that looks
//! at one facet of a request and emits zero or more weighted [`RiskFlag`]s:
//!
//! ```text
//! OperationRequest + ActorHistory
//!         │
//!         ▼
//! ┌──────────────────┐
//! │ DetectorRegistry │──► velocity, amount, pattern,
//! │ (in order)       │    chargeback, account_history, instrument
//! └────────┬─────────┘
//!          │ Vec<RiskFlag>
//!          ▼
//!      Risk Scorer
//! ```
//!
//! Detectors never perform I/O: external risk data (chargeback cache,
//! instrument classification, blocklist membership) arrives pre-resolved in
//! [`ActorHistory`]. A detector error aborts the run so the caller can fail
//! closed.
//!
//! [`RiskFlag`]: fraudguard_core::RiskFlag

pub mod account;
pub mod amount;
pub mod blocklist;
pub mod cache;
pub mod chargeback;
pub mod error;
pub mod instrument;
pub mod pattern;
pub mod registry;
pub mod traits;
pub mod velocity;

pub use account::{AccountHistoryConfig, AccountHistoryDetector};
pub use amount::{AmountConfig, AmountDetector};
pub use blocklist::OriginBlocklist;
pub use cache::ChargebackCache;
pub use chargeback::{ChargebackConfig, ChargebackDetector};
pub use error::{SignalError, SignalResult};
pub use instrument::{InstrumentClass, InstrumentDetector};
pub use pattern::{PatternConfig, PatternDetector};
pub use registry::DetectorRegistry;
pub use traits::{ActorHistory, SignalDetector};
pub use velocity::{VelocityConfig, VelocityDetector};
