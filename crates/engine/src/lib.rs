//! Fraudguard risk engine
//!
//! The orchestrator that ties the pipeline together:
//!
//! ```text
//! OperationRequest
//!   │ validate ─► authorize ─► record velocity
//!   ▼
//! ActorHistory (velocity, origin, chargebacks, instrument)
//!   │ detect (all signals) ─► score (thresholds)
//!   ▼
//! approve │ park for approval │ deny      ── every path audited
//! ```
//!
//! Detector failures never fail open: an evaluation that cannot complete
//! is denied with a full-score assessment.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use context::{Decision, OperationOutcome, Principal};
pub use engine::RiskEngine;
pub use error::{EngineError, EngineResult};

// The approval resolution enum is part of the engine's public surface.
pub use fraudguard_approval::Resolution;
