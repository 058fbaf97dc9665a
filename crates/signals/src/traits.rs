//! Detector trait and the pre-resolved history handed to detectors

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fraudguard_core::{OperationRequest, RiskFlag};
use fraudguard_velocity::VelocityWindow;

use crate::error::SignalResult;
use crate::instrument::InstrumentClass;

/// Everything a detector may consult about the requesting actor.
///
/// Assembled by the orchestrator before detection so detectors stay pure:
/// velocity comes from the tracker, chargeback data from the external
/// cache, blocklist membership from the engine's origin set. Fields that
/// could not be resolved stay `None`/zero and the corresponding detectors
/// simply emit nothing.
#[derive(Debug, Clone, Default)]
pub struct ActorHistory {
    /// Rolling counters for the requesting actor, post-increment
    pub velocity: Option<VelocityWindow>,
    /// First observed activity for the actor
    pub first_seen: Option<DateTime<Utc>>,
    /// Requests seen from the same network origin in the last 24h
    pub origin_requests_24h: u32,
    /// Whether the network origin is on the blocklist
    pub origin_blocked: bool,
    /// Externally supplied chargeback risk score for the subject (0-100)
    pub chargeback_risk_score: Option<u8>,
    /// Chargeback incidents recorded against the actor in the last 30 days
    pub chargeback_flags_30d: u32,
    /// Payment-instrument classification, when instrument data is available
    pub instrument: Option<InstrumentClass>,
}

impl ActorHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_velocity(mut self, window: VelocityWindow) -> Self {
        self.first_seen = Some(window.first_seen);
        self.velocity = Some(window);
        self
    }

    pub fn with_origin(mut self, requests_24h: u32, blocked: bool) -> Self {
        self.origin_requests_24h = requests_24h;
        self.origin_blocked = blocked;
        self
    }

    pub fn with_chargeback(mut self, risk_score: Option<u8>, flags_30d: u32) -> Self {
        self.chargeback_risk_score = risk_score;
        self.chargeback_flags_30d = flags_30d;
        self
    }

    pub fn with_instrument(mut self, class: InstrumentClass) -> Self {
        self.instrument = Some(class);
        self
    }
}

/// A single independent risk signal evaluator
///
/// Detectors are pure per call: same request and history, same flags.
/// An `Err` means the detector could not evaluate at all; the registry
/// surfaces it so the decision path can fail closed.
#[async_trait]
pub trait SignalDetector: Send + Sync {
    /// Detector name for logging and flag attribution
    fn name(&self) -> &str;

    /// Evaluate one request; emit zero or more weighted flags
    async fn detect(
        &self,
        request: &OperationRequest,
        history: &ActorHistory,
    ) -> SignalResult<Vec<RiskFlag>>;
}
