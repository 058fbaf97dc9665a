//! Payment-instrument detector - extension point for instrument-level risk

use async_trait::async_trait;
use fraudguard_core::{FlagKind, OperationRequest, RiskFlag, Severity};
use serde::{Deserialize, Serialize};

use crate::error::SignalResult;
use crate::traits::{ActorHistory, SignalDetector};

/// Instrument classification supplied by an external enrichment source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentClass {
    Standard,
    Prepaid,
    Virtual,
    HighRisk,
}

/// Emits instrument flags only when classification data was resolved;
/// without external data it emits nothing.
#[derive(Debug, Default)]
pub struct InstrumentDetector;

#[async_trait]
impl SignalDetector for InstrumentDetector {
    fn name(&self) -> &str {
        "instrument"
    }

    async fn detect(
        &self,
        _request: &OperationRequest,
        history: &ActorHistory,
    ) -> SignalResult<Vec<RiskFlag>> {
        let flags = match history.instrument {
            Some(InstrumentClass::Prepaid) | Some(InstrumentClass::Virtual) => {
                vec![RiskFlag::new(
                    FlagKind::Instrument,
                    Severity::Medium,
                    "prepaid or virtual payment instrument",
                    20,
                )]
            }
            Some(InstrumentClass::HighRisk) => {
                vec![RiskFlag::new(
                    FlagKind::Instrument,
                    Severity::High,
                    "high-risk payment instrument",
                    30,
                )]
            }
            Some(InstrumentClass::Standard) | None => Vec::new(),
        };
        Ok(flags)
    }
}
