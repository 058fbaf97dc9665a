//! Detector registry - runs detectors in order and collects their flags

use std::sync::Arc;

use fraudguard_core::{OperationRequest, RiskFlag};

use crate::account::AccountHistoryDetector;
use crate::amount::AmountDetector;
use crate::chargeback::ChargebackDetector;
use crate::error::{SignalError, SignalResult};
use crate::instrument::InstrumentDetector;
use crate::pattern::PatternDetector;
use crate::traits::{ActorHistory, SignalDetector};
use crate::velocity::VelocityDetector;

/// Ordered collection of signal detectors
///
/// Detection runs every registered detector and concatenates the flags.
/// Any detector error aborts the run - the caller fails closed rather than
/// scoring a partial flag set.
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn SignalDetector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Registry with the six built-in detectors on default thresholds
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(VelocityDetector::default()));
        registry.register(Arc::new(AmountDetector::default()));
        registry.register(Arc::new(PatternDetector::default()));
        registry.register(Arc::new(ChargebackDetector::default()));
        registry.register(Arc::new(AccountHistoryDetector::default()));
        registry.register(Arc::new(InstrumentDetector));
        registry
    }

    pub fn register(&mut self, detector: Arc<dyn SignalDetector>) {
        self.detectors.push(detector);
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    /// Run every detector against one request
    pub async fn detect_all(
        &self,
        request: &OperationRequest,
        history: &ActorHistory,
    ) -> SignalResult<Vec<RiskFlag>> {
        let mut flags = Vec::new();

        for detector in &self.detectors {
            match detector.detect(request, history).await {
                Ok(emitted) => {
                    if !emitted.is_empty() {
                        tracing::debug!(
                            detector = detector.name(),
                            flags = emitted.len(),
                            "detector emitted flags"
                        );
                    }
                    flags.extend(emitted);
                }
                Err(e) => {
                    tracing::error!(
                        detector = detector.name(),
                        error = %e,
                        "detector failed, aborting evaluation"
                    );
                    return Err(SignalError::detector(detector.name(), e.to_string()));
                }
            }
        }

        Ok(flags)
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fraudguard_core::OperationKind;
    use rust_decimal_macros::dec;

    fn request() -> OperationRequest {
        OperationRequest::new(OperationKind::Payment, "T-1", "CUST-001", "PAY-1", dec!(50))
            .with_user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36")
    }

    #[test]
    fn test_default_registry_has_all_detectors() {
        let registry = DetectorRegistry::with_defaults();
        assert_eq!(registry.detector_count(), 6);
    }

    #[tokio::test]
    async fn test_clean_request_no_flags() {
        let registry = DetectorRegistry::with_defaults();
        let flags = registry.detect_all(&request(), &ActorHistory::new()).await.unwrap();
        assert!(flags.is_empty());
    }

    #[tokio::test]
    async fn test_flags_concatenated_across_detectors() {
        let registry = DetectorRegistry::with_defaults();
        let req = OperationRequest::new(
            OperationKind::Payment,
            "T-1",
            "CUST-001",
            "PAY-1",
            dec!(150000),
        );
        // missing user agent + critical amount + round amount
        let flags = registry.detect_all(&req, &ActorHistory::new()).await.unwrap();
        assert!(flags.len() >= 3);
    }

    struct FailingDetector;

    #[async_trait]
    impl SignalDetector for FailingDetector {
        fn name(&self) -> &str {
            "failing"
        }

        async fn detect(
            &self,
            _request: &OperationRequest,
            _history: &ActorHistory,
        ) -> SignalResult<Vec<fraudguard_core::RiskFlag>> {
            Err(SignalError::Internal("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_detector_error_aborts_run() {
        let mut registry = DetectorRegistry::with_defaults();
        registry.register(Arc::new(FailingDetector));

        let result = registry.detect_all(&request(), &ActorHistory::new()).await;
        assert!(matches!(result, Err(SignalError::Detector { .. })));
    }
}
