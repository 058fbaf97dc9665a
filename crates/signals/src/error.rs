//! Signal detector errors

use thiserror::Error;

/// Errors from signal detection
///
/// Any of these aborts the evaluation; the caller is expected to fail
/// closed (deny) rather than score an incomplete flag set.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("Detector {detector} failed: {message}")]
    Detector { detector: String, message: String },

    #[error("Malformed evidence: {0}")]
    Evidence(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SignalError {
    pub fn detector(detector: impl Into<String>, message: impl Into<String>) -> Self {
        SignalError::Detector {
            detector: detector.into(),
            message: message.into(),
        }
    }
}

/// Result type for signal operations
pub type SignalResult<T> = Result<T, SignalError>;
