//! Engine errors

use thiserror::Error;

use fraudguard_approval::{ApprovalError, StoreError};
use fraudguard_audit::AuditError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Role {role} is not authorized to {action}")]
    Authorization { role: &'static str, action: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Approval store error: {0}")]
    Store(#[from] StoreError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApprovalError> for EngineError {
    fn from(e: ApprovalError) -> Self {
        match e {
            ApprovalError::NotFound(id) => EngineError::NotFound(format!("approval {id}")),
            ApprovalError::AlreadyResolved(status) => {
                EngineError::Conflict(format!("approval already {status}"))
            }
            ApprovalError::InsufficientAuthority { role, amount } => EngineError::Authorization {
                role,
                action: format!("resolve an approval of {amount}"),
            },
            ApprovalError::Store(e) => EngineError::Store(e),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
