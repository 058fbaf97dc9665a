//! Caller identity and evaluation outcomes

use serde::{Deserialize, Serialize};

use fraudguard_core::{RiskAssessment, Role};

/// Who is calling an engine operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
    pub tenant_id: String,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role, tenant_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            tenant_id: tenant_id.into(),
        }
    }

    pub fn customer(id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self::new(id, Role::Customer, tenant_id)
    }

    pub fn staff(id: impl Into<String>, role: Role, tenant_id: impl Into<String>) -> Self {
        Self::new(id, role, tenant_id)
    }
}

/// Final disposition of one evaluated operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Cleared to proceed
    Approved,
    /// Rejected outright
    Denied,
    /// Parked in the approval queue
    Pending,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Denied => "denied",
            Decision::Pending => "pending",
        }
    }
}

/// What the pipeline decided and why
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub decision: Decision,
    pub assessment: RiskAssessment,
    /// Set when the operation was parked for review
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_id: Option<String>,
    /// Every audit entry recorded for this call, in append order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit_ids: Vec<String>,
}

impl OperationOutcome {
    pub fn approved(assessment: RiskAssessment, audit_ids: Vec<String>) -> Self {
        Self {
            decision: Decision::Approved,
            assessment,
            approval_id: None,
            audit_ids,
        }
    }

    pub fn denied(assessment: RiskAssessment, audit_ids: Vec<String>) -> Self {
        Self {
            decision: Decision::Denied,
            assessment,
            approval_id: None,
            audit_ids,
        }
    }

    pub fn pending(
        assessment: RiskAssessment,
        approval_id: String,
        audit_ids: Vec<String>,
    ) -> Self {
        Self {
            decision: Decision::Pending,
            assessment,
            approval_id: Some(approval_id),
            audit_ids,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.decision == Decision::Approved
    }

    pub fn is_denied(&self) -> bool {
        self.decision == Decision::Denied
    }

    pub fn is_pending(&self) -> bool {
        self.decision == Decision::Pending
    }
}
