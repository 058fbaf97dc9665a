//! Pending approval data structures

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fraudguard_core::{ActorKey, OperationKind, OperationRequest, RiskAssessment};

/// Status of a pending approval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    /// Awaiting a staff decision
    Pending,
    /// Granted by a staff member with sufficient authority
    Approved,
    /// Explicitly denied by a staff member
    Denied,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Denied => "denied",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ApprovalStatus::Pending),
            "approved" => Some(ApprovalStatus::Approved),
            "denied" => Some(ApprovalStatus::Denied),
            _ => None,
        }
    }

    /// Terminal states cannot transition further
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

/// An operation parked for human review
///
/// Carries the full original request so it can be re-evaluated at
/// resolution time, plus the assessment that sent it to the queue.
/// Amount, actor and tenant are duplicated at the top level for queue
/// queries and tier checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingApproval {
    /// Unique identifier for the approval request
    pub id: String,

    pub tenant_id: String,

    /// The payment or refund the review applies to
    pub subject_id: String,

    /// Velocity actor the operation was attributed to
    pub actor: ActorKey,

    pub operation: OperationKind,

    pub amount: Decimal,

    pub reason: Option<String>,

    /// Who submitted the original operation
    pub requested_by: String,

    pub requested_at: DateTime<Utc>,

    pub status: ApprovalStatus,

    /// The original request, kept whole for re-evaluation
    pub request: OperationRequest,

    /// The assessment that triggered the review
    pub assessment: RiskAssessment,

    /// Staff member who resolved the request
    pub resolved_by: Option<String>,

    pub resolved_at: Option<DateTime<Utc>>,

    /// Free-text note attached at resolution
    pub resolution_note: Option<String>,
}

impl PendingApproval {
    /// Park an operation for review
    pub fn new(request: &OperationRequest, assessment: RiskAssessment) -> Self {
        let id = format!("APR-{}", uuid::Uuid::new_v4().to_string()[..8].to_uppercase());

        Self {
            id,
            tenant_id: request.tenant_id.clone(),
            subject_id: request.subject_id.clone(),
            actor: request.actor_key(),
            operation: request.operation,
            amount: request.amount,
            reason: request.reason.clone(),
            requested_by: request.requested_by.clone(),
            requested_at: Utc::now(),
            status: ApprovalStatus::Pending,
            request: request.clone(),
            assessment,
            resolved_by: None,
            resolved_at: None,
            resolution_note: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> OperationRequest {
        OperationRequest::new(
            OperationKind::Refund,
            "tenant-1",
            "cust-42",
            "txn-100",
            dec!(75),
        )
        .with_requester("agent-7", fraudguard_core::Role::Support)
    }

    #[test]
    fn test_pending_approval_creation() {
        let approval = PendingApproval::new(&request(), RiskAssessment::clean());

        assert!(approval.id.starts_with("APR-"));
        assert_eq!(approval.status, ApprovalStatus::Pending);
        assert_eq!(approval.amount, dec!(75));
        assert_eq!(approval.actor, ActorKey::customer("cust-42"));
        assert!(approval.resolved_by.is_none());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Denied,
        ] {
            assert_eq!(ApprovalStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(ApprovalStatus::from_str("expired"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Denied.is_terminal());
    }
}
