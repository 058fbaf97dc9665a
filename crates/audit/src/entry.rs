//! Audit entries - one immutable record per notable event
//!
//! Entries are never edited after append. The notification bit is derived
//! once at construction so downstream consumers do not re-implement the
//! escalation rules.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use fraudguard_core::OperationKind;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    /// A payment was run through the pipeline
    PaymentEvaluated,
    /// A refund was run through the pipeline
    RefundEvaluated,
    /// The scorer recommended an outright deny
    FraudDetected,
    /// An operation was parked for human review
    ApprovalRequested,
    /// A reviewer granted a parked operation
    ApprovalGranted,
    /// A parked operation was denied, or a resolution attempt was refused
    ApprovalDenied,
    /// A requester lacked the role for the operation
    AuthorizationDenied,
    /// A network origin was added to the blocklist
    ActorBlocked,
    /// A network origin was removed from the blocklist
    ActorUnblocked,
}

impl AuditEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEvent::PaymentEvaluated => "payment_evaluated",
            AuditEvent::RefundEvaluated => "refund_evaluated",
            AuditEvent::FraudDetected => "fraud_detected",
            AuditEvent::ApprovalRequested => "approval_requested",
            AuditEvent::ApprovalGranted => "approval_granted",
            AuditEvent::ApprovalDenied => "approval_denied",
            AuditEvent::AuthorizationDenied => "authorization_denied",
            AuditEvent::ActorBlocked => "actor_blocked",
            AuditEvent::ActorUnblocked => "actor_unblocked",
        }
    }

    /// Events that always page someone
    fn always_notifies(&self) -> bool {
        matches!(
            self,
            AuditEvent::FraudDetected
                | AuditEvent::AuthorizationDenied
                | AuditEvent::ActorBlocked
        )
    }

    /// Events that record a refusal rather than a completed action
    fn is_failure(&self) -> bool {
        matches!(
            self,
            AuditEvent::FraudDetected
                | AuditEvent::ApprovalDenied
                | AuditEvent::AuthorizationDenied
        )
    }
}

/// One immutable audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub tenant_id: String,
    pub event: AuditEvent,
    /// The customer, session or origin the event concerns
    pub actor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    /// Human-readable flag descriptions from the assessment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    /// Final decision string, when the event carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    /// Whether the recorded action completed; refusal events start false
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub requires_notification: bool,
    /// Free-form context (reviewer notes, blocklist reasons)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// Thresholds for the notification derivation
#[derive(Debug, Clone, Copy)]
pub struct NotificationPolicy {
    /// Scores at or above this notify even on a non-paging event
    pub score_threshold: u8,
    /// Amounts at or above this notify even on a non-paging event
    pub amount_threshold: Decimal,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            score_threshold: 70,
            amount_threshold: Decimal::new(10_000, 0),
        }
    }
}

impl AuditEntry {
    pub fn new(
        tenant_id: impl Into<String>,
        event: AuditEvent,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            tenant_id: tenant_id.into(),
            event,
            actor_id: actor_id.into(),
            subject_id: None,
            operation: None,
            amount: None,
            score: None,
            flags: Vec::new(),
            decision: None,
            success: !event.is_failure(),
            error_message: None,
            requires_notification: event.always_notifies(),
            detail: None,
        }
    }

    pub fn with_subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn with_operation(mut self, operation: OperationKind) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_decision(mut self, decision: impl Into<String>) -> Self {
        self.decision = Some(decision.into());
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Mark the entry as a failed action with the reason
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(message.into());
        self
    }

    /// Re-derive the notification bit after the builder chain.
    ///
    /// Notification fires for paging events, high scores, approval
    /// requests over the amount threshold, and failed events that carry
    /// a score.
    pub fn finalize(mut self, policy: &NotificationPolicy) -> Self {
        let high_score = self.score.is_some_and(|s| s >= policy.score_threshold);
        let high_amount_request = self.event == AuditEvent::ApprovalRequested
            && self.amount.is_some_and(|a| a >= policy.amount_threshold);
        let scored_failure = !self.success && self.score.is_some_and(|s| s > 0);
        self.requires_notification =
            self.event.always_notifies() || high_score || high_amount_request || scored_failure;
        self
    }
}
