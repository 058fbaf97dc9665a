//! Operation requests - the input to an orchestrated evaluation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::actor::{ActorKey, ActorKind, EventKind};
use crate::role::Role;

/// Which gated operation is being evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Payment,
    Refund,
}

impl OperationKind {
    pub fn event_kind(&self) -> EventKind {
        match self {
            OperationKind::Payment => EventKind::Payment,
            OperationKind::Refund => EventKind::Refund,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Payment => "payment",
            OperationKind::Refund => "refund",
        }
    }
}

/// A payment or refund attempt submitted for risk evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: OperationKind,
    pub tenant_id: String,
    /// Customer id when known, otherwise a session id stands in
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Payment or refund reference this request concerns
    pub subject_id: String,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Network origin (IP) of the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
    /// Client signature string (user agent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub requested_by: String,
    pub requester_role: Role,
    /// Refund-only: partial refunds need a staff role
    #[serde(default)]
    pub partial: bool,
}

impl OperationRequest {
    pub fn new(
        operation: OperationKind,
        tenant_id: impl Into<String>,
        customer_id: impl Into<String>,
        subject_id: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        let customer_id = customer_id.into();
        Self {
            operation,
            tenant_id: tenant_id.into(),
            requested_by: customer_id.clone(),
            customer_id,
            session_id: None,
            subject_id: subject_id.into(),
            amount,
            reason: None,
            source_ip: None,
            user_agent: None,
            requester_role: Role::Customer,
            partial: false,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn with_requester(mut self, requested_by: impl Into<String>, role: Role) -> Self {
        self.requested_by = requested_by.into();
        self.requester_role = role;
        self
    }

    pub fn partial_refund(mut self) -> Self {
        self.partial = true;
        self
    }

    /// Key the velocity counters bucket this request under
    pub fn actor_key(&self) -> ActorKey {
        ActorKey::new(ActorKind::Customer, self.customer_id.clone())
    }

    /// Key for the network origin, when one was supplied
    pub fn origin_key(&self) -> Option<ActorKey> {
        self.source_ip
            .as_deref()
            .map(|ip| ActorKey::new(ActorKind::Network, ip.to_string()))
    }
}
