//! Approval workflow logic
//!
//! Staff authority is tiered by amount: support can clear small refunds,
//! managers mid-range, admins anything. The limits are cumulative, so a
//! manager can also resolve anything a support agent can.

use rust_decimal::Decimal;
use thiserror::Error;

use fraudguard_core::Role;

use crate::pending::{ApprovalStatus, PendingApproval};
use crate::store::{ApprovalStore, StoreError};

/// Per-role amount ceilings for resolving approvals
#[derive(Debug, Clone)]
pub struct ApprovalConfig {
    /// Maximum amount a support agent may resolve
    pub support_limit: Decimal,

    /// Maximum amount a manager may resolve
    pub manager_limit: Decimal,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            support_limit: Decimal::new(100, 0),
            manager_limit: Decimal::new(1_000, 0),
        }
    }
}

impl ApprovalConfig {
    /// Whether `role` has the authority to resolve an approval of `amount`.
    ///
    /// Customers have no resolution authority at all; admins are unbounded.
    pub fn can_resolve(&self, role: Role, amount: Decimal) -> bool {
        match role {
            Role::Customer => false,
            Role::Support => amount <= self.support_limit,
            Role::Manager => amount <= self.manager_limit,
            Role::Admin => true,
        }
    }
}

/// Errors from the approval workflow
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Approval not found: {0}")]
    NotFound(String),

    #[error("Approval already {0}")]
    AlreadyResolved(String),

    #[error("Role {role} cannot resolve an approval of {amount}")]
    InsufficientAuthority { role: &'static str, amount: Decimal },
}

/// The decision a resolver hands down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Approve,
    Deny,
}

/// Tiered approval workflow over a pluggable store
pub struct ApprovalWorkflow {
    store: Box<dyn ApprovalStore>,
    config: ApprovalConfig,
}

impl ApprovalWorkflow {
    pub fn new(store: Box<dyn ApprovalStore>, config: ApprovalConfig) -> Self {
        Self { store, config }
    }

    /// Create a new workflow with default tier limits
    pub fn with_store(store: Box<dyn ApprovalStore>) -> Self {
        Self::new(store, ApprovalConfig::default())
    }

    pub fn config(&self) -> &ApprovalConfig {
        &self.config
    }

    /// Park an approval in the queue
    pub fn create(&self, approval: &PendingApproval) -> Result<(), ApprovalError> {
        self.store.save(approval)?;
        tracing::info!(
            approval_id = %approval.id,
            tenant_id = %approval.tenant_id,
            amount = %approval.amount,
            "approval queued"
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<PendingApproval, ApprovalError> {
        map_not_found(self.store.get(id))
    }

    /// Resolve a pending approval exactly once.
    ///
    /// Checks happen in order: existence, terminality, authority. A second
    /// resolution attempt fails with `AlreadyResolved` no matter which
    /// direction the first one went.
    pub fn resolve(
        &self,
        id: &str,
        resolution: Resolution,
        resolved_by: &str,
        role: Role,
        note: Option<&str>,
    ) -> Result<PendingApproval, ApprovalError> {
        let mut approval = map_not_found(self.store.get(id))?;

        if approval.status.is_terminal() {
            return Err(ApprovalError::AlreadyResolved(
                approval.status.as_str().to_string(),
            ));
        }

        if !self.config.can_resolve(role, approval.amount) {
            return Err(ApprovalError::InsufficientAuthority {
                role: role.as_str(),
                amount: approval.amount,
            });
        }

        approval.status = match resolution {
            Resolution::Approve => ApprovalStatus::Approved,
            Resolution::Deny => ApprovalStatus::Denied,
        };
        approval.resolved_by = Some(resolved_by.to_string());
        approval.resolved_at = Some(chrono::Utc::now());
        approval.resolution_note = note.map(|s| s.to_string());

        self.store.save(&approval)?;

        tracing::info!(
            approval_id = %approval.id,
            status = approval.status.as_str(),
            resolved_by,
            "approval resolved"
        );

        Ok(approval)
    }

    /// List approvals still awaiting a decision
    pub fn list_pending(&self) -> Result<Vec<PendingApproval>, ApprovalError> {
        Ok(self.store.list_by_status(ApprovalStatus::Pending)?)
    }

    pub fn list_all(&self) -> Result<Vec<PendingApproval>, ApprovalError> {
        Ok(self.store.list_all()?)
    }

    /// Queue statistics by status
    pub fn stats(&self) -> Result<ApprovalStats, ApprovalError> {
        Ok(ApprovalStats {
            pending: self.store.count_by_status(ApprovalStatus::Pending)?,
            approved: self.store.count_by_status(ApprovalStatus::Approved)?,
            denied: self.store.count_by_status(ApprovalStatus::Denied)?,
        })
    }
}

fn map_not_found(result: Result<PendingApproval, StoreError>) -> Result<PendingApproval, ApprovalError> {
    result.map_err(|e| match e {
        StoreError::NotFound(id) => ApprovalError::NotFound(id),
        other => ApprovalError::Store(other),
    })
}

/// Statistics about the approval queue
#[derive(Debug, Clone)]
pub struct ApprovalStats {
    pub pending: usize,
    pub approved: usize,
    pub denied: usize,
}
