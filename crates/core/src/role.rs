//! Requester and approver roles
//!
//! Roles are ordered from lowest privilege to highest. The ordering matters
//! in two places: the scorer's customer-approval band applies only to the
//! lowest role, and approval tiers are cumulative upward.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Platform roles, lowest privilege first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer = 0,
    Support = 1,
    Manager = 2,
    Admin = 3,
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

impl Role {
    /// Staff roles may perform operations customers cannot (e.g. partial refunds)
    pub fn is_staff(&self) -> bool {
        *self >= Role::Support
    }

    /// The lowest-privilege role (used for the approval band in scoring)
    pub fn is_lowest(&self) -> bool {
        *self == Role::Customer
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Support => "support",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Customer < Role::Support);
        assert!(Role::Support < Role::Manager);
        assert!(Role::Manager < Role::Admin);
    }

    #[test]
    fn test_staff() {
        assert!(!Role::Customer.is_staff());
        assert!(Role::Support.is_staff());
        assert!(Role::Admin.is_staff());
    }

    #[test]
    fn test_lowest() {
        assert!(Role::Customer.is_lowest());
        assert!(!Role::Support.is_lowest());
    }
}
