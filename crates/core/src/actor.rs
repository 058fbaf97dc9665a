//! Actor identity - who is being risk-scored

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of actor identifier
///
/// Identifiers are not globally unique across kinds (a session id and a
/// customer id may collide), so velocity counters are always keyed by
/// `(kind, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// Authenticated customer account
    Customer,
    /// Anonymous or pre-auth session
    Session,
    /// Network origin (IP address)
    Network,
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActorKind::Customer => "customer",
            ActorKind::Session => "session",
            ActorKind::Network => "network",
        };
        f.write_str(s)
    }
}

/// Composite key for per-actor state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorKey {
    pub kind: ActorKind,
    pub id: String,
}

impl ActorKey {
    pub fn new(kind: ActorKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn customer(id: impl Into<String>) -> Self {
        Self::new(ActorKind::Customer, id)
    }

    pub fn session(id: impl Into<String>) -> Self {
        Self::new(ActorKind::Session, id)
    }

    pub fn network(id: impl Into<String>) -> Self {
        Self::new(ActorKind::Network, id)
    }
}

impl fmt::Display for ActorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Risk-relevant event kinds counted by the velocity tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Payment,
    Refund,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = ActorKey::customer("CUST-001");
        assert_eq!(key.to_string(), "customer:CUST-001");

        let key = ActorKey::network("203.0.113.7");
        assert_eq!(key.to_string(), "network:203.0.113.7");
    }

    #[test]
    fn test_same_id_different_kind_are_distinct() {
        let a = ActorKey::customer("X-1");
        let b = ActorKey::session("X-1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(serde_json::to_string(&ActorKind::Network).unwrap(), "\"network\"");
        assert_eq!(serde_json::to_string(&EventKind::Refund).unwrap(), "\"refund\"");
    }
}
