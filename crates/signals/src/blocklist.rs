//! Network-origin blocklist - simple set membership

use std::collections::HashSet;
use std::sync::RwLock;

/// Block-listed network origins (IPs)
///
/// The engine toggles membership; the pattern detector consumes it via the
/// pre-resolved [`ActorHistory`](crate::ActorHistory).
#[derive(Debug, Default)]
pub struct OriginBlocklist {
    origins: RwLock<HashSet<String>>,
}

impl OriginBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an origin; returns false if it was already blocked
    pub fn block(&self, origin: &str) -> bool {
        let mut origins = self.origins.write().unwrap_or_else(|e| e.into_inner());
        origins.insert(origin.to_string())
    }

    /// Remove an origin; returns false if it was not blocked
    pub fn unblock(&self, origin: &str) -> bool {
        let mut origins = self.origins.write().unwrap_or_else(|e| e.into_inner());
        origins.remove(origin)
    }

    pub fn is_blocked(&self, origin: &str) -> bool {
        let origins = self.origins.read().unwrap_or_else(|e| e.into_inner());
        origins.contains(origin)
    }

    pub fn len(&self) -> usize {
        self.origins.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
