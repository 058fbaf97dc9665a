//! Chargeback cache - externally supplied risk scores and dispute incidents
//!
//! Scores are written once per subject key (first write wins); incidents
//! accumulate per actor and are queried over a trailing window.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};

/// Externally fed chargeback risk data
#[derive(Debug, Default)]
pub struct ChargebackCache {
    /// subject id -> risk score (0-100), write-once
    scores: RwLock<HashMap<String, u8>>,
    /// actor id -> incident timestamps
    incidents: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl ChargebackCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a subject risk score. Write-once per key: returns false and
    /// leaves the existing score untouched when the key is already present.
    pub fn set_score(&self, subject_id: &str, score: u8) -> bool {
        let mut scores = self.scores.write().unwrap_or_else(|e| e.into_inner());
        if scores.contains_key(subject_id) {
            return false;
        }
        scores.insert(subject_id.to_string(), score.min(100));
        true
    }

    pub fn score(&self, subject_id: &str) -> Option<u8> {
        let scores = self.scores.read().unwrap_or_else(|e| e.into_inner());
        scores.get(subject_id).copied()
    }

    /// Record one chargeback incident against an actor
    pub fn record_incident(&self, actor_id: &str) {
        self.record_incident_at(actor_id, Utc::now());
    }

    pub fn record_incident_at(&self, actor_id: &str, at: DateTime<Utc>) {
        let mut incidents = self.incidents.write().unwrap_or_else(|e| e.into_inner());
        incidents.entry(actor_id.to_string()).or_default().push(at);
    }

    /// Incidents recorded against an actor within the trailing window
    pub fn incidents_within(&self, actor_id: &str, window: Duration) -> u32 {
        let cutoff = Utc::now() - window;
        let incidents = self.incidents.read().unwrap_or_else(|e| e.into_inner());
        incidents
            .get(actor_id)
            .map(|stamps| stamps.iter().filter(|t| **t >= cutoff).count() as u32)
            .unwrap_or(0)
    }

    /// Housekeeping: drop incidents older than the retention window
    pub fn prune(&self, retention: Duration) {
        let cutoff = Utc::now() - retention;
        let mut incidents = self.incidents.write().unwrap_or_else(|e| e.into_inner());
        for stamps in incidents.values_mut() {
            stamps.retain(|t| *t >= cutoff);
        }
        incidents.retain(|_, stamps| !stamps.is_empty());
    }
}
