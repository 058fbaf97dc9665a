//! Bounded audit ledger
//!
//! The last N entries are kept in memory for queries and metrics; when the
//! ring is full the oldest entry is evicted. An optional JSONL sink keeps
//! the full unbounded history on disk for replay after a restart.

use std::collections::{HashMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use crate::entry::{AuditEntry, AuditEvent, NotificationPolicy};
use crate::error::AuditResult;

const DEFAULT_CAPACITY: usize = 50_000;

/// Filter for ledger queries; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub tenant_id: Option<String>,
    pub actor_id: Option<String>,
    pub event: Option<AuditEvent>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_score: Option<u8>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn event(mut self, event: AuditEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn since(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn until(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn min_score(mut self, score: u8) -> Self {
        self.min_score = Some(score);
        self
    }

    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(t) = &self.tenant_id {
            if &entry.tenant_id != t {
                return false;
            }
        }
        if let Some(a) = &self.actor_id {
            if &entry.actor_id != a {
                return false;
            }
        }
        if let Some(e) = self.event {
            if entry.event != e {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.timestamp > to {
                return false;
            }
        }
        if let Some(min) = self.min_score {
            if entry.score.unwrap_or(0) < min {
                return false;
            }
        }
        true
    }
}

/// Aggregate counters over the in-memory window
#[derive(Debug, Clone, Default)]
pub struct AuditMetrics {
    pub total: usize,
    pub by_event: HashMap<&'static str, usize>,
    pub successes: usize,
    pub failures: usize,
    pub notifications: usize,
    /// Mean score over entries that carry one
    pub average_score: f64,
    /// Entries scoring 70+ within the last 24 hours
    pub high_risk_last_24h: usize,
}

/// In-memory ring of audit entries with an optional JSONL sink
pub struct AuditLedger {
    entries: VecDeque<AuditEntry>,
    capacity: usize,
    policy: NotificationPolicy,
    sink_path: Option<PathBuf>,
    sink: Option<File>,
}

impl AuditLedger {
    /// In-memory only, default capacity
    pub fn in_memory() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
            policy: NotificationPolicy::default(),
            sink_path: None,
            sink: None,
        }
    }

    /// Ledger with a JSONL file sink at the given path
    pub fn with_sink(path: impl AsRef<Path>, capacity: usize) -> AuditResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut ledger = Self::with_capacity(capacity);
        ledger.sink_path = Some(path);
        ledger.sink = Some(file);
        Ok(ledger)
    }

    pub fn policy(&self) -> &NotificationPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: NotificationPolicy) {
        self.policy = policy;
    }

    /// Finalize and append an entry, returning its id.
    ///
    /// The in-memory ring evicts its oldest entry when full; the file sink,
    /// when present, keeps everything.
    pub fn append(&mut self, entry: AuditEntry) -> AuditResult<String> {
        let entry = entry.finalize(&self.policy);
        let id = entry.id.clone();

        if entry.requires_notification {
            tracing::warn!(
                entry_id = %id,
                event = entry.event.as_str(),
                actor_id = %entry.actor_id,
                "audit entry requires notification"
            );
        }

        if let Some(ref mut file) = self.sink {
            let json = serde_json::to_string(&entry)?;
            writeln!(file, "{}", json)?;
            file.flush()?;
        }

        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);

        Ok(id)
    }

    /// Entries matching the query, oldest first
    pub fn query(&self, query: &AuditQuery) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| query.matches(e)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Compute metrics over the in-memory window
    pub fn metrics(&self) -> AuditMetrics {
        self.metrics_at(Utc::now())
    }

    pub fn metrics_at(&self, now: DateTime<Utc>) -> AuditMetrics {
        let mut metrics = AuditMetrics {
            total: self.entries.len(),
            ..Default::default()
        };

        let cutoff = now - Duration::hours(24);
        let mut score_sum: u64 = 0;
        let mut score_count: u64 = 0;

        for entry in &self.entries {
            *metrics.by_event.entry(entry.event.as_str()).or_insert(0) += 1;
            if entry.success {
                metrics.successes += 1;
            } else {
                metrics.failures += 1;
            }
            if entry.requires_notification {
                metrics.notifications += 1;
            }
            if let Some(score) = entry.score {
                score_sum += score as u64;
                score_count += 1;
                if score >= 70 && entry.timestamp >= cutoff {
                    metrics.high_risk_last_24h += 1;
                }
            }
        }

        if score_count > 0 {
            metrics.average_score = score_sum as f64 / score_count as f64;
        }

        metrics
    }

    /// Read the full persisted history from the sink file.
    ///
    /// Returns an empty list for in-memory ledgers.
    pub fn read_all(&self) -> AuditResult<Vec<AuditEntry>> {
        let Some(path) = &self.sink_path else {
            return Ok(Vec::new());
        };

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: AuditEntry = serde_json::from_str(&line)?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Reload the in-memory ring from the sink file, keeping the newest
    /// `capacity` entries.
    pub fn replay(&mut self) -> AuditResult<usize> {
        let persisted = self.read_all()?;
        let total = persisted.len();

        self.entries.clear();
        let skip = total.saturating_sub(self.capacity);
        for entry in persisted.into_iter().skip(skip) {
            self.entries.push_back(entry);
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(event: AuditEvent, actor: &str) -> AuditEntry {
        AuditEntry::new("tenant-1", event, actor)
    }

    #[test]
    fn test_append_and_query() {
        let mut ledger = AuditLedger::in_memory();

        ledger
            .append(entry(AuditEvent::PaymentEvaluated, "cust-1"))
            .unwrap();
        ledger
            .append(entry(AuditEvent::RefundEvaluated, "cust-2"))
            .unwrap();
        ledger
            .append(entry(AuditEvent::FraudDetected, "cust-1"))
            .unwrap();

        let for_actor = ledger.query(&AuditQuery::new().actor("cust-1"));
        assert_eq!(for_actor.len(), 2);

        let fraud = ledger.query(&AuditQuery::new().event(AuditEvent::FraudDetected));
        assert_eq!(fraud.len(), 1);
        assert!(fraud[0].requires_notification);
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let mut ledger = AuditLedger::with_capacity(3);

        let mut ids = Vec::new();
        for i in 0..5 {
            let id = ledger
                .append(entry(AuditEvent::PaymentEvaluated, &format!("cust-{i}")))
                .unwrap();
            ids.push(id);
        }

        assert_eq!(ledger.len(), 3);
        let all = ledger.query(&AuditQuery::new());
        // The two oldest entries are gone.
        assert_eq!(all[0].actor_id, "cust-2");
        assert_eq!(all[2].actor_id, "cust-4");
    }

    #[test]
    fn test_min_score_filter() {
        let mut ledger = AuditLedger::in_memory();

        ledger
            .append(entry(AuditEvent::PaymentEvaluated, "cust-1").with_score(30))
            .unwrap();
        ledger
            .append(entry(AuditEvent::PaymentEvaluated, "cust-2").with_score(80))
            .unwrap();

        let high = ledger.query(&AuditQuery::new().min_score(70));
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].actor_id, "cust-2");
    }

    #[test]
    fn test_metrics() {
        let mut ledger = AuditLedger::in_memory();

        ledger
            .append(entry(AuditEvent::PaymentEvaluated, "cust-1").with_score(20))
            .unwrap();
        ledger
            .append(entry(AuditEvent::FraudDetected, "cust-2").with_score(90))
            .unwrap();

        let metrics = ledger.metrics();
        assert_eq!(metrics.total, 2);
        assert_eq!(metrics.by_event["fraud_detected"], 1);
        assert_eq!(metrics.successes, 1);
        assert_eq!(metrics.failures, 1);
        assert_eq!(metrics.high_risk_last_24h, 1);
        assert!((metrics.average_score - 55.0).abs() < f64::EPSILON);
        assert!(metrics.notifications >= 1);
    }

    #[test]
    fn test_sink_persists_beyond_ring() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let mut ledger = AuditLedger::with_sink(&path, 2).unwrap();
        for i in 0..4 {
            ledger
                .append(entry(AuditEvent::PaymentEvaluated, &format!("cust-{i}")))
                .unwrap();
        }

        assert_eq!(ledger.len(), 2);
        // The file keeps everything the ring evicted.
        assert_eq!(ledger.read_all().unwrap().len(), 4);
    }

    #[test]
    fn test_replay_restores_newest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        {
            let mut ledger = AuditLedger::with_sink(&path, 10).unwrap();
            for i in 0..5 {
                ledger
                    .append(entry(AuditEvent::RefundEvaluated, &format!("cust-{i}")))
                    .unwrap();
            }
        }

        let mut restored = AuditLedger::with_sink(&path, 3).unwrap();
        assert!(restored.is_empty());

        let total = restored.replay().unwrap();
        assert_eq!(total, 5);
        assert_eq!(restored.len(), 3);
        let newest = restored.query(&AuditQuery::new());
        assert_eq!(newest[0].actor_id, "cust-2");
    }
}
