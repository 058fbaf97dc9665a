//! Approval storage backends
//!
//! The workflow talks to a storage trait so the decision logic stays
//! backend-agnostic: tests run on the in-memory map, deployments on
//! SQLite.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::pending::{ApprovalStatus, PendingApproval};

/// Errors from the approval store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Approval not found: {0}")]
    NotFound(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Storage interface for the approval queue
pub trait ApprovalStore: Send {
    /// Save (insert or replace) an approval
    fn save(&self, approval: &PendingApproval) -> Result<(), StoreError>;

    /// Get an approval by ID
    fn get(&self, id: &str) -> Result<PendingApproval, StoreError>;

    /// List approvals with a specific status, newest first
    fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<PendingApproval>, StoreError>;

    /// List all approvals regardless of status, newest first
    fn list_all(&self) -> Result<Vec<PendingApproval>, StoreError>;

    /// Count approvals by status
    fn count_by_status(&self, status: ApprovalStatus) -> Result<usize, StoreError>;
}

/// Process-local approval queue
#[derive(Debug, Default)]
pub struct MemoryApprovalStore {
    entries: Mutex<HashMap<String, PendingApproval>>,
}

impl MemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut approvals: Vec<PendingApproval>) -> Vec<PendingApproval> {
        approvals.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        approvals
    }
}

impl ApprovalStore for MemoryApprovalStore {
    fn save(&self, approval: &PendingApproval) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(approval.id.clone(), approval.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<PendingApproval, StoreError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<PendingApproval>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(Self::sorted(
            entries
                .values()
                .filter(|a| a.status == status)
                .cloned()
                .collect(),
        ))
    }

    fn list_all(&self) -> Result<Vec<PendingApproval>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(Self::sorted(entries.values().cloned().collect()))
    }

    fn count_by_status(&self, status: ApprovalStatus) -> Result<usize, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.values().filter(|a| a.status == status).count())
    }
}

/// SQLite-backed approval queue
pub struct SqliteApprovalStore {
    conn: Connection,
}

impl SqliteApprovalStore {
    /// Create a new store with the given database path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS pending_approvals (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                subject_id TEXT NOT NULL,
                actor_json TEXT NOT NULL,
                operation TEXT NOT NULL,
                amount TEXT NOT NULL,
                reason TEXT,
                requested_by TEXT NOT NULL,
                requested_at TEXT NOT NULL,
                status TEXT NOT NULL,
                request_json TEXT NOT NULL,
                assessment_json TEXT NOT NULL,
                resolved_by TEXT,
                resolved_at TEXT,
                resolution_note TEXT
            )",
            [],
        )?;

        // Index for efficient status queries
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pending_approvals_status
             ON pending_approvals(status)",
            [],
        )?;

        Ok(())
    }
}

impl ApprovalStore for SqliteApprovalStore {
    fn save(&self, approval: &PendingApproval) -> Result<(), StoreError> {
        let actor_json = serde_json::to_string(&approval.actor)?;
        let request_json = serde_json::to_string(&approval.request)?;
        let assessment_json = serde_json::to_string(&approval.assessment)?;
        let operation = serde_json::to_string(&approval.operation)?;

        self.conn.execute(
            "INSERT OR REPLACE INTO pending_approvals
             (id, tenant_id, subject_id, actor_json, operation, amount, reason,
              requested_by, requested_at, status, request_json, assessment_json,
              resolved_by, resolved_at, resolution_note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                approval.id,
                approval.tenant_id,
                approval.subject_id,
                actor_json,
                operation,
                approval.amount.to_string(),
                approval.reason,
                approval.requested_by,
                approval.requested_at.to_rfc3339(),
                approval.status.as_str(),
                request_json,
                assessment_json,
                approval.resolved_by,
                approval.resolved_at.map(|t| t.to_rfc3339()),
                approval.resolution_note,
            ],
        )?;

        Ok(())
    }

    fn get(&self, id: &str) -> Result<PendingApproval, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tenant_id, subject_id, actor_json, operation, amount, reason,
                    requested_by, requested_at, status, request_json, assessment_json,
                    resolved_by, resolved_at, resolution_note
             FROM pending_approvals WHERE id = ?1",
        )?;

        let row = stmt
            .query_row(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                    row.get::<_, String>(10)?,
                    row.get::<_, String>(11)?,
                    row.get::<_, Option<String>>(12)?,
                    row.get::<_, Option<String>>(13)?,
                    row.get::<_, Option<String>>(14)?,
                ))
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(id.to_string()),
                other => StoreError::Database(other),
            })?;

        let actor = serde_json::from_str(&row.3)?;
        let operation = serde_json::from_str(&row.4)?;
        let amount = Decimal::from_str(&row.5)
            .map_err(|_| StoreError::Corrupt(format!("bad amount: {}", row.5)))?;
        let requested_at = parse_datetime(&row.8)?;
        let status = ApprovalStatus::from_str(&row.9)
            .ok_or_else(|| StoreError::Corrupt(format!("bad status: {}", row.9)))?;
        let request = serde_json::from_str(&row.10)?;
        let assessment = serde_json::from_str(&row.11)?;
        let resolved_at = match &row.13 {
            Some(s) => Some(parse_datetime(s)?),
            None => None,
        };

        Ok(PendingApproval {
            id: row.0,
            tenant_id: row.1,
            subject_id: row.2,
            actor,
            operation,
            amount,
            reason: row.6,
            requested_by: row.7,
            requested_at,
            status,
            request,
            assessment,
            resolved_by: row.12,
            resolved_at,
            resolution_note: row.14,
        })
    }

    fn list_by_status(&self, status: ApprovalStatus) -> Result<Vec<PendingApproval>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM pending_approvals WHERE status = ?1 ORDER BY requested_at DESC",
        )?;

        let ids: Vec<String> = stmt
            .query_map(params![status.as_str()], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut approvals = Vec::new();
        for id in ids {
            approvals.push(self.get(&id)?);
        }

        Ok(approvals)
    }

    fn list_all(&self) -> Result<Vec<PendingApproval>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM pending_approvals ORDER BY requested_at DESC")?;

        let ids: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut approvals = Vec::new();
        for id in ids {
            approvals.push(self.get(&id)?);
        }

        Ok(approvals)
    }

    fn count_by_status(&self, status: ApprovalStatus) -> Result<usize, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pending_approvals WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }
}

fn parse_datetime(s: &str) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&chrono::Utc))
        .map_err(|_| StoreError::Corrupt(format!("bad timestamp: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::{OperationKind, OperationRequest, RiskAssessment};
    use rust_decimal_macros::dec;

    fn sample_approval(subject: &str) -> PendingApproval {
        let request = OperationRequest::new(
            OperationKind::Refund,
            "tenant-1",
            "cust-42",
            subject,
            dec!(250),
        );
        PendingApproval::new(&request, RiskAssessment::clean())
    }

    fn check_save_and_get(store: &dyn ApprovalStore) {
        let approval = sample_approval("txn-1");
        let id = approval.id.clone();

        store.save(&approval).unwrap();
        let retrieved = store.get(&id).unwrap();

        assert_eq!(retrieved.id, id);
        assert_eq!(retrieved.amount, dec!(250));
        assert_eq!(retrieved.status, ApprovalStatus::Pending);
        assert_eq!(retrieved.actor, approval.actor);
    }

    fn check_list_by_status(store: &dyn ApprovalStore) {
        for i in 0..3 {
            store.save(&sample_approval(&format!("txn-{i}"))).unwrap();
        }
        let mut resolved = sample_approval("txn-done");
        resolved.status = ApprovalStatus::Approved;
        store.save(&resolved).unwrap();

        let pending = store.list_by_status(ApprovalStatus::Pending).unwrap();
        assert_eq!(pending.len(), 3);
        assert_eq!(store.count_by_status(ApprovalStatus::Approved).unwrap(), 1);
    }

    fn check_save_is_upsert(store: &dyn ApprovalStore) {
        let mut approval = sample_approval("txn-1");
        store.save(&approval).unwrap();

        approval.status = ApprovalStatus::Denied;
        approval.resolved_by = Some("mgr-1".to_string());
        store.save(&approval).unwrap();

        let retrieved = store.get(&approval.id).unwrap();
        assert_eq!(retrieved.status, ApprovalStatus::Denied);
        assert_eq!(retrieved.resolved_by.as_deref(), Some("mgr-1"));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_sqlite_save_and_get() {
        check_save_and_get(&SqliteApprovalStore::in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_get_missing() {
        let store = SqliteApprovalStore::in_memory().unwrap();
        let result = store.get("APR-NOPE");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_sqlite_list_by_status() {
        check_list_by_status(&SqliteApprovalStore::in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_save_is_upsert() {
        check_save_is_upsert(&SqliteApprovalStore::in_memory().unwrap());
    }

    #[test]
    fn test_memory_save_and_get() {
        check_save_and_get(&MemoryApprovalStore::new());
    }

    #[test]
    fn test_memory_get_missing() {
        let store = MemoryApprovalStore::new();
        let result = store.get("APR-NOPE");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_memory_list_by_status() {
        check_list_by_status(&MemoryApprovalStore::new());
    }

    #[test]
    fn test_memory_save_is_upsert() {
        check_save_is_upsert(&MemoryApprovalStore::new());
    }
}
