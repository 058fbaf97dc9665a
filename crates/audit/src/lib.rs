//! Fraudguard audit ledger
//!
//! Every evaluation, approval decision and blocklist change leaves one
//! immutable entry here. The in-memory ring is bounded; an optional JSONL
//! sink holds the full history for replay.

pub mod entry;
pub mod error;
pub mod ledger;

pub use entry::{AuditEntry, AuditEvent, NotificationPolicy};
pub use error::{AuditError, AuditResult};
pub use ledger::{AuditLedger, AuditMetrics, AuditQuery};
