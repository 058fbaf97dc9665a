//! Fraudguard approval queue
//!
//! High-risk operations are parked here for human review. Resolution is
//! tiered by role and amount, and each approval can be resolved exactly
//! once. Storage sits behind a trait: an in-memory map for tests and a
//! SQLite queue so reviews survive restarts.

pub mod pending;
pub mod store;
pub mod workflow;

pub use pending::{ApprovalStatus, PendingApproval};
pub use store::{ApprovalStore, MemoryApprovalStore, SqliteApprovalStore, StoreError};
pub use workflow::{ApprovalConfig, ApprovalError, ApprovalStats, ApprovalWorkflow, Resolution};
