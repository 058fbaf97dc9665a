//! Fraudguard core - shared domain types
//!
//! Leaf crate holding the types every other fraudguard crate speaks:
//!
//! - [`actor::ActorKey`] - `(kind, id)` key for velocity bucketing
//! - [`flag::RiskFlag`] - one weighted piece of risk evidence
//! - [`assessment::RiskAssessment`] - the scorer's immutable output
//! - [`request::OperationRequest`] - a payment/refund evaluation request
//! - [`role::Role`] - requester/approver roles, lowest privilege first

pub mod actor;
pub mod assessment;
pub mod flag;
pub mod request;
pub mod role;

pub use actor::{ActorKey, ActorKind, EventKind};
pub use assessment::{Recommendation, RiskAssessment};
pub use flag::{FlagKind, RiskFlag, Severity};
pub use request::{OperationKind, OperationRequest};
pub use role::Role;
