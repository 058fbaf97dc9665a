//! Fraudguard velocity tracker
//!
//! Maintains per-actor rolling counters (hour/day/week) of risk-relevant
//! events. Pure bookkeeping: the tracker records and reports, it never
//! decides anything. Windows reset to zero exactly once when their age
//! exceeds the window duration; counts are never decremented.

pub mod tracker;
pub mod window;

pub use tracker::VelocityTracker;
pub use window::{VelocityWindow, WindowBucket};
