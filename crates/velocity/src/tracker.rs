//! Velocity tracker - per-actor window ownership and locking
//!
//! The tracker is the only writer of velocity windows. A shared read lock
//! guards the actor map; each actor's window sits behind its own mutex so
//! concurrent requests for the same actor are serialized while different
//! actors never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use fraudguard_core::{ActorKey, EventKind};
use rust_decimal::Decimal;

use crate::window::VelocityWindow;

/// Per-actor rolling counters of risk-relevant events
#[derive(Debug, Default)]
pub struct VelocityTracker {
    windows: RwLock<HashMap<ActorKey, Arc<Mutex<VelocityWindow>>>>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event for an actor and return the updated window.
    ///
    /// Any window whose age exceeds its duration is reset before the
    /// increment. Pure bookkeeping; cannot fail.
    pub fn record(&self, kind: EventKind, actor: &ActorKey, amount: Decimal) -> VelocityWindow {
        self.record_at(kind, actor, amount, Utc::now())
    }

    /// Record at an explicit instant (replay and tests)
    pub fn record_at(
        &self,
        kind: EventKind,
        actor: &ActorKey,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> VelocityWindow {
        let slot = self.slot(actor, now);
        let mut window = slot.lock().unwrap_or_else(|e| e.into_inner());
        window.record_at(kind, amount, now);
        window.clone()
    }

    /// Read-only snapshot of an actor's window, if any activity was recorded
    pub fn window(&self, actor: &ActorKey) -> Option<VelocityWindow> {
        let windows = self.windows.read().unwrap_or_else(|e| e.into_inner());
        windows
            .get(actor)
            .map(|slot| slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    /// First observed activity for an actor
    pub fn first_seen(&self, actor: &ActorKey) -> Option<DateTime<Utc>> {
        self.window(actor).map(|w| w.first_seen)
    }

    pub fn actor_count(&self) -> usize {
        self.windows.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Drop actors with no activity for `max_idle`. Housekeeping only;
    /// holds the map lock for a single sweep.
    pub fn sweep_stale(&self, max_idle: Duration) -> usize {
        self.sweep_stale_at(max_idle, Utc::now())
    }

    pub fn sweep_stale_at(&self, max_idle: Duration, now: DateTime<Utc>) -> usize {
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        let before = windows.len();
        windows.retain(|_, slot| {
            let window = slot.lock().unwrap_or_else(|e| e.into_inner());
            now - window.last_event <= max_idle
        });
        let dropped = before - windows.len();
        if dropped > 0 {
            tracing::debug!(dropped, remaining = windows.len(), "swept stale velocity actors");
        }
        dropped
    }

    fn slot(&self, actor: &ActorKey, now: DateTime<Utc>) -> Arc<Mutex<VelocityWindow>> {
        {
            let windows = self.windows.read().unwrap_or_else(|e| e.into_inner());
            if let Some(slot) = windows.get(actor) {
                return Arc::clone(slot);
            }
        }
        let mut windows = self.windows.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            windows
                .entry(actor.clone())
                .or_insert_with(|| Arc::new(Mutex::new(VelocityWindow::new(now)))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::ActorKind;
    use rust_decimal_macros::dec;

    fn actor() -> ActorKey {
        ActorKey::new(ActorKind::Customer, "CUST-001")
    }

    #[test]
    fn test_record_returns_updated_window() {
        let tracker = VelocityTracker::new();

        let w = tracker.record(EventKind::Refund, &actor(), dec!(20));
        assert_eq!(w.hour.refunds, 1);

        let w = tracker.record(EventKind::Refund, &actor(), dec!(30));
        assert_eq!(w.hour.refunds, 2);
        assert_eq!(w.hour.amount, dec!(50));
    }

    #[test]
    fn test_actors_are_independent() {
        let tracker = VelocityTracker::new();
        let other = ActorKey::new(ActorKind::Customer, "CUST-002");

        tracker.record(EventKind::Payment, &actor(), dec!(10));
        tracker.record(EventKind::Payment, &actor(), dec!(10));
        tracker.record(EventKind::Payment, &other, dec!(10));

        assert_eq!(tracker.window(&actor()).unwrap().hour.payments, 2);
        assert_eq!(tracker.window(&other).unwrap().hour.payments, 1);
        assert_eq!(tracker.actor_count(), 2);
    }

    #[test]
    fn test_same_id_different_kind_tracked_separately() {
        let tracker = VelocityTracker::new();
        let customer = ActorKey::new(ActorKind::Customer, "X-1");
        let session = ActorKey::new(ActorKind::Session, "X-1");

        tracker.record(EventKind::Payment, &customer, dec!(10));

        assert!(tracker.window(&customer).is_some());
        assert!(tracker.window(&session).is_none());
    }

    #[test]
    fn test_window_reset_after_expiry() {
        let tracker = VelocityTracker::new();
        let start = Utc::now();

        tracker.record_at(EventKind::Refund, &actor(), dec!(10), start);
        tracker.record_at(EventKind::Refund, &actor(), dec!(10), start);

        let w = tracker.record_at(
            EventKind::Refund,
            &actor(),
            dec!(10),
            start + Duration::minutes(61),
        );

        assert_eq!(w.hour.refunds, 1);
        assert_eq!(w.day.refunds, 3);
    }

    #[test]
    fn test_sweep_stale() {
        let tracker = VelocityTracker::new();
        let start = Utc::now();
        let idle = ActorKey::new(ActorKind::Customer, "CUST-IDLE");

        tracker.record_at(EventKind::Payment, &idle, dec!(10), start);
        tracker.record_at(EventKind::Payment, &actor(), dec!(10), start + Duration::days(9));

        let dropped = tracker.sweep_stale_at(Duration::days(7), start + Duration::days(9));

        assert_eq!(dropped, 1);
        assert!(tracker.window(&idle).is_none());
        assert!(tracker.window(&actor()).is_some());
    }

    #[test]
    fn test_concurrent_same_actor_no_lost_increments() {
        let tracker = Arc::new(VelocityTracker::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    tracker.record(EventKind::Payment, &actor(), dec!(1));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let w = tracker.window(&actor()).unwrap();
        assert_eq!(w.hour.payments, 400);
        assert_eq!(w.hour.amount, dec!(400));
    }
}
