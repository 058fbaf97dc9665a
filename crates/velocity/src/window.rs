//! Rolling window counters for a single actor

use chrono::{DateTime, Duration, Utc};
use fraudguard_core::EventKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Counters for one rolling window (hour, day or week)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowBucket {
    pub payments: u32,
    pub refunds: u32,
    /// Summed monetary amount of all events in the window
    pub amount: Decimal,
    /// Instant the window was last reset to zero
    pub last_reset: DateTime<Utc>,
}

impl WindowBucket {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            payments: 0,
            refunds: 0,
            amount: Decimal::ZERO,
            last_reset: now,
        }
    }

    /// Total event count in this window
    pub fn count(&self) -> u32 {
        self.payments + self.refunds
    }

    /// Reset once if the window's age exceeds `duration`
    fn roll(&mut self, duration: Duration, now: DateTime<Utc>) {
        if now - self.last_reset > duration {
            self.payments = 0;
            self.refunds = 0;
            self.amount = Decimal::ZERO;
            self.last_reset = now;
        }
    }

    fn record(&mut self, kind: EventKind, amount: Decimal) {
        match kind {
            EventKind::Payment => self.payments += 1,
            EventKind::Refund => self.refunds += 1,
        }
        self.amount += amount;
    }
}

/// Per-actor velocity state: hour/day/week counters plus first-seen instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityWindow {
    pub hour: WindowBucket,
    pub day: WindowBucket,
    pub week: WindowBucket,
    /// First observed activity for this actor; never reset
    pub first_seen: DateTime<Utc>,
    /// Most recent event (used by housekeeping to drop idle actors)
    pub last_event: DateTime<Utc>,
}

impl VelocityWindow {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            hour: WindowBucket::new(now),
            day: WindowBucket::new(now),
            week: WindowBucket::new(now),
            first_seen: now,
            last_event: now,
        }
    }

    /// Roll expired windows, then record one event
    pub fn record_at(&mut self, kind: EventKind, amount: Decimal, now: DateTime<Utc>) {
        self.hour.roll(Duration::hours(1), now);
        self.day.roll(Duration::hours(24), now);
        self.week.roll(Duration::days(7), now);

        self.hour.record(kind, amount);
        self.day.record(kind, amount);
        self.week.record(kind, amount);
        self.last_event = now;
    }

    /// Age of the actor's first observed activity
    pub fn account_age(&self, now: DateTime<Utc>) -> Duration {
        now - self.first_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_increments_all_windows() {
        let now = Utc::now();
        let mut w = VelocityWindow::new(now);

        w.record_at(EventKind::Payment, dec!(50), now);
        w.record_at(EventKind::Refund, dec!(20), now);

        for bucket in [&w.hour, &w.day, &w.week] {
            assert_eq!(bucket.payments, 1);
            assert_eq!(bucket.refunds, 1);
            assert_eq!(bucket.count(), 2);
            assert_eq!(bucket.amount, dec!(70));
        }
    }

    #[test]
    fn test_repeated_records_within_window_never_reset() {
        let now = Utc::now();
        let mut w = VelocityWindow::new(now);

        for i in 0..5 {
            w.record_at(EventKind::Refund, dec!(10), now + Duration::minutes(i * 5));
        }

        assert_eq!(w.hour.refunds, 5);
        assert_eq!(w.hour.amount, dec!(50));
    }

    #[test]
    fn test_expired_hour_resets_exactly_that_window() {
        let start = Utc::now();
        let mut w = VelocityWindow::new(start);

        w.record_at(EventKind::Refund, dec!(10), start);
        w.record_at(EventKind::Refund, dec!(10), start + Duration::minutes(30));

        // 61 minutes after the last reset: hour expires, day and week do not
        let later = start + Duration::minutes(61);
        w.record_at(EventKind::Refund, dec!(10), later);

        assert_eq!(w.hour.refunds, 1);
        assert_eq!(w.hour.amount, dec!(10));
        assert_eq!(w.hour.last_reset, later);
        assert_eq!(w.day.refunds, 3);
        assert_eq!(w.week.refunds, 3);
    }

    #[test]
    fn test_week_expiry_resets_everything() {
        let start = Utc::now();
        let mut w = VelocityWindow::new(start);
        w.record_at(EventKind::Payment, dec!(100), start);

        let later = start + Duration::days(8);
        w.record_at(EventKind::Payment, dec!(5), later);

        assert_eq!(w.hour.payments, 1);
        assert_eq!(w.day.payments, 1);
        assert_eq!(w.week.payments, 1);
        assert_eq!(w.week.amount, dec!(5));
    }

    #[test]
    fn test_first_seen_never_reset() {
        let start = Utc::now();
        let mut w = VelocityWindow::new(start);
        w.record_at(EventKind::Payment, dec!(1), start + Duration::days(30));
        assert_eq!(w.first_seen, start);
    }
}
