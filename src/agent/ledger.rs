//! Counter delta bookkeeping
//!
//! The agent store holds running counter totals. The server expects
//! deltas, so the ledger remembers how much of each total the server has
//! acknowledged and how much is currently in flight.

use crate::core::metrics::{Metric, MetricValue};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Entry {
    acknowledged: i64,
    reserved: i64,
}

/// Tracks acknowledged and in-flight counter units per metric
#[derive(Debug, Default)]
pub struct CounterLedger {
    entries: Mutex<HashMap<String, Entry>>,
}

impl CounterLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the outstanding delta of every counter in `metrics`
    ///
    /// Units reserved here are invisible to later reservations until they
    /// are rolled back, so concurrent ticks never report them twice.
    pub fn reserve(self: &Arc<Self>, metrics: &[Metric]) -> Reservation {
        let mut entries = self.entries.lock();
        let mut pending = HashMap::new();

        for metric in metrics {
            let MetricValue::Counter(total) = metric.value else {
                continue;
            };
            let entry = entries.entry(metric.id.clone()).or_default();
            let outstanding = total - entry.acknowledged - entry.reserved;
            if outstanding > 0 {
                entry.reserved += outstanding;
                pending.insert(metric.id.clone(), outstanding);
            }
        }

        Reservation {
            ledger: Arc::clone(self),
            pending,
        }
    }

    /// Units of `id` the server has acknowledged
    pub fn acknowledged(&self, id: &str) -> i64 {
        self.entries.lock().get(id).map_or(0, |e| e.acknowledged)
    }

    /// Units of `id` currently in flight
    pub fn reserved(&self, id: &str) -> i64 {
        self.entries.lock().get(id).map_or(0, |e| e.reserved)
    }

    fn settle(&self, id: &str, delta: i64, acknowledged: bool) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(id) {
            entry.reserved -= delta;
            if acknowledged {
                entry.acknowledged += delta;
            }
        }
    }
}

/// Counter deltas taken out for one delivery
///
/// Whatever is not acknowledged when the reservation is dropped goes back
/// to the ledger and is reported again by a later tick.
#[derive(Debug)]
pub struct Reservation {
    ledger: Arc<CounterLedger>,
    pending: HashMap<String, i64>,
}

impl Reservation {
    /// Reserved delta for `id`
    pub fn delta(&self, id: &str) -> Option<i64> {
        self.pending.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Mark the delta of `id` as accepted by the server
    pub fn acknowledge(&mut self, id: &str) {
        if let Some(delta) = self.pending.remove(id) {
            self.ledger.settle(id, delta, true);
        }
    }

    pub fn acknowledge_all(&mut self) {
        for (id, delta) in self.pending.drain() {
            self.ledger.settle(&id, delta, true);
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        for (id, delta) in self.pending.drain() {
            self.ledger.settle(&id, delta, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(id: &str, total: i64) -> Metric {
        Metric::new(id, MetricValue::Counter(total))
    }

    #[test]
    fn test_acknowledged_delta_is_not_resent() {
        let ledger = Arc::new(CounterLedger::new());

        let mut first = ledger.reserve(&[counter("PollCount", 5)]);
        assert_eq!(first.delta("PollCount"), Some(5));
        first.acknowledge_all();
        drop(first);

        let second = ledger.reserve(&[counter("PollCount", 8)]);
        assert_eq!(second.delta("PollCount"), Some(3));
    }

    #[test]
    fn test_failed_delivery_rolls_back() {
        let ledger = Arc::new(CounterLedger::new());

        let failed = ledger.reserve(&[counter("PollCount", 5)]);
        assert_eq!(ledger.reserved("PollCount"), 5);
        drop(failed);
        assert_eq!(ledger.reserved("PollCount"), 0);
        assert_eq!(ledger.acknowledged("PollCount"), 0);

        let retry = ledger.reserve(&[counter("PollCount", 7)]);
        assert_eq!(retry.delta("PollCount"), Some(7));
    }

    #[test]
    fn test_concurrent_reservations_do_not_overlap() {
        let ledger = Arc::new(CounterLedger::new());

        let first = ledger.reserve(&[counter("PollCount", 5)]);
        let second = ledger.reserve(&[counter("PollCount", 9)]);
        let third = ledger.reserve(&[counter("PollCount", 9)]);

        assert_eq!(first.delta("PollCount"), Some(5));
        assert_eq!(second.delta("PollCount"), Some(4));
        assert!(third.is_empty());
    }

    #[test]
    fn test_partial_acknowledgement() {
        let ledger = Arc::new(CounterLedger::new());

        let mut reservation = ledger.reserve(&[counter("a", 2), counter("b", 3)]);
        reservation.acknowledge("a");
        drop(reservation);

        assert_eq!(ledger.acknowledged("a"), 2);
        assert_eq!(ledger.acknowledged("b"), 0);
        assert_eq!(ledger.reserved("b"), 0);
    }

    #[test]
    fn test_gauges_are_ignored() {
        let ledger = Arc::new(CounterLedger::new());
        let reservation = ledger.reserve(&[Metric::new("Alloc", MetricValue::Gauge(1.0))]);
        assert!(reservation.is_empty());
    }
}
