//! Bounded in-memory trend store.
//!
//! A ring buffer of tick snapshots with a capacity fixed at construction
//! (default two hours at 1 Hz). The only mutations are append with
//! oldest-first eviction, and clear on reset. The engine task is the sole
//! writer; concurrent readers go through an `RwLock` wrapper, so every
//! read is linearised at an append boundary and never observes a torn
//! entry.

use std::collections::VecDeque;

use tanksim_core::snapshot::Snapshot;

/// Default capacity: 2 hours of history at 1 Hz.
pub const DEFAULT_CAPACITY: usize = 7200;

/// Bounded FIFO of tick snapshots, evicting oldest-first when full.
#[derive(Debug, Clone)]
pub struct Historian {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl Historian {
    /// Create an empty historian holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True before the first tick and right after a clear.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one snapshot, evicting the oldest entry first when full.
    pub fn append(&mut self, snapshot: Snapshot) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// The most recent entry, if any tick has run.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.back()
    }

    /// The oldest retained entry.
    pub fn oldest(&self) -> Option<&Snapshot> {
        self.entries.front()
    }

    /// The contiguous tail covering the trailing `duration_s` seconds:
    /// entries with `t > t_newest - duration_s`, in chronological order.
    /// At 1 Hz this is the last `duration_s` entries (or fewer early on).
    pub fn range(&self, duration_s: f64) -> Vec<Snapshot> {
        let Some(newest) = self.entries.back() else {
            return Vec::new();
        };
        let cutoff = newest.t - duration_s;
        self.entries
            .iter()
            .filter(|s| s.t > cutoff)
            .cloned()
            .collect()
    }

    /// Drop every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tanksim_core::config::DisturbanceKind;

    fn snap(t: f64) -> Snapshot {
        Snapshot {
            t,
            level: 2.5,
            inlet_flow: 1.0,
            outlet_flow: 1.0,
            valve_position: 0.5,
            controllers: Vec::new(),
            inlet_mode: DisturbanceKind::Constant,
        }
    }

    #[test]
    fn empty_historian_has_no_entries() {
        let h = Historian::new(10);
        assert!(h.is_empty());
        assert_eq!(h.latest(), None);
        assert!(h.range(5.0).is_empty());
    }

    #[test]
    fn append_and_latest() {
        let mut h = Historian::new(10);
        h.append(snap(1.0));
        h.append(snap(2.0));
        assert_eq!(h.len(), 2);
        assert_eq!(h.latest().map(|s| s.t), Some(2.0));
        assert_eq!(h.oldest().map(|s| s.t), Some(1.0));
    }

    #[test]
    fn eviction_is_oldest_first() {
        let mut h = Historian::new(5);
        for n in 1..=8 {
            h.append(snap(n as f64));
        }
        assert_eq!(h.len(), 5);
        assert_eq!(h.oldest().map(|s| s.t), Some(4.0));
        assert_eq!(h.latest().map(|s| s.t), Some(8.0));
    }

    #[test]
    fn range_returns_contiguous_tail() {
        let mut h = Historian::new(100);
        for n in 1..=20 {
            h.append(snap(n as f64));
        }
        let tail = h.range(5.0);
        let times: Vec<f64> = tail.iter().map(|s| s.t).collect();
        assert_eq!(times, vec![16.0, 17.0, 18.0, 19.0, 20.0]);
    }

    #[test]
    fn range_longer_than_history_returns_everything() {
        let mut h = Historian::new(100);
        for n in 1..=3 {
            h.append(snap(n as f64));
        }
        assert_eq!(h.range(1000.0).len(), 3);
    }

    #[test]
    fn clear_empties_but_keeps_capacity() {
        let mut h = Historian::new(5);
        for n in 1..=5 {
            h.append(snap(n as f64));
        }
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.capacity(), 5);
        h.append(snap(1.0));
        assert_eq!(h.len(), 1);
    }
}
