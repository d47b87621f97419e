//! A single slab entry and its lock-free metadata.
//!
//! A [`Cell`] is owned by exactly one slab slot at a time. Its key, value,
//! write age and expiry are fixed when the cell is created; a new write to
//! the same key replaces the whole cell. The remaining fields are atomics so
//! that readers holding only the shared slab lock can still:
//!
//! - tombstone the cell (`remove`, lazy expiry), and
//! - record usage statistics (`reads` for ARC-hybrid, `last_read` for LRU).
//!
//! ```text
//!   Cell<K, V>
//!   ┌──────────────────────────────────────────────┐
//!   │ key: K            value: V                   │  immutable
//!   │ age: u64          expires_at: Option<Instant>│
//!   ├──────────────────────────────────────────────┤
//!   │ reads: AtomicU64       (saturating)          │  shared-lock writable
//!   │ last_read: AtomicU64   (ticks, fetch_max)    │
//!   │ removed: AtomicBool    (never cleared)       │
//!   └──────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

/// A stored entry: key, value, recency/frequency metadata and tombstone.
#[derive(Debug)]
pub struct Cell<K, V> {
    key: K,
    value: V,
    age: u64,
    reads: AtomicU64,
    last_read: AtomicU64,
    removed: AtomicBool,
    expires_at: Option<Instant>,
}

impl<K, V> Cell<K, V> {
    /// Creates a live cell.
    ///
    /// `written_at` seeds `last_read`, so an unread cell counts as recent as
    /// its write.
    pub fn new(key: K, value: V, age: u64, written_at: u64, expires_at: Option<Instant>) -> Self {
        Self {
            key,
            value,
            age,
            reads: AtomicU64::new(0),
            last_read: AtomicU64::new(written_at),
            removed: AtomicBool::new(false),
            expires_at,
        }
    }

    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Write age assigned by the slab's global counter. Larger is newer.
    #[inline]
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Number of successful loads recorded since the cell was written.
    #[inline]
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Slab tick of the most recent load (or of the write, if never read).
    #[inline]
    pub fn last_read(&self) -> u64 {
        self.last_read.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Tombstones the cell. Returns `true` if this call did the transition.
    #[inline]
    pub fn mark_removed(&self) -> bool {
        !self.removed.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` once `now` has reached the expiry instant.
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }

    /// Non-tombstoned and not past expiry. Has no side effects.
    #[inline]
    pub fn is_live(&self, now: Instant) -> bool {
        !self.is_removed() && !self.is_expired(now)
    }

    /// Tombstones the cell if its expiry has passed.
    ///
    /// Returns `true` only for the call that performed the tombstoning, so
    /// callers can count each expiry once.
    pub fn expire_if_due(&self, now: Instant) -> bool {
        if self.is_removed() || !self.is_expired(now) {
            return false;
        }
        self.mark_removed()
    }

    /// Bumps the read counter, saturating at `u64::MAX`.
    #[inline]
    pub fn record_read(&self) {
        let mut current = self.reads.load(Ordering::Relaxed);
        while current != u64::MAX {
            match self.reads.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Records a load at slab tick `tick`. Concurrent touches never move the
    /// timestamp backwards.
    #[inline]
    pub fn touch(&self, tick: u64) {
        self.last_read.fetch_max(tick, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn new_cell_is_live_and_unread() {
        let cell = Cell::new("k", 1, 7, 42, None);
        assert_eq!(cell.age(), 7);
        assert_eq!(cell.reads(), 0);
        assert_eq!(cell.last_read(), 42);
        assert!(cell.is_live(Instant::now()));
    }

    #[test]
    fn mark_removed_reports_first_transition_only() {
        let cell = Cell::new("k", 1, 1, 0, None);
        assert!(cell.mark_removed());
        assert!(!cell.mark_removed());
        assert!(cell.is_removed());
    }

    #[test]
    fn expiry_is_inclusive_of_the_deadline() {
        let now = Instant::now();
        let cell = Cell::new("k", 1, 1, 0, Some(now));
        assert!(cell.is_expired(now));
        assert!(!cell.is_live(now));
        assert!(!cell.is_removed());

        assert!(cell.expire_if_due(now));
        assert!(cell.is_removed());
        assert!(!cell.expire_if_due(now));
    }

    #[test]
    fn future_expiry_is_live() {
        let now = Instant::now();
        let cell = Cell::new("k", 1, 1, 0, Some(now + Duration::from_secs(60)));
        assert!(cell.is_live(now));
        assert!(!cell.expire_if_due(now));
    }

    #[test]
    fn touch_keeps_the_latest_tick() {
        let cell = Cell::new("k", 1, 1, 10, None);
        cell.touch(50);
        cell.touch(20);
        assert_eq!(cell.last_read(), 50);
    }

    #[test]
    fn record_read_counts() {
        let cell = Cell::new("k", 1, 1, 0, None);
        for _ in 0..5 {
            cell.record_read();
        }
        assert_eq!(cell.reads(), 5);
    }

    #[test]
    fn record_read_saturates_at_max() {
        let cell = Cell::new("k", 1, 1, 0, None);
        cell.reads.store(u64::MAX - 1, Ordering::Relaxed);
        cell.record_read();
        assert_eq!(cell.reads(), u64::MAX);
        cell.record_read();
        assert_eq!(cell.reads(), u64::MAX);
    }
}
