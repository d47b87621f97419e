//! Lock-free usage counters for the cache facades.
//!
//! All counters use `Ordering::Relaxed`: they are observational and never
//! feed back into eviction decisions.

pub mod snapshot;

use std::sync::atomic::{AtomicU64, Ordering};

pub use snapshot::CacheMetricsSnapshot;

/// Atomic counters shared by every operation on a cache.
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    removes: AtomicU64,
    expirations: AtomicU64,
    compactions: AtomicU64,
    evictions: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn snapshot(&self, len: usize, capacity: usize) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            compactions: self.compactions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            len,
            capacity,
        }
    }

    pub(crate) fn inc_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_expirations(&self, n: usize) {
        if n > 0 {
            self.expirations.fetch_add(n as u64, Ordering::Relaxed);
        }
    }

    pub(crate) fn inc_compaction(&self) {
        self.compactions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_evictions(&self, n: usize) {
        if n > 0 {
            self.evictions.fetch_add(n as u64, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let counters = CacheCounters::default();
        counters.inc_hit();
        counters.inc_hit();
        counters.inc_miss();
        counters.inc_insert();
        counters.add_evictions(3);
        counters.add_expirations(0);

        let snap = counters.snapshot(5, 16);
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.inserts, 1);
        assert_eq!(snap.evictions, 3);
        assert_eq!(snap.expirations, 0);
        assert_eq!(snap.len, 5);
        assert_eq!(snap.capacity, 16);
    }
}
