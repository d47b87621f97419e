/// Point-in-time copy of a cache's counters and gauges.
///
/// Counters are monotonically increasing since construction; `len` and
/// `capacity` are gauges captured when the snapshot is taken.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    /// Loads that found a live value.
    pub hits: u64,
    /// Loads that found nothing, or only a dead cell.
    pub misses: u64,

    /// New keys written at the cursor.
    pub inserts: u64,
    /// Overwrites of an indexed key.
    pub updates: u64,
    /// Explicit tombstones.
    pub removes: u64,
    /// Cells tombstoned by lazy expiry.
    pub expirations: u64,

    /// Policy passes that did work.
    pub compactions: u64,
    /// Live cells dropped by compaction or cursor reuse.
    pub evictions: u64,

    /// Live entries when the snapshot was taken.
    pub len: usize,
    /// Slot count of the cache.
    pub capacity: usize,
}

impl CacheMetricsSnapshot {
    /// Fraction of loads that found a live value, `0.0` when nothing was loaded.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_ratio_handles_empty() {
        assert_eq!(CacheMetricsSnapshot::default().hit_ratio(), 0.0);
    }

    #[test]
    fn hit_ratio_divides() {
        let snap = CacheMetricsSnapshot {
            hits: 3,
            misses: 1,
            ..Default::default()
        };
        assert!((snap.hit_ratio() - 0.75).abs() < f64::EPSILON);
    }
}
