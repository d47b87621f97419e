//! Ring-buffer compaction with no ranking.
//!
//! The cheapest of the three policies: loads record nothing and a full slab
//! normally just wraps the cursor to slot 0, overwriting the oldest writes
//! first (FIFO reuse). A partially filled slab with nothing removed is left
//! alone.
//!
//! Only when cells have been removed or seen expired since the last pass does
//! compaction scan the slab, pulling later live cells forward into dead slots
//! with pairwise swaps:
//!
//! ```text
//!   i ─►                       donor ─►
//!   ┌────┬────┬────┬────┬────┬────┬────┬────┐
//!   │ A  │ ✝  │ B  │ ✝  │ ✝  │ C  │ ✝  │ D  │    pending = 4
//!   └────┴────┴────┴────┴────┴────┴────┴────┘
//!          ▲    │
//!          └────┘ swap(1, 2)
//!
//!   ┌────┬────┬────┬────┬────┬────┬────┬────┐
//!   │ A  │ B  │ C  │ D  │    │    │    │    │    cursor = 4
//!   └────┴────┴────┴────┴────┴────┴────┴────┘
//! ```
//!
//! The donor index never moves backwards, so the scan is a single
//! O(capacity) pass. Once no live donor remains, the dead tail is dropped.

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::policy::{Compaction, EvictionPolicy};
use crate::store::slab::Slab;

/// FIFO ring policy with swap compaction.
#[derive(Debug, Default)]
pub struct RingCycle {
    pending_removals: AtomicUsize,
}

impl RingCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removals and lazy expiries recorded since the last compaction.
    pub fn pending_removals(&self) -> usize {
        self.pending_removals.load(Ordering::Relaxed)
    }
}

/// Live or dead, after applying expiry at `now`. `None` for an empty slot.
fn slot_liveness<K, V>(
    slab: &Slab<K, V>,
    pos: usize,
    now: Instant,
    expired: &mut usize,
) -> Option<bool>
where
    K: Eq + Hash + Clone,
{
    let cell = slab.slots()[pos].as_ref()?;
    if cell.expire_if_due(now) {
        *expired += 1;
    }
    Some(!cell.is_removed())
}

impl EvictionPolicy for RingCycle {
    fn name(&self) -> &'static str {
        "cycle"
    }

    #[inline]
    fn on_remove(&self) {
        self.pending_removals.fetch_add(1, Ordering::Relaxed);
    }

    fn compact<K, V>(&self, slab: &mut Slab<K, V>, now: Instant) -> Option<Compaction>
    where
        K: Eq + Hash + Clone,
    {
        if self.pending_removals.swap(0, Ordering::AcqRel) == 0 {
            if slab.is_full() {
                slab.set_cursor(0);
            }
            return None;
        }

        let capacity = slab.capacity();
        let mut expired = 0;
        let mut donor = 0;
        let mut cursor = 0;

        for i in 0..capacity {
            match slot_liveness(slab, i, now, &mut expired) {
                None => {
                    cursor = i;
                    break;
                },
                Some(true) => continue,
                Some(false) => {},
            }

            donor = donor.max(i + 1);
            let mut found = None;
            while donor < capacity {
                let pos = donor;
                donor += 1;
                match slot_liveness(slab, pos, now, &mut expired) {
                    None => {
                        donor = capacity;
                        break;
                    },
                    Some(true) => {
                        found = Some(pos);
                        break;
                    },
                    Some(false) => {},
                }
            }

            match found {
                Some(pos) => slab.swap(i, pos),
                None => {
                    cursor = i;
                    break;
                },
            }
        }

        let discarded = slab.discard_dead(cursor..capacity);
        slab.set_cursor(cursor);
        debug_assert!(slab.check_invariants().is_ok());

        Some(Compaction {
            expired,
            discarded,
            evicted: 0,
            cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn filled(capacity: usize) -> Slab<u32, u32> {
        let mut slab = Slab::new(capacity).unwrap();
        let now = Instant::now();
        for key in 0..capacity as u32 {
            slab.put(key, key, None, now);
        }
        slab
    }

    fn remove(policy: &RingCycle, slab: &Slab<u32, u32>, key: u32) {
        assert!(slab.get(&key).unwrap().mark_removed());
        policy.on_remove();
    }

    #[test]
    fn no_removals_wraps_cursor_only() {
        let policy = RingCycle::new();
        let mut slab = filled(8);

        assert_eq!(policy.compact(&mut slab, Instant::now()), None);
        assert_eq!(slab.cursor(), 0);
        assert_eq!(slab.indexed_len(), 8);
    }

    #[test]
    fn no_removals_keeps_cursor_of_partial_slab() {
        let policy = RingCycle::new();
        let mut slab: Slab<u32, u32> = Slab::new(8).unwrap();
        let now = Instant::now();
        for key in 0..3 {
            slab.put(key, key, None, now);
        }

        assert_eq!(policy.compact(&mut slab, now), None);
        assert_eq!(slab.cursor(), 3);
    }

    #[test]
    fn swaps_live_cells_forward() {
        let policy = RingCycle::new();
        let mut slab = filled(8);
        for key in [1, 3, 4, 6] {
            remove(&policy, &slab, key);
        }
        assert_eq!(policy.pending_removals(), 4);

        let outcome = policy.compact(&mut slab, Instant::now()).unwrap();
        assert_eq!(outcome.cursor, 4);
        assert_eq!(outcome.discarded, 4);
        assert_eq!(policy.pending_removals(), 0);

        assert_eq!(slab.position(&0), Some(0));
        assert_eq!(slab.position(&2), Some(1));
        assert_eq!(slab.position(&5), Some(2));
        assert_eq!(slab.position(&7), Some(3));
        for pos in 4..8 {
            assert!(slab.slots()[pos].is_none());
        }
        slab.check_invariants().unwrap();
    }

    #[test]
    fn stops_at_first_empty_slot() {
        let policy = RingCycle::new();
        let mut slab: Slab<u32, u32> = Slab::new(8).unwrap();
        let now = Instant::now();
        for key in 0..5 {
            slab.put(key, key, None, now);
        }
        remove(&policy, &slab, 0);

        let outcome = policy.compact(&mut slab, now).unwrap();
        assert_eq!(outcome.cursor, 4);
        assert_eq!(slab.position(&1), Some(0));
        assert_eq!(slab.position(&4), Some(3));
        slab.check_invariants().unwrap();
    }

    #[test]
    fn all_live_after_swaps_resets_cursor() {
        let policy = RingCycle::new();
        let mut slab = filled(8);
        // counter bumped but nothing is actually dead
        policy.on_remove();

        let outcome = policy.compact(&mut slab, Instant::now()).unwrap();
        assert_eq!(outcome.cursor, 0);
        assert_eq!(outcome.discarded, 0);
        assert_eq!(slab.indexed_len(), 8);
    }

    #[test]
    fn expired_donors_are_skipped() {
        let policy = RingCycle::new();
        let mut slab: Slab<u32, u32> = Slab::new(8).unwrap();
        let now = Instant::now();
        for key in 0..8 {
            let expires = (key == 2).then_some(now);
            slab.put(key, key, expires, now);
        }
        remove(&policy, &slab, 1);

        let outcome = policy
            .compact(&mut slab, now + Duration::from_millis(1))
            .unwrap();
        assert_eq!(outcome.expired, 1);
        assert_eq!(outcome.cursor, 6);
        assert_eq!(slab.position(&3), Some(1));
        assert!(!slab.contains_key(&2));
        slab.check_invariants().unwrap();
    }

    #[test]
    fn everything_dead_empties_the_slab() {
        let policy = RingCycle::new();
        let mut slab = filled(8);
        for key in 0..8 {
            remove(&policy, &slab, key);
        }
        let outcome = policy.compact(&mut slab, Instant::now()).unwrap();
        assert_eq!(outcome.cursor, 0);
        assert_eq!(outcome.discarded, 8);
        assert!(slab.slots().iter().all(Option::is_none));
        assert_eq!(slab.indexed_len(), 0);
    }
}
