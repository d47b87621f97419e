//! Approximate LRU compaction.
//!
//! Every load stores the read tick in the cell's `last_read`. When the slab
//! fills (and on every `purge()`), the whole slot array is sorted least
//! recently read first, dead cells are dropped, and the cursor is placed so
//! the next insertions overwrite the coldest cells.
//!
//! ```text
//!   before                         after compact (every slot live)
//!   ┌────┬────┬────┬────┬────┐     ┌────┬────┬────┬────┬────┐
//!   │ t7 │ t2 │ ✝  │ t9 │ t4 │     │ t2 │ t4 │ t7 │ t9 │    │  cursor = 4
//!   └────┴────┴────┴────┴────┘     └────┴────┴────┴────┴────┘
//!
//!   full slab, no dead cells       ┌────┬────┬────┬────┬────┐
//!                                  │ t1 │ t2 │ t4 │ t7 │ t9 │  cursor = 0
//!                                  └────┴────┴────┴────┴────┘
//!                                    ▲ next insert overwrites the LRU cell
//! ```
//!
//! Ordering is approximate: ties in `last_read` keep slot order, and reads
//! racing with a compaction are not observed until the next one.

use std::hash::Hash;
use std::time::Instant;

use crate::policy::{Compaction, EvictionPolicy, SlotState};
use crate::store::cell::Cell;
use crate::store::slab::Slab;

/// Least-recently-read policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lru;

impl Lru {
    pub fn new() -> Self {
        Self
    }
}

impl EvictionPolicy for Lru {
    fn name(&self) -> &'static str {
        "lru"
    }

    #[inline]
    fn on_read<K, V>(&self, cell: &Cell<K, V>, tick: u64) {
        cell.touch(tick);
    }

    fn compact<K, V>(&self, slab: &mut Slab<K, V>, now: Instant) -> Option<Compaction>
    where
        K: Eq + Hash + Clone,
    {
        let capacity = slab.capacity();
        let expired = slab.expire_due(now);

        let mut ranks: Vec<(SlotState, u64, usize)> = slab
            .slots()
            .iter()
            .enumerate()
            .map(|(pos, slot)| {
                let last_read = slot.as_ref().map_or(0, Cell::last_read);
                (SlotState::of(slot), last_read, pos)
            })
            .collect();
        ranks.sort_by_key(|&(state, last_read, _)| (state, last_read));

        let order: Vec<usize> = ranks.iter().map(|&(_, _, pos)| pos).collect();
        slab.reorder(&order);

        let live = ranks
            .iter()
            .take_while(|&&(state, _, _)| state == SlotState::Live)
            .count();
        let discarded = slab.discard_dead(live..capacity);
        slab.rebuild_index();

        let last_live = slab
            .slots()
            .iter()
            .rposition(|slot| slot.as_ref().is_some_and(|cell| !cell.is_removed()));
        let cursor = match last_live {
            Some(pos) if pos + 1 < capacity => pos + 1,
            _ => 0,
        };
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
