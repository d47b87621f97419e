//! Eviction policies that compact a full [`Slab`].
//!
//! A policy never owns cells. The cache facade holds the slab behind its
//! write lock and hands it to [`EvictionPolicy::compact`] when the cursor
//! reaches the end of the slot array or when `purge()` is called. The policy
//! decides the new live set, fixes the index and moves the cursor.
//!
//! ```text
//!   ┌──────────────┬───────────────────────┬─────────────────────────────────┐
//!   │ Policy       │ Runs when             │ Compaction                      │
//!   ├──────────────┼───────────────────────┼─────────────────────────────────┤
//!   │ ArcHybrid    │ cursor > 2/3 capacity │ frequency/recency blend sort,   │
//!   │              │                       │ age re-sort of the tail, cut    │
//!   │              │                       │ near the midpoint               │
//!   │ Lru          │ every fill / purge    │ sort by last read, drop dead,   │
//!   │              │                       │ cursor reuses the LRU slots     │
//!   │ RingCycle    │ every fill / purge    │ single scan, swap live cells    │
//!   │              │                       │ into dead slots, no ranking     │
//!   └──────────────┴───────────────────────┴─────────────────────────────────┘
//! ```
//!
//! Policies also observe reads ([`EvictionPolicy::on_read`]) and removals
//! ([`EvictionPolicy::on_remove`]); both run under the shared lock and may
//! only touch atomics.
//!
//! [`Policy`] is the runtime-selectable variant used by
//! [`CacheBuilder`](crate::builder::CacheBuilder).

pub mod arc;
pub mod cycle;
pub mod lru;

use std::hash::Hash;
use std::time::Instant;

use crate::store::cell::Cell;
use crate::store::slab::Slab;

pub use arc::ArcHybrid;
pub use cycle::RingCycle;
pub use lru::Lru;

/// Summary of a compaction pass that did work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compaction {
    /// Cells tombstoned by expiry during the pass.
    pub expired: usize,
    /// Cells physically dropped from the slab.
    pub discarded: usize,
    /// Live cells among the dropped ones.
    pub evicted: usize,
    /// Insertion cursor after the pass.
    pub cursor: usize,
}

/// Strategy that decides which cells survive when the slab fills.
pub trait EvictionPolicy: Send + Sync {
    /// Short name for log output.
    fn name(&self) -> &'static str;

    /// Called after a successful load, under the shared lock.
    fn on_read<K, V>(&self, cell: &Cell<K, V>, tick: u64) {
        let _ = (cell, tick);
    }

    /// Called whenever the facade tombstones a cell (explicit remove or lazy
    /// expiry), under the shared lock.
    fn on_remove(&self) {}

    /// Compacts `slab` in place. Returns `None` when the policy decided there
    /// was nothing to do.
    fn compact<K, V>(&self, slab: &mut Slab<K, V>, now: Instant) -> Option<Compaction>
    where
        K: Eq + Hash + Clone;
}

/// Slot classification shared by the sorting policies. The derived order is
/// the survival order: live cells first, empty slots last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum SlotState {
    Live,
    Removed,
    Empty,
}

impl SlotState {
    /// Classifies a slot. Expiry must already have been applied.
    pub(crate) fn of<K, V>(slot: &Option<Cell<K, V>>) -> Self {
        match slot {
            None => SlotState::Empty,
            Some(cell) if cell.is_removed() => SlotState::Removed,
            Some(_) => SlotState::Live,
        }
    }
}

/// Runtime choice between the three built-in policies.
#[derive(Debug)]
pub enum Policy {
    ArcHybrid(ArcHybrid),
    Lru(Lru),
    Cycle(RingCycle),
}

impl EvictionPolicy for Policy {
    fn name(&self) -> &'static str {
        match self {
            Policy::ArcHybrid(policy) => policy.name(),
            Policy::Lru(policy) => policy.name(),
            Policy::Cycle(policy) => policy.name(),
        }
    }

    fn on_read<K, V>(&self, cell: &Cell<K, V>, tick: u64) {
        match self {
            Policy::ArcHybrid(policy) => policy.on_read(cell, tick),
            Policy::Lru(policy) => policy.on_read(cell, tick),
            Policy::Cycle(policy) => policy.on_read(cell, tick),
        }
    }

    fn on_remove(&self) {
        match self {
            Policy::ArcHybrid(policy) => policy.on_remove(),
            Policy::Lru(policy) => policy.on_remove(),
            Policy::Cycle(policy) => policy.on_remove(),
        }
    }

    fn compact<K, V>(&self, slab: &mut Slab<K, V>, now: Instant) -> Option<Compaction>
    where
        K: Eq + Hash + Clone,
    {
        match self {
            Policy::ArcHybrid(policy) => policy.compact(slab, now),
            Policy::Lru(policy) => policy.compact(slab, now),
            Policy::Cycle(policy) => policy.compact(slab, now),
        }
    }
}

impl From<ArcHybrid> for Policy {
    fn from(policy: ArcHybrid) -> Self {
        Policy::ArcHybrid(policy)
    }
}

impl From<Lru> for Policy {
    fn from(policy: Lru) -> Self {
        Policy::Lru(policy)
    }
}

impl From<RingCycle> for Policy {
    fn from(policy: RingCycle) -> Self {
        Policy::Cycle(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_state_order_is_survival_order() {
        assert!(SlotState::Live < SlotState::Removed);
        assert!(SlotState::Removed < SlotState::Empty);
    }

    #[test]
    fn slot_state_classifies() {
        let empty: Option<Cell<u32, u32>> = None;
        assert_eq!(SlotState::of(&empty), SlotState::Empty);

        let live = Some(Cell::new(1u32, 1u32, 1, 0, None));
        assert_eq!(SlotState::of(&live), SlotState::Live);

        if let Some(cell) = &live {
            cell.mark_removed();
        }
        assert_eq!(SlotState::of(&live), SlotState::Removed);
    }

    #[test]
    fn policy_enum_dispatches_names() {
        assert_eq!(Policy::from(ArcHybrid::default()).name(), "arc-hybrid");
        assert_eq!(Policy::from(Lru::default()).name(), "lru");
        assert_eq!(Policy::from(RingCycle::default()).name(), "cycle");
    }
}
