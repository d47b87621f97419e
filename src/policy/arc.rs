//! ARC-hybrid compaction: a frequency/recency blend.
//!
//! Reads bump a per-cell counter. When the slab fills, every slot is ranked
//! in two passes and the slab is cut near its midpoint.
//!
//! ## Architecture
//!
//! ```text
//!   slots after pass 1 (blend)          slots after pass 2 (age, tail only)
//!   ┌──────────────────────────┐        ┌──────────────────────────┐
//!   │ hot / old-and-warm       │ 0      │ hot / old-and-warm       │ 0
//!   │ ...                      │        │ ...                      │
//!   ├──────────────────────────┤ cap/4  ├──────────────────────────┤ cap/4
//!   │ colder live cells        │        │ newest live first        │
//!   │ ...                      │        │ ...                      │
//!   │                          │        ├──────────────────────────┤ cap/2+1  ◄── cursor
//!   │ tombstoned               │        │ older cold cells         │
//!   │ empty                    │        │ discarded                │
//!   └──────────────────────────┘        └──────────────────────────┘
//! ```
//!
//! ## Pass 1: blend
//!
//! Live cells sort before tombstoned ones, which sort before empty slots.
//! Two live cells with read counts `r1`, `r2` compare by the share
//! `k = r1 / (r1 + r2)`:
//!
//! | `k`                     | Winner                    |
//! |-------------------------|---------------------------|
//! | inside `(low, high)`    | the older cell (smaller age) |
//! | outside the band        | the cell with more reads  |
//! | `r1 == r2 == 0`         | treated as inside the band |
//!
//! The default band is `(0.35, 0.65)`.
//!
//! ## Pass 2: age
//!
//! From `capacity / 4` onward, slots are re-sorted live first and newest
//! first, so fresh cold entries beat stale cold entries at the cut. Roughly
//! half of the survivors are chosen by frequency and half by recency.
//!
//! ## Cut
//!
//! The boundary starts at `capacity / 2 + 1` and walks back over dead slots
//! (floor 1). Everything from the boundary onward is dropped, the index is
//! rebuilt and the cursor moves to the boundary.
//!
//! ## Gate
//!
//! Compaction only runs once the cursor has passed two thirds of capacity.
//! `purge()` on a lightly filled slab does nothing.

use std::cmp::{Ordering, Reverse};
use std::hash::Hash;
use std::time::Instant;

use crate::error::ConfigError;
use crate::policy::{Compaction, EvictionPolicy, SlotState};
use crate::store::cell::Cell;
use crate::store::slab::Slab;

/// Default lower edge of the indifference band.
pub const DEFAULT_BAND_LOW: f64 = 0.35;
/// Default upper edge of the indifference band.
pub const DEFAULT_BAND_HIGH: f64 = 0.65;

/// Frequency/recency blend policy.
///
/// # Example
///
/// ```
/// use slabcache::policy::arc::ArcHybrid;
///
/// let policy = ArcHybrid::with_band(0.4, 0.6).unwrap();
/// assert_eq!(policy.band(), (0.4, 0.6));
/// assert!(ArcHybrid::with_band(0.7, 0.3).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcHybrid {
    band_low: f64,
    band_high: f64,
}

impl Default for ArcHybrid {
    fn default() -> Self {
        Self {
            band_low: DEFAULT_BAND_LOW,
            band_high: DEFAULT_BAND_HIGH,
        }
    }
}

impl ArcHybrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the policy with a custom indifference band.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] unless `0 < low < high < 1`.
    pub fn with_band(low: f64, high: f64) -> Result<Self, ConfigError> {
        if !(low > 0.0 && low < high && high < 1.0) {
            return Err(ConfigError::new(format!(
                "arc band must satisfy 0 < low < high < 1, got ({low}, {high})"
            )));
        }
        Ok(Self {
            band_low: low,
            band_high: high,
        })
    }

    pub fn band(&self) -> (f64, f64) {
        (self.band_low, self.band_high)
    }

    /// `true` when the two read counts are close enough that age decides.
    fn comparable(&self, a: u64, b: u64) -> bool {
        if a == 0 && b == 0 {
            return true;
        }
        let share = a as f64 / (a as f64 + b as f64);
        share > self.band_low && share < self.band_high
    }

    /// Pass-1 comparator. Not transitive across the band edges.
    fn blend(&self, a: &Rank, b: &Rank) -> Ordering {
        match a.state.cmp(&b.state) {
            Ordering::Equal if a.state == SlotState::Live => {},
            other => return other,
        }
        if self.comparable(a.reads, b.reads) {
            a.age.cmp(&b.age)
        } else {
            b.reads.cmp(&a.reads)
        }
    }
}

/// Snapshot of one slot taken before sorting.
#[derive(Debug, Clone, Copy)]
struct Rank {
    pos: usize,
    state: SlotState,
    reads: u64,
    age: u64,
}

impl Rank {
    fn of<K, V>(pos: usize, slot: &Option<Cell<K, V>>) -> Self {
        let state = SlotState::of(slot);
        let (reads, age) = slot
            .as_ref()
            .map_or((0, 0), |cell| (cell.reads(), cell.age()));
        Self {
            pos,
            state,
            reads,
            age,
        }
    }
}

impl EvictionPolicy for ArcHybrid {
    fn name(&self) -> &'static str {
        "arc-hybrid"
    }

    #[inline]
    fn on_read<K, V>(&self, cell: &Cell<K, V>, _tick: u64) {
        cell.record_read();
    }

    fn compact<K, V>(&self, slab: &mut Slab<K, V>, now: Instant) -> Option<Compaction>
    where
        K: Eq + Hash + Clone,
    {
        let capacity = slab.capacity();
        if slab.cursor() <= capacity * 2 / 3 {
            return None;
        }

        let expired = slab.expire_due(now);

        let mut ranks: Vec<Rank> = slab
            .slots()
            .iter()
            .enumerate()
            .map(|(pos, slot)| Rank::of(pos, slot))
            .collect();

        merge_sort_by(&mut ranks, |a, b| self.blend(a, b));

        ranks[capacity / 4..].sort_by_key(|rank| {
            let age = if rank.state == SlotState::Live { rank.age } else { 0 };
            (rank.state, Reverse(age))
        });

        let mut boundary = capacity / 2 + 1;
        while boundary > 1 && ranks[boundary - 1].state != SlotState::Live {
            boundary -= 1;
        }
        let evicted = ranks[boundary..]
            .iter()
            .filter(|rank| rank.state == SlotState::Live)
            .count();

        let order: Vec<usize> = ranks.iter().map(|rank| rank.pos).collect();
        slab.reorder(&order);
        let discarded = slab.discard_from(boundary);
        slab.rebuild_index();
        slab.set_cursor(boundary);
        debug_assert!(slab.check_invariants().is_ok());

        Some(Compaction {
            expired,
            discarded,
            evicted,
            cursor: boundary,
        })
    }
}

/// Stable top-down merge sort.
///
/// Unlike the std sorts this never panics when `cmp` is inconsistent; it
/// just produces some permutation.
fn merge_sort_by<T, F>(items: &mut [T], cmp: F)
where
    T: Copy,
    F: Fn(&T, &T) -> Ordering,
{
    let mut scratch = items.to_vec();
    merge_sort_into(items, &mut scratch, &cmp);
}

fn merge_sort_into<T, F>(items: &mut [T], scratch: &mut [T], cmp: &F)
where
    T: Copy,
    F: Fn(&T, &T) -> Ordering,
{
    let len = items.len();
    if len <= 1 {
        return;
    }
    let mid = len / 2;
    merge_sort_into(&mut items[..mid], &mut scratch[..mid], cmp);
    merge_sort_into(&mut items[mid..], &mut scratch[mid..], cmp);

    scratch.copy_from_slice(items);
    let (left, right) = scratch.split_at(mid);
    let (mut i, mut j) = (0, 0);
    for slot in items.iter_mut() {
        // equal elements keep their left-run position
        let take_right =
            j < right.len() && (i >= left.len() || cmp(&right[j], &left[i]) == Ordering::Less);
        if take_right {
            *slot = right[j];
            j += 1;
        } else {
            *slot = left[i];
            i += 1;
        }
    }
}
