//! Fixed-capacity slab of cells with a key→slot side index.
//!
//! The slab is the only owner of [`Cell`]s. It never grows: capacity is fixed
//! at construction and new keys are written at an insertion cursor that walks
//! forward through the slot array. When the cursor reaches the end, the
//! owning cache hands the slab to its eviction policy, which reorders and
//! discards cells and moves the cursor back.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                              Slab<K, V> Layout                              │
//! │                                                                             │
//! │   index: FxHashMap<K, usize>             slots: Vec<Option<Cell<K, V>>>     │
//! │   ┌──────────┬───────┐                   ┌─────┬──────────────────────────┐ │
//! │   │  "a"     │   0   │ ────────────────► │  0  │ Cell { key: "a", .. }    │ │
//! │   │  "b"     │   1   │ ────────────────► │  1  │ Cell { key: "b", ✝ }     │ │
//! │   │  "c"     │   2   │ ────────────────► │  2  │ Cell { key: "c", .. }    │ │
//! │   └──────────┴───────┘                   │  3  │ None                     │◄── cursor
//! │                                          │ ... │ None                     │ │
//! │                                          └─────┴──────────────────────────┘ │
//! │                                                                             │
//! │   ✝ = tombstoned: still indexed and physically present until compaction     │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Flow
//!
//! ```text
//!   put(key, value):
//!     key indexed?  ── yes ──► replace cell in the same slot (fresh age)
//!          │
//!          no
//!          ▼
//!     cursor == capacity? ── yes ──► wrap cursor to 0 (policies normally
//!          │                          compact before this point)
//!          ▼
//!     drop whatever occupies slots[cursor] (and its index entry if the
//!     entry still points here), write the new cell, index it, cursor += 1
//! ```
//!
//! ## Operations Exposed To Policies
//!
//! | Operation        | Description                                         |
//! |------------------|-----------------------------------------------------|
//! | `expire_due`     | Tombstone every cell whose expiry has passed        |
//! | `reorder`        | Apply a slot permutation (index is stale afterwards)|
//! | `swap`           | Exchange two slots and fix both index entries       |
//! | `discard_from`   | Drop every cell from a position to the end          |
//! | `discard_dead`   | Drop tombstoned cells in a range                    |
//! | `rebuild_index`  | Re-index every non-tombstoned cell                  |
//! | `set_cursor`     | Move the insertion cursor                           |
//!
//! ## Invariants
//!
//! - `slots.len() == capacity` for the slab's whole lifetime.
//! - Every index entry `(key, pos)` has `pos < capacity` and
//!   `slots[pos].key == key`.
//! - Every non-tombstoned cell is indexed at its own position, which also
//!   gives at most one live cell per key.
//!
//! [`Slab::check_invariants`] verifies all of the above.

use std::hash::Hash;
use std::ops::Range;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::error::{ConfigError, InvariantError};
use crate::store::cell::Cell;

/// Smallest slot count a slab accepts.
pub const MIN_CAPACITY: usize = 8;

/// Result of [`Slab::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The key was already indexed; its slot now holds the new cell.
    Updated,
    /// The key was written at the cursor. `evicted` is `true` when a
    /// non-tombstoned cell was overwritten to make room.
    Inserted { evicted: bool },
}

/// Fixed-length slot array plus key index, insertion cursor and write clock.
#[derive(Debug)]
pub struct Slab<K, V> {
    slots: Vec<Option<Cell<K, V>>>,
    index: FxHashMap<K, usize>,
    cursor: usize,
    global_age: u64,
    epoch: Instant,
}

impl<K, V> Slab<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty slab with exactly `capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `capacity < MIN_CAPACITY`.
    ///
    /// # Example
    ///
    /// ```
    /// use slabcache::store::slab::Slab;
    ///
    /// let slab: Slab<u64, String> = Slab::new(16).unwrap();
    /// assert_eq!(slab.capacity(), 16);
    /// assert_eq!(slab.cursor(), 0);
    /// assert!(Slab::<u64, String>::new(7).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity < MIN_CAPACITY {
            return Err(ConfigError::new(format!(
                "capacity must be at least {MIN_CAPACITY}, got {capacity}"
            )));
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots,
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            cursor: 0,
            global_age: 0,
            epoch: Instant::now(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Next slot a first-time insertion will use.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the insertion cursor. Values past the end are clamped.
    #[inline]
    pub fn set_cursor(&mut self, cursor: usize) {
        debug_assert!(cursor <= self.capacity(), "cursor {cursor} out of range");
        self.cursor = cursor.min(self.capacity());
    }

    /// `true` when the next first-time insertion needs compaction first.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.cursor >= self.capacity()
    }

    /// Number of index entries (includes tombstoned cells not yet compacted).
    #[inline]
    pub fn indexed_len(&self) -> usize {
        self.index.len()
    }

    /// Number of cells that are neither tombstoned nor expired at `now`.
    pub fn live_len(&self, now: Instant) -> usize {
        self.cells().filter(|(_, cell)| cell.is_live(now)).count()
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    pub fn position(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Index lookup. Returns the cell regardless of tombstone or expiry.
    pub fn get(&self, key: &K) -> Option<&Cell<K, V>> {
        let pos = *self.index.get(key)?;
        let cell = self.slots.get(pos)?.as_ref();
        debug_assert!(
            cell.is_some_and(|cell| cell.key() == key),
            "index entry points at a foreign or empty slot {pos}"
        );
        cell.filter(|cell| cell.key() == key)
    }

    /// Read-only view of the slot array.
    #[inline]
    pub fn slots(&self) -> &[Option<Cell<K, V>>] {
        &self.slots
    }

    /// Occupied slots with their positions.
    pub fn cells(&self) -> impl Iterator<Item = (usize, &Cell<K, V>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(pos, slot)| slot.as_ref().map(|cell| (pos, cell)))
    }

    /// Converts an instant into the slab's monotonic tick (nanoseconds since
    /// the slab was created).
    #[inline]
    pub fn tick(&self, now: Instant) -> u64 {
        let nanos = now.saturating_duration_since(self.epoch).as_nanos();
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }

    fn next_age(&mut self) -> u64 {
        self.global_age += 1;
        self.global_age
    }

    /// Writes `key` without consulting any policy.
    ///
    /// An indexed key is overwritten in place. A new key goes to the cursor;
    /// if the cursor sits at the end it wraps to 0 first.
    pub fn put(
        &mut self,
        key: K,
        value: V,
        expires_at: Option<Instant>,
        now: Instant,
    ) -> PutOutcome {
        let age = self.next_age();
        let tick = self.tick(now);

        if let Some(pos) = self.index.get(&key).copied() {
            self.slots[pos] = Some(Cell::new(key, value, age, tick, expires_at));
            return PutOutcome::Updated;
        }

        if self.cursor >= self.capacity() {
            self.cursor = 0;
        }
        let pos = self.cursor;

        let mut evicted = false;
        if let Some(old) = self.slots[pos].take() {
            if self.index.get(old.key()) == Some(&pos) {
                self.index.remove(old.key());
            }
            evicted = !old.is_removed();
        }

        self.index.insert(key.clone(), pos);
        self.slots[pos] = Some(Cell::new(key, value, age, tick, expires_at));
        self.cursor += 1;
        PutOutcome::Inserted { evicted }
    }

    /// Tombstones every cell whose expiry has passed. Returns how many cells
    /// this call tombstoned.
    pub fn expire_due(&self, now: Instant) -> usize {
        self.cells()
            .filter(|(_, cell)| cell.expire_if_due(now))
            .count()
    }

    /// Rearranges slots so that new slot `i` holds old slot `order[i]`.
    ///
    /// `order` must be a permutation of `0..capacity`. The index is stale
    /// afterwards; callers follow up with [`rebuild_index`](Self::rebuild_index).
    pub fn reorder(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.capacity());
        let mut old = std::mem::take(&mut self.slots);
        self.slots = order.iter().map(|&pos| old[pos].take()).collect();
        debug_assert!(old.iter().all(Option::is_none), "order was not a permutation");
    }

    /// Exchanges two slots and repoints the index entries of both cells.
    ///
    /// An entry is only moved if it pointed at the cell's old slot, so an
    /// unindexed dead duplicate never steals the live cell's entry.
    pub fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.slots.swap(a, b);
        for (pos, from) in [(a, b), (b, a)] {
            if let Some(cell) = &self.slots[pos] {
                if let Some(entry) = self.index.get_mut(cell.key()) {
                    if *entry == from {
                        *entry = pos;
                    }
                }
            }
        }
    }

    /// Drops the cell at `pos` along with its index entry (if the entry
    /// points here). Returns `true` if a cell was present.
    pub fn discard(&mut self, pos: usize) -> bool {
        let Some(cell) = self.slots.get_mut(pos).and_then(Option::take) else {
            return false;
        };
        if self.index.get(cell.key()) == Some(&pos) {
            self.index.remove(cell.key());
        }
        true
    }

    /// Drops every cell from `start` to the end. Returns the number dropped.
    pub fn discard_from(&mut self, start: usize) -> usize {
        (start..self.capacity())
            .filter(|&pos| self.discard(pos))
            .count()
    }

    /// Drops tombstoned cells inside `range`. Returns the number dropped.
    pub fn discard_dead(&mut self, range: Range<usize>) -> usize {
        let end = range.end.min(self.capacity());
        let mut dropped = 0;
        for pos in range.start..end {
            let dead = self.slots[pos]
                .as_ref()
                .is_some_and(|cell| cell.is_removed());
            if dead && self.discard(pos) {
                dropped += 1;
            }
        }
        dropped
    }

    /// Rebuilds the index from scratch over every non-tombstoned cell.
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, slot) in self.slots.iter().enumerate() {
            if let Some(cell) = slot {
                if !cell.is_removed() {
                    self.index.insert(cell.key().clone(), pos);
                }
            }
        }
    }

    /// Verifies the slab's structural invariants.
    ///
    /// # Errors
    ///
    /// Returns an [`InvariantError`] describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.cursor > self.capacity() {
            return Err(InvariantError::new(format!(
                "cursor {} beyond capacity {}",
                self.cursor,
                self.capacity()
            )));
        }

        for (key, &pos) in &self.index {
            match self.slots.get(pos) {
                None => {
                    return Err(InvariantError::new(format!(
                        "index entry points outside the slab at {pos}"
                    )));
                },
                Some(None) => {
                    return Err(InvariantError::new(format!(
                        "index entry points at empty slot {pos}"
                    )));
                },
                Some(Some(cell)) if cell.key() != key => {
                    return Err(InvariantError::new(format!(
                        "index entry points at a foreign cell in slot {pos}"
                    )));
                },
                Some(Some(_)) => {},
            }
        }

        for (pos, cell) in self.cells() {
            if !cell.is_removed() && self.index.get(cell.key()) != Some(&pos) {
                return Err(InvariantError::new(format!(
                    "live cell in slot {pos} is not indexed at its position"
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
