//! # Slab Cache Facade
//!
//! [`Cache`] is the thread-safe front end over a [`Slab`] and an
//! [`EvictionPolicy`]. It owns the lock, applies lazy expiry, records
//! metrics, and calls into the policy when the slab fills.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │                            Cache<K, V, P>                                 │
//! │                                                                           │
//! │   ┌───────────────────────────────────────────┐    ┌──────────────────┐   │
//! │   │ RwLock<Slab<K, V>>                        │    │ policy: P        │   │
//! │   │                                           │    │                  │   │
//! │   │  shared:    load, remove, contains,       │    │  on_read         │   │
//! │   │             keys, values, len             │───►│  on_remove       │   │
//! │   │                                           │    │                  │   │
//! │   │  exclusive: store, atomic_update, purge   │───►│  compact         │   │
//! │   └───────────────────────────────────────────┘    └──────────────────┘   │
//! │                                                                           │
//! │   counters: CacheCounters (Relaxed atomics)   default_ttl: Option<Dur>    │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Store Flow
//!
//! ```text
//!   store(key, value)
//!        │
//!        ▼
//!   key indexed? ──yes──► overwrite in place (no capacity used)
//!        │
//!        no
//!        ▼
//!   slab full? ──yes──► policy.compact(slab)  (may be a no-op)
//!        │                    │
//!        ▼◄───────────────────┘
//!   write at cursor (overwrites whatever the cursor points at)
//! ```
//!
//! ## Operations
//!
//! | Operation       | Lock      | Notes                                      |
//! |-----------------|-----------|--------------------------------------------|
//! | `store`         | exclusive | overwrite or insert, may compact           |
//! | `load`          | shared    | records a read with the policy             |
//! | `remove`        | shared    | tombstone only                             |
//! | `contains`      | shared    | no read recorded                           |
//! | `atomic_update` | exclusive | `f` runs once against the current value    |
//! | `keys`/`values` | shared    | unordered snapshots of live entries        |
//! | `len`           | shared    | O(capacity) scan of live cells             |
//! | `purge`         | exclusive | forces a compaction pass now               |
//!
//! Expired entries are tombstoned by whichever operation first notices them;
//! nothing runs on a timer inside the cache.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::Duration;
//! use slabcache::cache::ArcCache;
//! use slabcache::store::options::StoreOptions;
//!
//! let cache: ArcCache<String, u64> = ArcCache::new(128).unwrap();
//! cache.store("a".to_string(), 1);
//! cache.store_with("b".to_string(), 2, StoreOptions::ttl(Duration::from_secs(60)));
//!
//! assert_eq!(cache.load(&"a".to_string()), Some(1));
//! assert!(cache.remove(&"a".to_string()));
//! assert_eq!(cache.load(&"a".to_string()), None);
//! assert_eq!(cache.len(), 1);
//! ```

use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{ConfigError, InvariantError};
use crate::metrics::{CacheCounters, CacheMetricsSnapshot};
use crate::policy::{ArcHybrid, EvictionPolicy, Lru, RingCycle};
use crate::store::cell::Cell;
use crate::store::options::StoreOptions;
use crate::store::slab::{PutOutcome, Slab};
use crate::traits::{ConcurrentCache, CoreCache, Purge};

/// Cache with the ARC-hybrid frequency/recency policy.
pub type ArcCache<K, V> = Cache<K, V, ArcHybrid>;
/// Cache with the approximate LRU policy.
pub type LruCache<K, V> = Cache<K, V, Lru>;
/// Cache with the ring-buffer policy.
pub type CycleCache<K, V> = Cache<K, V, RingCycle>;

/// Fixed-capacity concurrent cache parameterized by its eviction policy.
#[derive(Debug)]
pub struct Cache<K, V, P> {
    slab: RwLock<Slab<K, V>>,
    policy: P,
    capacity: usize,
    default_ttl: Option<Duration>,
    counters: CacheCounters,
}

impl<K, V, P> Cache<K, V, P>
where
    K: Eq + Hash + Clone,
    V: Clone,
    P: EvictionPolicy,
{
    /// Creates a cache with `capacity` slots and a default-configured policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `capacity` is below
    /// [`MIN_CAPACITY`](crate::store::slab::MIN_CAPACITY).
    pub fn new(capacity: usize) -> Result<Self, ConfigError>
    where
        P: Default,
    {
        Self::with_policy(capacity, P::default())
    }

    /// Creates a cache with an explicitly configured policy.
    ///
    /// # Example
    ///
    /// ```
    /// use slabcache::cache::Cache;
    /// use slabcache::policy::ArcHybrid;
    ///
    /// let policy = ArcHybrid::with_band(0.3, 0.7).unwrap();
    /// let cache: Cache<u32, u32, _> = Cache::with_policy(64, policy).unwrap();
    /// assert_eq!(cache.policy().band(), (0.3, 0.7));
    /// ```
    pub fn with_policy(capacity: usize, policy: P) -> Result<Self, ConfigError> {
        let slab = Slab::new(capacity)?;
        Ok(Self {
            slab: RwLock::new(slab),
            policy,
            capacity,
            default_ttl: None,
            counters: CacheCounters::default(),
        })
    }

    /// TTL applied to writes that carry none of their own.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn policy(&self) -> &P {
        &self.policy
    }

    #[inline]
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    pub fn store(&self, key: K, value: V) {
        self.store_with(key, value, StoreOptions::default());
    }

    /// Writes `value` under `key`. A new key may trigger compaction first.
    pub fn store_with(&self, key: K, value: V, options: StoreOptions) {
        let now = Instant::now();
        let expires_at = self.expires_at(options, now);
        let mut slab = self.slab.write();
        self.write_locked(&mut slab, key, value, expires_at, now);
    }

    /// Returns a clone of the live value and records the read with the policy.
    pub fn load(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let slab = self.slab.read();
        let Some(cell) = self.live_cell(&slab, key, now) else {
            self.counters.inc_miss();
            return None;
        };
        self.policy.on_read(cell, slab.tick(now));
        self.counters.inc_hit();
        Some(cell.value().clone())
    }

    /// Tombstones `key`. Returns `true` if a live entry was removed.
    pub fn remove(&self, key: &K) -> bool {
        let slab = self.slab.read();
        let removed = self
            .live_cell(&slab, key, Instant::now())
            .is_some_and(Cell::mark_removed);
        if removed {
            self.policy.on_remove();
            self.counters.inc_remove();
        }
        removed
    }

    pub fn contains(&self, key: &K) -> bool {
        let slab = self.slab.read();
        self.live_cell(&slab, key, Instant::now()).is_some()
    }

    /// Read-modify-write under the exclusive lock.
    ///
    /// `f` sees the current live value (or `None`) and runs exactly once. An
    /// existing live entry keeps its expiry; a fresh one gets the default TTL.
    pub fn atomic_update<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let now = Instant::now();
        let mut slab = self.slab.write();
        let (value, kept_expiry) = match self.live_cell(&slab, &key, now) {
            Some(cell) => (f(Some(cell.value())), Some(cell.expires_at())),
            None => (f(None), None),
        };
        let expires_at =
            kept_expiry.unwrap_or_else(|| self.expires_at(StoreOptions::default(), now));
        self.write_locked(&mut slab, key, value.clone(), expires_at, now);
        value
    }

    pub fn keys(&self) -> Vec<K> {
        let now = Instant::now();
        let slab = self.slab.read();
        slab.cells()
            .filter(|(_, cell)| self.check_live(cell, now))
            .map(|(_, cell)| cell.key().clone())
            .collect()
    }

    pub fn values(&self) -> Vec<V> {
        let now = Instant::now();
        let slab = self.slab.read();
        slab.cells()
            .filter(|(_, cell)| self.check_live(cell, now))
            .map(|(_, cell)| cell.value().clone())
            .collect()
    }

    /// Number of live entries. Scans the slab.
    pub fn len(&self) -> usize {
        self.slab.read().live_len(Instant::now())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs a compaction pass now, subject to the policy's own gate.
    pub fn purge(&self) {
        let now = Instant::now();
        let mut slab = self.slab.write();
        self.compact_locked(&mut slab, now);
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.counters.snapshot(self.len(), self.capacity)
    }

    /// Verifies the slab's index/slot invariants.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantError`] describing the first violation.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.slab.read().check_invariants()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn expires_at(&self, options: StoreOptions, now: Instant) -> Option<Instant> {
        options.or_default_ttl(self.default_ttl).expires_at(now)
    }

    /// `false` for tombstoned cells; tombstones and reports expired ones.
    fn check_live(&self, cell: &Cell<K, V>, now: Instant) -> bool {
        if cell.is_removed() {
            return false;
        }
        if cell.expire_if_due(now) {
            self.policy.on_remove();
            self.counters.add_expirations(1);
            return false;
        }
        // lost the expiry race to another reader
        !cell.is_removed()
    }

    fn live_cell<'s>(
        &self,
        slab: &'s Slab<K, V>,
        key: &K,
        now: Instant,
    ) -> Option<&'s Cell<K, V>> {
        slab.get(key).filter(|cell| self.check_live(cell, now))
    }

    fn write_locked(
        &self,
        slab: &mut Slab<K, V>,
        key: K,
        value: V,
        expires_at: Option<Instant>,
        now: Instant,
    ) {
        if slab.is_full() && !slab.contains_key(&key) {
            self.compact_locked(slab, now);
        }
        match slab.put(key, value, expires_at, now) {
            PutOutcome::Updated => self.counters.inc_update(),
            PutOutcome::Inserted { evicted } => {
                self.counters.inc_insert();
                if evicted {
                    self.counters.add_evictions(1);
                }
            },
        }
    }

    fn compact_locked(&self, slab: &mut Slab<K, V>, now: Instant) {
        match self.policy.compact(slab, now) {
            Some(pass) => {
                self.counters.inc_compaction();
                self.counters.add_expirations(pass.expired);
                self.counters.add_evictions(pass.evicted);
                debug!(
                    policy = self.policy.name(),
                    capacity = self.capacity,
                    expired = pass.expired,
                    discarded = pass.discarded,
                    evicted = pass.evicted,
                    cursor = pass.cursor,
                    "compacted slab"
                );
            },
            None => {
                trace!(
                    policy = self.policy.name(),
                    cursor = slab.cursor(),
                    "compaction skipped"
                );
            },
        }
    }
}

impl<K, P> Cache<K, i64, P>
where
    K: Eq + Hash + Clone,
    P: EvictionPolicy,
{
    /// Adds `delta` to the counter under `key` (absent counts as 0) and
    /// returns the new value. Wraps on overflow.
    ///
    /// ```
    /// use slabcache::cache::ArcCache;
    ///
    /// let cache: ArcCache<&str, i64> = ArcCache::new(16).unwrap();
    /// assert_eq!(cache.increment("hits", 1), 1);
    /// assert_eq!(cache.increment("hits", 41), 42);
    /// ```
    pub fn increment(&self, key: K, delta: i64) -> i64 {
        self.atomic_update(key, |current| current.copied().unwrap_or(0).wrapping_add(delta))
    }
}

impl<K, V, P> CoreCache<K, V> for Cache<K, V, P>
where
    K: Eq + Hash + Clone,
    V: Clone,
    P: EvictionPolicy,
{
    fn store_with(&self, key: K, value: V, options: StoreOptions) {
        Self::store_with(self, key, value, options);
    }

    fn load(&self, key: &K) -> Option<V> {
        Self::load(self, key)
    }

    fn remove(&self, key: &K) -> bool {
        Self::remove(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        Self::contains(self, key)
    }

    fn atomic_update<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce(Option<&V>) -> V,
    {
        Self::atomic_update(self, key, f)
    }

    fn keys(&self) -> Vec<K> {
        Self::keys(self)
    }

    fn values(&self) -> Vec<V> {
        Self::values(self)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }
}

impl<K, V, P> Purge for Cache<K, V, P>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
    P: EvictionPolicy,
{
    fn purge(&self) {
        Self::purge(self);
    }
}

impl<K, V, P> ConcurrentCache for Cache<K, V, P>
where
    K: Send + Sync,
    V: Send + Sync,
    P: EvictionPolicy,
{
}

// =============================================================================
// Tests
// =============================================================================
