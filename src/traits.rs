//! # Cache Traits
//!
//! Shared interfaces for the slab-backed caches and the map-backed TTL store.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────────┐   ┌──────────────────────┐
//!   │              CoreCache<K, V>                │   │        Purge         │
//!   │                                             │   │   (Send + Sync)      │
//!   │  store(&, K, V)                             │   │                      │
//!   │  store_with(&, K, V, StoreOptions)          │   │  purge(&)            │
//!   │  load(&, &K) → Option<V>                    │   └──────────┬───────────┘
//!   │  remove(&, &K) → bool                       │              │
//!   │  contains(&, &K) → bool                     │              │ Arc<dyn Purge>
//!   │  atomic_update(&, K, FnOnce) → V            │              ▼
//!   │  keys(&) → Vec<K>   values(&) → Vec<V>      │   ┌──────────────────────┐
//!   │  len(&) → usize                             │   │  PurgeCoordinator    │
//!   └─────────────────────────────────────────────┘   └──────────────────────┘
//!          ▲                         ▲
//!          │                         │
//!   Cache<K, V, P>               MapCache<K, V>
//!   (ArcCache, LruCache,         (unbounded, TTL only)
//!    CycleCache)
//! ```
//!
//! Every operation takes `&self`: implementations synchronize internally and
//! are shared between threads behind an `Arc`. Values come back as clones, so
//! store `Arc<T>` for large payloads.
//!
//! ## Trait Summary
//!
//! | Trait             | Extends       | Purpose                                  |
//! |-------------------|---------------|------------------------------------------|
//! | `CoreCache`       | -             | Store, load, remove, atomic update       |
//! | `Purge`           | `Send + Sync` | Force compaction / expiry sweep now      |
//! | `ConcurrentCache` | `Send + Sync` | Marker for caches usable across threads  |
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use slabcache::cache::LruCache;
//! use slabcache::traits::{CoreCache, Purge};
//!
//! fn warm<C: CoreCache<u64, String>>(cache: &C, data: &[(u64, &str)]) {
//!     for (key, value) in data {
//!         cache.store(*key, value.to_string());
//!     }
//! }
//!
//! let cache = Arc::new(LruCache::new(64).unwrap());
//! warm(cache.as_ref(), &[(1, "one"), (2, "two")]);
//!
//! let purgeable: Arc<dyn Purge> = cache.clone();
//! purgeable.purge();
//! assert_eq!(cache.load(&1), Some("one".to_string()));
//! ```

use crate::store::options::StoreOptions;

/// Operations every cache in this crate supports.
///
/// Absence is never an error: `load` returns `None` and `remove` returns
/// `false`.
pub trait CoreCache<K, V> {
    /// Writes `value` under `key` with default options.
    ///
    /// An existing entry for `key` is replaced (overwrite semantics).
    fn store(&self, key: K, value: V) {
        self.store_with(key, value, StoreOptions::default());
    }

    /// Writes `value` under `key` with explicit options (TTL).
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use slabcache::cache::ArcCache;
    /// use slabcache::store::options::StoreOptions;
    /// use slabcache::traits::CoreCache;
    ///
    /// let cache = ArcCache::new(16).unwrap();
    /// cache.store_with("session", 7, StoreOptions::ttl(Duration::ZERO));
    /// assert_eq!(cache.load(&"session"), None);
    /// ```
    fn store_with(&self, key: K, value: V, options: StoreOptions);

    /// Returns a clone of the live value for `key`.
    ///
    /// Counts as a use of the entry for eviction purposes. An expired entry
    /// is tombstoned on the way and reported as absent.
    fn load(&self, key: &K) -> Option<V>;

    /// Tombstones the entry for `key`. Returns `true` if a live entry was
    /// removed.
    fn remove(&self, key: &K) -> bool;

    /// Checks for a live entry without recording a use.
    fn contains(&self, key: &K) -> bool;

    /// Reads the current value, computes a new one and writes it back as one
    /// indivisible step. `f` runs exactly once, with `None` when the key is
    /// absent or dead. Returns the stored value.
    ///
    /// # Example
    ///
    /// ```
    /// use slabcache::cache::CycleCache;
    /// use slabcache::traits::CoreCache;
    ///
    /// let cache = CycleCache::new(16).unwrap();
    /// let v = cache.atomic_update("hits", |old| old.copied().unwrap_or(0) + 1);
    /// assert_eq!(v, 1);
    /// assert_eq!(cache.atomic_update("hits", |old| old.copied().unwrap_or(0) + 1), 2);
    /// ```
    fn atomic_update<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce(Option<&V>) -> V;

    /// Snapshot of live keys, in no particular order.
    fn keys(&self) -> Vec<K>;

    /// Snapshot of live values, in no particular order.
    fn values(&self) -> Vec<V>;

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Something that can be asked to compact or sweep itself right now.
///
/// This is the only capability the
/// [`PurgeCoordinator`](crate::coordinator::PurgeCoordinator) needs, so any
/// type implementing it can be scheduled alongside the caches.
pub trait Purge: Send + Sync {
    fn purge(&self);
}

/// Marker trait for caches that are safe to share across threads.
///
/// ```
/// use slabcache::cache::ArcCache;
/// use slabcache::store::hashmap::MapCache;
/// use slabcache::traits::ConcurrentCache;
///
/// fn assert_concurrent<C: ConcurrentCache>() {}
/// assert_concurrent::<ArcCache<String, Vec<u8>>>();
/// assert_concurrent::<MapCache<String, Vec<u8>>>();
/// ```
pub trait ConcurrentCache: Send + Sync {}
