//! Unbounded map-backed TTL store.
//!
//! ## Architecture
//! - Entries live in a `FxHashMap<K, Entry<V>>` behind a `parking_lot::RwLock`.
//! - There is no capacity and no eviction policy: entries leave the map only
//!   through `remove`, expiry, or `purge`.
//! - Removal and lazy expiry only tombstone the entry (atomic flag), so they
//!   run under the shared lock. `purge` takes the exclusive lock and drops
//!   tombstoned and expired entries.
//!
//! ## Core Operations
//! - `store` / `store_with`: insert or replace, optionally with a TTL.
//! - `load`: clone of a live value; tombstones expired entries on the way.
//! - `remove`: tombstone.
//! - `atomic_update`: read-modify-write under the exclusive lock.
//! - `purge`: physical sweep.
//!
//! ## When to Use
//! - Small key sets that must never lose entries to eviction.
//! - Alongside the slab caches under one
//!   [`PurgeCoordinator`](crate::coordinator::PurgeCoordinator).
//!
//! ## Example Usage
//! ```rust
//! use std::time::Duration;
//!
//! use slabcache::store::hashmap::MapCache;
//! use slabcache::store::options::StoreOptions;
//! use slabcache::traits::{CoreCache, Purge};
//!
//! let cache: MapCache<&str, u32> = MapCache::new();
//! cache.store("a", 1);
//! cache.store_with("b", 2, StoreOptions::ttl(Duration::ZERO));
//! assert_eq!(cache.load(&"a"), Some(1));
//! assert_eq!(cache.load(&"b"), None);
//!
//! cache.purge();
//! assert_eq!(cache.metrics().len, 1);
//! ```
//!
//! ## Thread Safety
//! - `MapCache` is `Send + Sync` when `K` and `V` are.
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::metrics::{CacheCounters, CacheMetricsSnapshot};
use crate::store::options::StoreOptions;
use crate::traits::{ConcurrentCache, CoreCache, Purge};

#[derive(Debug)]
struct Entry<V> {
    value: V,
    removed: AtomicBool,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn new(value: V, expires_at: Option<Instant>) -> Self {
        Self {
            value,
            removed: AtomicBool::new(false),
            expires_at,
        }
    }

    fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Tombstones the entry; `true` for the call that did it.
    fn mark_removed(&self) -> bool {
        !self.removed.swap(true, Ordering::AcqRel)
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Map-backed cache with TTL and tombstones but no eviction.
#[derive(Debug)]
pub struct MapCache<K, V> {
    map: RwLock<FxHashMap<K, Entry<V>>>,
    default_ttl: Option<Duration>,
    counters: CacheCounters,
}

impl<K, V> Default for MapCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MapCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            map: RwLock::new(FxHashMap::default()),
            default_ttl: None,
            counters: CacheCounters::default(),
        }
    }

    /// TTL applied to writes that carry none of their own.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Counters plus current live length. Capacity is reported as the
    /// number of physically stored entries.
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        let now = Instant::now();
        let map = self.map.read();
        let live = map
            .values()
            .filter(|entry| !entry.is_removed() && !entry.is_expired(now))
            .count();
        self.counters.snapshot(live, map.len())
    }

    /// Live entry for `key`, tombstoning it first if it has expired.
    fn live<'a>(
        &self,
        map: &'a FxHashMap<K, Entry<V>>,
        key: &K,
        now: Instant,
    ) -> Option<&'a Entry<V>> {
        let entry = map.get(key)?;
        if entry.is_removed() {
            return None;
        }
        if entry.is_expired(now) {
            if entry.mark_removed() {
                self.counters.add_expirations(1);
            }
            return None;
        }
        Some(entry)
    }

    fn expires_at(&self, options: StoreOptions, now: Instant) -> Option<Instant> {
        options.or_default_ttl(self.default_ttl).expires_at(now)
    }
}

impl<K, V> CoreCache<K, V> for MapCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn store_with(&self, key: K, value: V, options: StoreOptions) {
        let now = Instant::now();
        let entry = Entry::new(value, self.expires_at(options, now));
        match self.map.write().insert(key, entry) {
            Some(_) => self.counters.inc_update(),
            None => self.counters.inc_insert(),
        }
    }

    fn load(&self, key: &K) -> Option<V> {
        let map = self.map.read();
        match self.live(&map, key, Instant::now()) {
            Some(entry) => {
                self.counters.inc_hit();
                Some(entry.value.clone())
            },
            None => {
                self.counters.inc_miss();
                None
            },
        }
    }

    fn remove(&self, key: &K) -> bool {
        let map = self.map.read();
        let removed = self
            .live(&map, key, Instant::now())
            .is_some_and(Entry::mark_removed);
        if removed {
            self.counters.inc_remove();
        }
        removed
    }

    fn contains(&self, key: &K) -> bool {
        let map = self.map.read();
        self.live(&map, key, Instant::now()).is_some()
    }

    fn atomic_update<F>(&self, key: K, f: F) -> V
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let now = Instant::now();
        let mut map = self.map.write();
        let (value, kept_expiry) = match self.live(&map, &key, now) {
            Some(entry) => (f(Some(&entry.value)), Some(entry.expires_at)),
            None => (f(None), None),
        };
        let expires_at = kept_expiry.unwrap_or_else(|| self.expires_at(StoreOptions::new(), now));
        match map.insert(key, Entry::new(value.clone(), expires_at)) {
            Some(_) => self.counters.inc_update(),
            None => self.counters.inc_insert(),
        }
        value
    }

    fn keys(&self) -> Vec<K> {
        let now = Instant::now();
        let map = self.map.read();
        map.keys()
            .filter(|key| self.live(&map, key, now).is_some())
            .cloned()
            .collect()
    }

    fn values(&self) -> Vec<V> {
        let now = Instant::now();
        let map = self.map.read();
        map.keys()
            .filter_map(|key| self.live(&map, key, now))
            .map(|entry| entry.value.clone())
            .collect()
    }

    fn len(&self) -> usize {
        let now = Instant::now();
        self.map
            .read()
            .values()
            .filter(|entry| !entry.is_removed() && !entry.is_expired(now))
            .count()
    }
}

impl<K, V> Purge for MapCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    fn purge(&self) {
        let now = Instant::now();
        let mut map = self.map.write();
        let before = map.len();
        let mut expired = 0;
        map.retain(|_, entry| {
            if entry.is_removed() {
                return false;
            }
            if entry.is_expired(now) {
                expired += 1;
                return false;
            }
            true
        });
        self.counters.add_expirations(expired);
        debug!(
            dropped = before - map.len(),
            expired,
            remaining = map.len(),
            "purged map cache"
        );
    }
}

impl<K, V> ConcurrentCache for MapCache<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn store_load_remove() {
        let cache = MapCache::new();
        cache.store("k", 1);
        assert_eq!(cache.load(&"k"), Some(1));
        assert!(cache.contains(&"k"));

        assert!(cache.remove(&"k"));
        assert!(!cache.remove(&"k"));
        assert_eq!(cache.load(&"k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn overwrite_replaces_value_and_revives() {
        let cache = MapCache::new();
        cache.store(1u32, "a");
        cache.remove(&1);
        cache.store(1, "b");
        assert_eq!(cache.load(&1), Some("b"));

        let snap = cache.metrics();
        assert_eq!(snap.inserts, 1);
        assert_eq!(snap.updates, 1);
    }

    #[test]
    fn zero_ttl_is_expired_on_read() {
        let cache = MapCache::new();
        cache.store_with("k", 1, StoreOptions::ttl(Duration::ZERO));
        assert_eq!(cache.load(&"k"), None);
        assert_eq!(cache.metrics().expirations, 1);
    }

    #[test]
    fn default_ttl_applies_without_explicit_ttl() {
        let cache = MapCache::new().with_default_ttl(Duration::ZERO);
        cache.store("short", 1);
        cache.store_with("long", 2, StoreOptions::ttl(Duration::from_secs(3600)));
        assert_eq!(cache.load(&"short"), None);
        assert_eq!(cache.load(&"long"), Some(2));
    }

    #[test]
    fn purge_drops_dead_entries() {
        let cache = MapCache::new();
        for key in 0..10u32 {
            cache.store(key, key);
        }
        cache.store_with(100, 100, StoreOptions::ttl(Duration::ZERO));
        for key in 0..5 {
            cache.remove(&key);
        }
        cache.purge();

        assert_eq!(cache.map.read().len(), 5);
        let mut keys = cache.keys();
        keys.sort_unstable();
        assert_eq!(keys, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn atomic_update_keeps_expiry_of_live_entry() {
        let cache = MapCache::new();
        cache.store_with("k", 1, StoreOptions::ttl(Duration::from_secs(3600)));
        let before = cache.map.read().get(&"k").and_then(|e| e.expires_at);
        assert_eq!(cache.atomic_update("k", |v| v.copied().unwrap_or(0) + 1), 2);
        let after = cache.map.read().get(&"k").and_then(|e| e.expires_at);
        assert_eq!(before, after);
    }

    #[test]
    fn concurrent_atomic_updates_are_serialized() {
        let cache = Arc::new(MapCache::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..250 {
                        cache.atomic_update("n", |v| v.copied().unwrap_or(0u64) + 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.load(&"n"), Some(1000));
    }
}
