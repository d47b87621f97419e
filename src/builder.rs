//! Unified cache builder for all eviction policies.
//!
//! Picks the policy at runtime and returns a `Cache<K, V, Policy>`, where
//! [`Policy`] dispatches to the chosen variant. Use the concrete aliases
//! ([`ArcCache`](crate::cache::ArcCache) and friends) when the policy is known
//! at compile time.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use slabcache::builder::{CacheBuilder, CachePolicy};
//!
//! let cache = CacheBuilder::new(100)
//!     .default_ttl(Duration::from_secs(300))
//!     .try_build::<u64, String>(CachePolicy::Lru)
//!     .unwrap();
//! cache.store(1, "hello".to_string());
//! assert_eq!(cache.load(&1), Some("hello".to_string()));
//! ```

use std::hash::Hash;
use std::time::Duration;

use crate::cache::Cache;
use crate::error::ConfigError;
use crate::policy::{ArcHybrid, Lru, Policy, RingCycle};

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CachePolicy {
    /// Frequency/recency blend with the default indifference band.
    ArcHybrid,
    /// Frequency/recency blend with a custom indifference band.
    ArcHybridBand { low: f64, high: f64 },
    /// Least recently read first.
    Lru,
    /// Ring buffer with swap compaction.
    Cycle,
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: usize,
    default_ttl: Option<Duration>,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            default_ttl: None,
        }
    }

    /// TTL for writes that do not set one.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Build a cache with the specified policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a capacity below
    /// [`MIN_CAPACITY`](crate::store::slab::MIN_CAPACITY) or an invalid ARC
    /// band.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slabcache::builder::{CacheBuilder, CachePolicy};
    ///
    /// let arc = CacheBuilder::new(64).try_build::<u64, u64>(CachePolicy::ArcHybrid);
    /// assert!(arc.is_ok());
    ///
    /// let bad = CacheBuilder::new(64)
    ///     .try_build::<u64, u64>(CachePolicy::ArcHybridBand { low: 0.8, high: 0.2 });
    /// assert!(bad.is_err());
    /// ```
    pub fn try_build<K, V>(self, policy: CachePolicy) -> Result<Cache<K, V, Policy>, ConfigError>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let policy = match policy {
            CachePolicy::ArcHybrid => Policy::ArcHybrid(ArcHybrid::default()),
            CachePolicy::ArcHybridBand { low, high } => {
                Policy::ArcHybrid(ArcHybrid::with_band(low, high)?)
            },
            CachePolicy::Lru => Policy::Lru(Lru::default()),
            CachePolicy::Cycle => Policy::Cycle(RingCycle::default()),
        };

        let cache = Cache::with_policy(self.capacity, policy)?;
        Ok(match self.default_ttl {
            Some(ttl) => cache.with_default_ttl(ttl),
            None => cache,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::EvictionPolicy;
    use crate::store::options::StoreOptions;

    #[test]
    fn test_all_policies_basic_ops() {
        let policies = [
            CachePolicy::ArcHybrid,
            CachePolicy::ArcHybridBand {
                low: 0.25,
                high: 0.75,
            },
            CachePolicy::Lru,
            CachePolicy::Cycle,
        ];

        for policy in policies {
            let cache = CacheBuilder::new(10)
                .try_build::<u64, String>(policy)
                .unwrap();

            // Store / load
            cache.store(1, "one".to_string());
            cache.store(2, "two".to_string());
            assert_eq!(cache.load(&1), Some("one".to_string()));
            assert_eq!(cache.load(&2), Some("two".to_string()));
            assert_eq!(cache.load(&3), None);

            // Contains
            assert!(cache.contains(&1));
            assert!(!cache.contains(&99));
            assert_eq!(cache.len(), 2);

            // Overwrite
            cache.store(1, "ONE".to_string());
            assert_eq!(cache.load(&1), Some("ONE".to_string()));

            // Remove
            assert!(cache.remove(&1));
            assert!(!cache.contains(&1));
            assert_eq!(cache.len(), 1);
        }
    }

    #[test]
    fn test_policy_names() {
        let name = |policy| {
            CacheBuilder::new(8)
                .try_build::<u8, u8>(policy)
                .unwrap()
                .policy()
                .name()
        };
        assert_eq!(name(CachePolicy::ArcHybrid), "arc-hybrid");
        assert_eq!(name(CachePolicy::Lru), "lru");
        assert_eq!(name(CachePolicy::Cycle), "cycle");
    }

    #[test]
    fn test_rejects_small_capacity() {
        let err = CacheBuilder::new(3)
            .try_build::<u64, u64>(CachePolicy::Cycle)
            .unwrap_err();
        assert!(err.message().contains("capacity"));
    }

    #[test]
    fn test_default_ttl_reaches_cache() {
        let cache = CacheBuilder::new(8)
            .default_ttl(Duration::ZERO)
            .try_build::<u64, u64>(CachePolicy::ArcHybrid)
            .unwrap();
        assert_eq!(cache.default_ttl(), Some(Duration::ZERO));

        cache.store(1, 1);
        cache.store_with(2, 2, StoreOptions::ttl(Duration::from_secs(60)));
        assert_eq!(cache.load(&1), None);
        assert_eq!(cache.load(&2), Some(2));
    }
}
