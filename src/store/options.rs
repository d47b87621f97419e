//! Per-write options.
//!
//! ```
//! use std::time::Duration;
//! use slabcache::store::options::StoreOptions;
//!
//! let opts = StoreOptions::ttl(Duration::from_secs(30));
//! assert_eq!(opts.time_to_live(), Some(Duration::from_secs(30)));
//! assert_eq!(StoreOptions::default().time_to_live(), None);
//! ```

use std::time::{Duration, Instant};

/// Options attached to a single `store_with` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    ttl: Option<Duration>,
}

impl StoreOptions {
    /// No options: the entry never expires (unless the cache has a default TTL).
    pub const fn new() -> Self {
        Self { ttl: None }
    }

    /// Expire the entry `ttl` after the write. A zero TTL is already expired
    /// on the next read.
    pub const fn ttl(ttl: Duration) -> Self {
        Self { ttl: Some(ttl) }
    }

    pub const fn time_to_live(&self) -> Option<Duration> {
        self.ttl
    }

    /// Fills in `default` when no explicit TTL was given.
    pub(crate) fn or_default_ttl(self, default: Option<Duration>) -> Self {
        Self {
            ttl: self.ttl.or(default),
        }
    }

    /// Absolute expiry for a write happening at `now`. A TTL too large to
    /// represent as an `Instant` never expires.
    pub(crate) fn expires_at(&self, now: Instant) -> Option<Instant> {
        self.ttl.and_then(|ttl| now.checked_add(ttl))
    }
}
