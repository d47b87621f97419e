//! slabcache: fixed-capacity concurrent caches on a slab with pluggable
//! eviction (ARC-hybrid, LRU, ring-cycle), lazy TTL, and a background purge
//! coordinator.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod builder;
pub mod cache;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod store;
pub mod traits;
