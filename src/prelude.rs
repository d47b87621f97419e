pub use crate::builder::{CacheBuilder, CachePolicy};
pub use crate::cache::{ArcCache, Cache, CycleCache, LruCache};
pub use crate::coordinator::PurgeCoordinator;
pub use crate::error::{ConfigError, CoordinatorError, InvariantError};
pub use crate::metrics::CacheMetricsSnapshot;
pub use crate::policy::{ArcHybrid, EvictionPolicy, Lru, Policy, RingCycle};
pub use crate::store::hashmap::MapCache;
pub use crate::store::options::StoreOptions;
pub use crate::traits::{ConcurrentCache, CoreCache, Purge};
