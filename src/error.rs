//! Error types for the slabcache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (capacity below [`MIN_CAPACITY`](crate::store::slab::MIN_CAPACITY),
//!   out-of-range ARC band limits).
//! - [`InvariantError`]: Returned by `check_invariants` when the slab index and
//!   slot array disagree. Never expected in correct operation.
//! - [`CoordinatorError`]: Returned when the background purge coordinator
//!   cannot be started.
//!
//! Absence of a key is not an error anywhere in the library: `load` returns
//! `None` and `remove` returns `false`.
//!
//! ## Example Usage
//!
//! ```
//! use slabcache::cache::ArcCache;
//! use slabcache::error::ConfigError;
//!
//! let cache: Result<ArcCache<String, i32>, ConfigError> = ArcCache::new(128);
//! assert!(cache.is_ok());
//!
//! // Too small: rejected instead of silently resized
//! let bad = ArcCache::<String, i32>::new(4);
//! assert!(bad.unwrap_err().to_string().contains("capacity"));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal slab invariants are violated.
///
/// Produced by [`Slab::check_invariants`](crate::store::slab::Slab::check_invariants)
/// and the facade's `check_invariants`. Carries a human-readable description
/// of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by fallible constructors such as
/// [`Cache::new`](crate::cache::Cache::new),
/// [`ArcHybrid::with_band`](crate::policy::arc::ArcHybrid::with_band) and
/// [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build).
/// No partially built object is ever returned alongside it.
///
/// # Example
///
/// ```
/// use slabcache::cache::LruCache;
///
/// let err = LruCache::<u64, u64>::new(0).unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// CoordinatorError
// ---------------------------------------------------------------------------

/// Error returned by [`PurgeCoordinator::start`](crate::coordinator::PurgeCoordinator::start).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// `start` was called while the background schedule is already running.
    AlreadyRunning,
    /// A zero interval would spin the worker thread.
    ZeroInterval,
    /// The operating system refused to spawn the worker thread.
    Spawn(String),
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::AlreadyRunning => f.write_str("purge coordinator is already running"),
            CoordinatorError::ZeroInterval => f.write_str("purge interval must be non-zero"),
            CoordinatorError::Spawn(reason) => {
                write!(f, "failed to spawn purge thread: {reason}")
            },
        }
    }
}

impl std::error::Error for CoordinatorError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- InvariantError ---------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("index points at empty slot 3");
        assert_eq!(err.to_string(), "index points at empty slot 3");
    }

    #[test]
    fn invariant_message_accessor() {
        let err = InvariantError::new("cursor out of range");
        assert_eq!(err.message(), "cursor out of range");
    }

    #[test]
    fn invariant_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<InvariantError>();
    }

    // -- ConfigError ------------------------------------------------------

    #[test]
    fn config_display_shows_message() {
        let err = ConfigError::new("capacity must be at least 8");
        assert_eq!(err.to_string(), "capacity must be at least 8");
    }

    #[test]
    fn config_clone_and_eq() {
        let a = ConfigError::new("x");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(b.message(), "x");
    }

    #[test]
    fn config_implements_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<ConfigError>();
    }

    // -- CoordinatorError -------------------------------------------------

    #[test]
    fn coordinator_display_variants() {
        assert!(
            CoordinatorError::AlreadyRunning
                .to_string()
                .contains("already running")
        );
        assert!(CoordinatorError::ZeroInterval.to_string().contains("non-zero"));
        assert!(
            CoordinatorError::Spawn("EAGAIN".into())
                .to_string()
                .contains("EAGAIN")
        );
    }
}
