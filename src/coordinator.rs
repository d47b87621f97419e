//! Periodic purge driver for any number of caches.
//!
//! Caches never expire or compact on their own timer. A [`PurgeCoordinator`]
//! holds `Arc<dyn Purge>` handles and calls [`Purge::purge`] on each of them,
//! either on demand ([`purge_all`](PurgeCoordinator::purge_all)) or from a
//! background thread started with [`start`](PurgeCoordinator::start).
//!
//! ```text
//!   PurgeCoordinator
//!   ┌───────────────────────────────┐          worker thread
//!   │ targets: RwLock<Vec<Arc<..>>> │◄───────┐ ┌─────────────────────────────┐
//!   │ worker:  Mutex<Option<..>>    │        └─│ loop {                      │
//!   └───────────────┬───────────────┘          │   wait_for(interval)        │
//!                   │ stop(): flag + notify    │   stopped? ──► exit         │
//!                   └─────────────────────────►│   purge every target        │
//!                                              │ }                           │
//!                                              └─────────────────────────────┘
//! ```
//!
//! `stop()` joins the worker, so once it returns no further purge runs.
//! Dropping the coordinator stops it.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use slabcache::cache::{ArcCache, CycleCache};
//! use slabcache::coordinator::PurgeCoordinator;
//! use slabcache::traits::Purge;
//!
//! let hot: Arc<ArcCache<String, u64>> = Arc::new(ArcCache::new(128).unwrap());
//! let log: Arc<CycleCache<u64, String>> = Arc::new(CycleCache::new(1024).unwrap());
//!
//! let coordinator = PurgeCoordinator::new(vec![hot.clone() as Arc<dyn Purge>, log.clone()]);
//! coordinator.start(Duration::from_secs(8)).unwrap();
//! hot.store("myItem".to_string(), 12);
//! coordinator.stop();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::error::CoordinatorError;
use crate::traits::Purge;

type Targets = Arc<RwLock<Vec<Arc<dyn Purge>>>>;

#[derive(Default)]
struct Shutdown {
    stopped: Mutex<bool>,
    signal: Condvar,
}

struct Worker {
    shutdown: Arc<Shutdown>,
    handle: JoinHandle<()>,
}

/// Runs `purge()` on registered targets, on demand or on a timer.
pub struct PurgeCoordinator {
    targets: Targets,
    ticks: Arc<AtomicU64>,
    worker: Mutex<Option<Worker>>,
}

impl PurgeCoordinator {
    pub fn new(targets: Vec<Arc<dyn Purge>>) -> Self {
        Self {
            targets: Arc::new(RwLock::new(targets)),
            ticks: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        }
    }

    /// Adds a target. Takes effect from the next tick, even while running.
    pub fn register(&self, target: Arc<dyn Purge>) {
        self.targets.write().push(target);
    }

    /// Number of registered targets.
    pub fn len(&self) -> usize {
        self.targets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    /// Completed purge rounds, on demand and scheduled.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Purges every registered target once, on the calling thread.
    pub fn purge_all(&self) {
        purge_round(&self.targets, &self.ticks);
    }

    /// Starts the background thread, purging every `interval`.
    ///
    /// # Errors
    ///
    /// - [`CoordinatorError::ZeroInterval`] for a zero `interval`.
    /// - [`CoordinatorError::AlreadyRunning`] if a worker is already active.
    /// - [`CoordinatorError::Spawn`] if the OS refuses the thread.
    pub fn start(&self, interval: Duration) -> Result<(), CoordinatorError> {
        if interval.is_zero() {
            return Err(CoordinatorError::ZeroInterval);
        }

        let mut worker = self.worker.lock();
        if worker.is_some() {
            warn!("purge coordinator already running");
            return Err(CoordinatorError::AlreadyRunning);
        }

        let shutdown = Arc::new(Shutdown::default());
        let targets = Arc::clone(&self.targets);
        let ticks = Arc::clone(&self.ticks);
        let signal = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("slabcache-purge".into())
            .spawn(move || run(&targets, &ticks, &signal, interval))
            .map_err(|err| CoordinatorError::Spawn(err.to_string()))?;

        info!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            targets = self.len(),
            "purge coordinator started"
        );
        *worker = Some(Worker { shutdown, handle });
        Ok(())
    }

    /// Stops the background thread and waits for it to exit. Does nothing if
    /// it is not running.
    pub fn stop(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        *worker.shutdown.stopped.lock() = true;
        worker.shutdown.signal.notify_all();
        if worker.handle.join().is_err() {
            warn!("purge thread panicked");
        }
        info!(ticks = self.ticks(), "purge coordinator stopped");
    }
}

impl Drop for PurgeCoordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PurgeCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurgeCoordinator")
            .field("targets", &self.len())
            .field("ticks", &self.ticks())
            .field("running", &self.is_running())
            .finish()
    }
}

fn purge_round(targets: &RwLock<Vec<Arc<dyn Purge>>>, ticks: &AtomicU64) {
    // snapshot so register() never waits on a slow purge
    let snapshot: Vec<Arc<dyn Purge>> = targets.read().clone();
    for target in &snapshot {
        target.purge();
    }
    let round = ticks.fetch_add(1, Ordering::Relaxed) + 1;
    debug!(round, targets = snapshot.len(), "purge round complete");
}

fn run(
    targets: &RwLock<Vec<Arc<dyn Purge>>>,
    ticks: &AtomicU64,
    shutdown: &Shutdown,
    interval: Duration,
) {
    let mut stopped = shutdown.stopped.lock();
    while !*stopped {
        let timed_out = shutdown.signal.wait_for(&mut stopped, interval).timed_out();
        if *stopped {
            break;
        }
        if timed_out {
            MutexGuard::unlocked(&mut stopped, || purge_round(targets, ticks));
        }
    }
}
