// ==============================================
// PURGE COORDINATOR TESTS (integration)
// ==============================================
//
// The coordinator driving real caches on a timer.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use slabcache::prelude::*;

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    done()
}

#[test]
fn timer_purges_registered_caches() {
    let ring: Arc<CycleCache<u32, u32>> = Arc::new(CycleCache::new(16).unwrap());
    let map: Arc<MapCache<u32, u32>> = Arc::new(MapCache::new());
    for key in 0..16 {
        ring.store(key, key);
        map.store(key, key);
    }
    for key in 0..8 {
        ring.remove(&key);
        map.remove(&key);
    }
    assert_eq!(ring.policy().pending_removals(), 8);

    let coordinator = PurgeCoordinator::new(vec![ring.clone() as Arc<dyn Purge>, map.clone()]);
    coordinator.start(Duration::from_millis(5)).unwrap();
    assert!(wait_until(Duration::from_secs(2), || coordinator.ticks() >= 2));
    coordinator.stop();

    assert_eq!(ring.policy().pending_removals(), 0);
    assert!(ring.metrics().compactions >= 1);
    assert_eq!(ring.len(), 8);
    assert_eq!(map.metrics().capacity, 8);
    for key in 8..16 {
        assert_eq!(ring.load(&key), Some(key));
        assert_eq!(map.load(&key), Some(key));
    }
}

#[test]
fn timer_drops_expired_entries() {
    let map: Arc<MapCache<u32, u32>> = Arc::new(MapCache::new());
    map.store_with(1, 1, StoreOptions::ttl(Duration::ZERO));
    map.store(2, 2);

    let coordinator = PurgeCoordinator::new(Vec::new());
    coordinator.register(map.clone());
    coordinator.start(Duration::from_millis(5)).unwrap();
    assert!(wait_until(Duration::from_secs(2), || map.metrics().capacity == 1));
    coordinator.stop();

    assert_eq!(map.load(&2), Some(2));
}

#[test]
fn no_rounds_after_stop() {
    let cache: Arc<LruCache<u32, u32>> = Arc::new(LruCache::new(8).unwrap());
    let coordinator = PurgeCoordinator::new(vec![cache as Arc<dyn Purge>]);
    coordinator.start(Duration::from_millis(1)).unwrap();
    assert!(wait_until(Duration::from_secs(2), || coordinator.ticks() >= 1));
    coordinator.stop();

    let ticks = coordinator.ticks();
    thread::sleep(Duration::from_millis(30));
    assert_eq!(coordinator.ticks(), ticks);
    assert!(!coordinator.is_running());
}

#[test]
fn drop_stops_the_worker() {
    let cache: Arc<ArcCache<u32, u32>> = Arc::new(ArcCache::new(8).unwrap());
    let coordinator = PurgeCoordinator::new(vec![cache.clone() as Arc<dyn Purge>]);
    coordinator.start(Duration::from_millis(1)).unwrap();
    drop(coordinator);

    // only the test's handle remains once the worker has exited
    assert_eq!(Arc::strong_count(&cache), 1);
}
