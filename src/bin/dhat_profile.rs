//! DHAT heap profiler for slabcache.
//!
//! Run with: cargo run --bin dhat_profile --release --features dhat-heap
//! View results: Open dhat-heap.json in <https://nnethercote.github.io/dh_view/dh_view.html>

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::sync::Arc;

use slabcache::cache::{ArcCache, CycleCache, LruCache};
use slabcache::traits::CoreCache;

/// Simple XorShift64 RNG for deterministic workloads.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_f64(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / (u64::MAX as f64);
        (self.next_u64() as f64) * SCALE
    }
}

/// Hotset workload: 90% of accesses hit 10% of keys.
fn hotset_workload<C: CoreCache<u64, Arc<u64>>>(
    cache: &C,
    operations: usize,
    universe: u64,
    seed: u64,
) {
    let mut rng = XorShift64::new(seed);
    let hot_size = (universe as f64 * 0.1) as u64;

    for _ in 0..operations {
        let key = if rng.next_f64() < 0.9 {
            rng.next_u64() % hot_size
        } else {
            hot_size + (rng.next_u64() % (universe - hot_size))
        };

        if cache.load(&key).is_none() {
            cache.store(key, Arc::new(key));
        }
    }
}

/// Sequential scan over the key universe.
fn scan_workload<C: CoreCache<u64, Arc<u64>>>(cache: &C, operations: usize, universe: u64) {
    for i in 0..operations {
        let key = (i as u64) % universe;
        if cache.load(&key).is_none() {
            cache.store(key, Arc::new(key));
        }
    }
}

/// Removes every third key, then keeps writing so compaction has dead cells to clear.
fn removal_churn<C: CoreCache<u64, Arc<u64>>>(cache: &C, operations: usize) {
    for i in 0..operations as u64 {
        if i % 3 == 0 {
            cache.remove(&i);
        }
        cache.store(i, Arc::new(i));
    }
}

fn profile<C: CoreCache<u64, Arc<u64>>>(name: &str, cache: &C, capacity: usize) {
    println!("=== Profiling {name} ===");
    let operations = 100_000;
    let universe = 16_384;

    for i in 0..capacity as u64 {
        cache.store(i, Arc::new(i));
    }

    hotset_workload(cache, operations, universe, 42);
    scan_workload(cache, operations / 2, universe);
    removal_churn(cache, operations / 4);

    println!("  Final size: {}", cache.len());
}

fn main() {
    let _profiler = dhat::Profiler::new_heap();
    let capacity = 4096;

    println!("slabcache DHAT Heap Profiling");
    println!("=============================\n");

    match (
        ArcCache::new(capacity),
        LruCache::new(capacity),
        CycleCache::new(capacity),
    ) {
        (Ok(arc), Ok(lru), Ok(cycle)) => {
            profile("ARC-hybrid", &arc, capacity);
            profile("LRU", &lru, capacity);
            profile("cycle", &cycle, capacity);
        },
        _ => eprintln!("capacity {capacity} rejected"),
    }

    println!("\n=============================");
    println!("Profile written to dhat-heap.json");
}
