pub mod cell;
pub mod hashmap;
pub mod options;
pub mod slab;

pub use cell::Cell;
pub use hashmap::MapCache;
pub use options::StoreOptions;
pub use slab::{MIN_CAPACITY, PutOutcome, Slab};
