//! Cache Module
//!
//! Key normalization, cache items and their state machine, and the store
//! that holds them.

mod item;
mod key;
mod stats;
mod store;


// Re-export public types
pub use item::{CacheItem, ItemState};
pub use key::{contains_normalized, normalize};
pub use stats::{DispatchStats, DispatchTrigger};
pub use store::{CacheStore, PageId};
