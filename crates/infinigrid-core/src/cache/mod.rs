//! Sparse content cache.
//!
//! The cache outlives the cradle: content that scrolls out of the window can
//! be retained (see [`crate::config::CacheMode`]) and survives reordering,
//! insertion and removal of logical indices because entries are keyed by a
//! stable [`ItemId`] rather than by index.

mod entry;
mod eviction;
mod partition;
mod remap;
mod sparse_cache;

pub use entry::{CacheEntry, CellContent, ItemId, PartitionId};
pub use eviction::Eviction;
pub use partition::{CachePartition, PartitionPool, CACHE_PARTITION_SIZE};
pub use remap::{RangeIncrement, RangeShift};
pub use sparse_cache::{CacheState, SparseCache};
