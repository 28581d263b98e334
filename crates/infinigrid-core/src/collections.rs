//! Hash collections used by the cache, the fetch queue and the session.
//!
//! Keys are small integers (`ItemId`, logical indices), so the Fx hasher is
//! the default. The `std-hash` feature swaps in the std SipHash maps.

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
}

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}
