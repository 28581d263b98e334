//! Virtual-window content engine for infinitely scrolling grids and lists.
//!
//! A [`ScrollerSession`] maps a logical list of indexed items onto a bounded
//! window of rows (the cradle) around the viewport, keeps a pixel-accurate
//! axis anchor, and manages a sparse cache of fetched cell content that
//! survives scrolling, reordering, insertion and removal.

pub mod axis;
pub mod cache;
pub mod collections;
pub mod config;
pub mod error;
pub mod fetch;
pub mod list_model;
pub mod platform;
mod service;
pub mod session;
pub mod signal;
pub mod snapshot;
pub mod state_machine;
pub mod window;

pub use axis::{AxisAnchor, AxisPositionTracker, ScrollDirection};
pub use cache::{
    CacheEntry, CacheState, CellContent, Eviction, ItemId, PartitionId, RangeIncrement,
    RangeShift, SparseCache, CACHE_PARTITION_SIZE,
};
pub use config::{CacheMode, Orientation, ScrollerConfig};
pub use error::{EngineError, FetchError, ServiceError};
pub use fetch::{FetchFuture, FetchRequest, Fetched, ItemFetcher};
pub use list_model::{RowGeometry, VirtualListRange};
pub use platform::{Clock, SystemClock};
pub use session::{
    CacheChange, EngineState, HostCallbacks, ItemException, ScrollerSession, ViewportGeometry,
    ViewportProbe,
};
pub use signal::{BoundaryEdge, EngineEvent, SignalAdapter, ViewportSignal};
pub use snapshot::{CellLayout, CellPosition, ScrollerProperties, WindowSnapshot};
pub use state_machine::CradlePhase;
pub use window::{CellSlot, CradleWindow, WindowPlan};

pub mod prelude {
    pub use crate::cache::{CellContent, ItemId};
    pub use crate::config::{CacheMode, Orientation, ScrollerConfig};
    pub use crate::error::{FetchError, ServiceError};
    pub use crate::fetch::{FetchFuture, FetchRequest, Fetched, ItemFetcher};
    pub use crate::session::{HostCallbacks, ScrollerSession, ViewportGeometry, ViewportProbe};
    pub use crate::signal::{BoundaryEdge, ViewportSignal};
    pub use crate::snapshot::WindowSnapshot;
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod session_tests;

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod service_tests;
