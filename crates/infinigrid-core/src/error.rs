//! Error types for the service boundary and for engine invariants.
//!
//! Two families exist and they never mix:
//! - [`ServiceError`] is returned to the host when a service call carries bad
//!   arguments. The call is a no-op.
//! - [`EngineError`] signals a broken internal invariant. The session logs it,
//!   aborts the current recompute and keeps the last known-good window.

use crate::cache::ItemId;
use crate::state_machine::CradlePhase;

/// Validation failure reported by a host-facing service operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// `high < low` where a non-empty range was required.
    InvalidRange { low: i64, high: i64 },
    /// An index fell outside the current list bounds.
    IndexOutOfBounds { index: i64, low: i64, high: i64 },
    /// A count argument was zero or would overflow the index space.
    InvalidCount { count: usize },
    /// The operation needs at least one item in the list.
    EmptyList,
    /// A pixel argument was NaN or infinite.
    InvalidPixel { value: f64 },
    /// A remap request would break the index/item bijection.
    InvalidRemap { reason: String },
    /// The session has no viewport geometry yet.
    Uninitialized,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::InvalidRange { low, high } => {
                write!(f, "invalid range [{low}, {high}]: high is below low")
            }
            ServiceError::IndexOutOfBounds { index, low, high } => {
                write!(f, "index {index} is outside list bounds [{low}, {high}]")
            }
            ServiceError::InvalidCount { count } => write!(f, "invalid count {count}"),
            ServiceError::EmptyList => write!(f, "operation requires a non-empty list"),
            ServiceError::InvalidPixel { value } => write!(f, "invalid pixel value {value}"),
            ServiceError::InvalidRemap { reason } => write!(f, "invalid remap: {reason}"),
            ServiceError::Uninitialized => write!(f, "scroller has no viewport geometry yet"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Invariant violation detected inside the engine.
///
/// These indicate a logic defect rather than a runtime condition the host
/// can recover from.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    NegativeContentCount { count: i64 },
    AxisOutOfBounds { index: i64, low: i64, high: i64 },
    CacheBijectionLost { index: i64, item_id: ItemId },
    NonContiguousWindow { expected: i64, found: i64 },
    IllegalTransition { from: CradlePhase, to: CradlePhase },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NegativeContentCount { count } => {
                write!(f, "computed cradle content count {count} is negative")
            }
            EngineError::AxisOutOfBounds { index, low, high } => {
                write!(f, "axis index {index} outside list bounds [{low}, {high}]")
            }
            EngineError::CacheBijectionLost { index, item_id } => {
                write!(f, "cache maps index {index} to item {item_id} which disagrees")
            }
            EngineError::NonContiguousWindow { expected, found } => {
                write!(f, "cradle window expected index {expected}, found {found}")
            }
            EngineError::IllegalTransition { from, to } => {
                write!(f, "illegal cradle transition {from:?} -> {to:?}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Failure reported by the host's item fetcher for a single index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fetch failed: {}", self.message)
    }
}

impl std::error::Error for FetchError {}
