//! Cradle window: the bounded set of rows materialized around the viewport.

mod calculator;
mod cradle;
mod updater;

pub use calculator::{compute_window, WindowMetrics, WindowPlan};
pub use cradle::{CellSlot, CradleWindow, WindowDelta};
pub use updater::{update_for_scroll, ScrollUpdate, ShiftSpec};
