//! Read-only views handed to the render surface and to host queries.

use crate::axis::ScrollDirection;
use crate::cache::CacheState;
use crate::config::Orientation;
use crate::list_model::euclid_mod;
use crate::state_machine::CradlePhase;
use crate::window::CellSlot;

/// Offset of a cell inside the scroll container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellPosition {
    /// Along the scroll axis.
    pub main: f64,
    /// Along the cross axis.
    pub cross: f64,
}

impl CellPosition {
    /// Converts to `(x, y)` for the given orientation.
    pub fn to_xy(self, orientation: Orientation) -> (f64, f64) {
        match orientation {
            Orientation::Vertical => (self.cross, self.main),
            Orientation::Horizontal => (self.main, self.cross),
        }
    }
}

/// Cell geometry needed to place slots in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellLayout {
    pub cell_length: f64,
    pub cell_cross_length: f64,
    pub gap: f64,
    pub cross_gap: f64,
    pub padding_start: f64,
    pub padding_cross: f64,
    pub first_row: i64,
}

/// The current window as seen by the render surface.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowSnapshot {
    pub head: Vec<CellSlot>,
    pub tail: Vec<CellSlot>,
    /// `None` while the list is empty.
    pub axis_reference_index: Option<i64>,
    pub axis_pixel_offset: f64,
    /// Scroll position that matches the axis anchor.
    pub scroll_position: f64,
    pub total_scrollable_length: f64,
    /// Cells per row; 0 for the empty list.
    pub cross_count: usize,
    pub orientation: Orientation,
    pub layout: CellLayout,
}

impl WindowSnapshot {
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.tail.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = &CellSlot> {
        self.head.iter().chain(self.tail.iter())
    }

    pub fn indices(&self) -> Vec<i64> {
        self.slots().map(|slot| slot.index).collect()
    }

    pub fn first_index(&self) -> Option<i64> {
        self.slots().next().map(|slot| slot.index)
    }

    pub fn last_index(&self) -> Option<i64> {
        self.tail
            .last()
            .or_else(|| self.head.last())
            .map(|slot| slot.index)
    }

    pub fn contains(&self, index: i64) -> bool {
        match (self.first_index(), self.last_index()) {
            (Some(first), Some(last)) => index >= first && index <= last,
            _ => false,
        }
    }

    /// Pixel offset of the cell at `index`, or `None` when it is not in the
    /// window.
    pub fn cell_position(&self, index: i64) -> Option<CellPosition> {
        if !self.contains(index) || self.cross_count == 0 {
            return None;
        }
        let cross_count = self.cross_count as i64;
        let layout = &self.layout;
        let row = index.div_euclid(cross_count);
        let column = euclid_mod(index, cross_count);
        Some(CellPosition {
            main: layout.padding_start
                + (row - layout.first_row) as f64 * (layout.cell_length + layout.gap),
            cross: layout.padding_cross
                + column as f64 * (layout.cell_cross_length + layout.cross_gap),
        })
    }
}

/// Point-in-time summary of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollerProperties {
    pub session_id: u64,
    pub list_bounds: Option<(i64, i64)>,
    pub list_size: usize,
    pub cross_count: usize,
    pub row_count: usize,
    pub orientation: Orientation,
    pub phase: CradlePhase,
    pub cache_state: CacheState,
    pub cached_count: usize,
    pub pending_fetches: usize,
    pub failed_indices: Vec<i64>,
    pub viewport_length: f64,
    pub viewport_cross_length: f64,
    pub scroll_position: f64,
    /// Direction of the last scroll that moved the viewport.
    pub scroll_direction: ScrollDirection,
}
