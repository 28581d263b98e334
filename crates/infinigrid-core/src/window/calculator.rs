//! Builds the cradle window for a requested axis.

use crate::config::ScrollerConfig;
use crate::list_model::RowGeometry;

/// Pixel metrics the window computations need, resolved for one viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowMetrics {
    pub viewport_length: f64,
    pub cell_length: f64,
    pub gap: f64,
    pub padding_start: f64,
    pub padding_end: f64,
    pub runway_rows: usize,
}

impl WindowMetrics {
    pub fn from_config(config: &ScrollerConfig, viewport_length: f64) -> Self {
        Self {
            viewport_length: if viewport_length.is_finite() {
                viewport_length.max(0.0)
            } else {
                0.0
            },
            cell_length: config.cell_length,
            gap: config.gap,
            padding_start: config.padding_start,
            padding_end: config.padding_end,
            runway_rows: config.runway_rows,
        }
    }

    #[inline]
    pub fn row_length(&self) -> f64 {
        self.cell_length + self.gap
    }

    /// Whole or partial rows the viewport spans.
    pub fn viewport_rows(&self) -> usize {
        let row_length = self.row_length();
        if !(row_length > 0.0) || !(self.viewport_length > 0.0) {
            return 0;
        }
        (self.viewport_length / row_length).ceil() as usize
    }

    /// Rows materialized for this viewport, never more than the list holds.
    pub fn cradle_row_count(&self, geometry: &RowGeometry) -> usize {
        if geometry.is_empty() {
            return 0;
        }
        (self.viewport_rows() + 2 * self.runway_rows)
            .max(1)
            .min(geometry.row_count)
    }

    /// Leading-edge position of `row` in scroll-container space.
    pub fn row_position(&self, geometry: &RowGeometry, row: i64) -> f64 {
        self.padding_start + geometry.row_ordinal(row) as f64 * self.row_length()
    }

    /// Full content length including padding.
    pub fn total_scrollable_length(&self, geometry: &RowGeometry) -> f64 {
        let rows = geometry.row_count as f64;
        let content = if geometry.is_empty() {
            0.0
        } else {
            rows * self.cell_length + (rows - 1.0) * self.gap
        };
        self.padding_start + content + self.padding_end
    }

    pub fn max_scroll(&self, geometry: &RowGeometry) -> f64 {
        (self.total_scrollable_length(geometry) - self.viewport_length).max(0.0)
    }

    /// Row whose slot contains `scroll_position`, clamped into the list.
    pub fn row_at_scroll(&self, geometry: &RowGeometry, scroll_position: f64) -> i64 {
        let row_length = self.row_length();
        if !(row_length > 0.0) {
            return geometry.first_row;
        }
        let ordinal = ((scroll_position - self.padding_start) / row_length).floor();
        let ordinal = if ordinal.is_finite() { ordinal as i64 } else { 0 };
        geometry.clamp_row(geometry.first_row + ordinal)
    }
}

/// Result of [`compute_window`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowPlan {
    /// First index of the cradle.
    pub cradle_reference_index: i64,
    /// First index of the cradle's tail.
    pub axis_reference_index: i64,
    pub cradle_item_count: usize,
    pub cradle_first_row: i64,
    pub cradle_row_count: usize,
    /// Distance from the viewport's leading edge to the axis row.
    pub axis_pixel_offset: f64,
    /// Scroll position that realizes the anchor.
    pub scroll_position: f64,
}

/// Computes the cradle for an axis request.
///
/// The requested index is clamped into the list and its row becomes the axis
/// row, placed `pixel_offset_hint` pixels from the viewport's leading edge.
/// When that placement would scroll past either end of the content, the
/// scroll position is clamped and the axis row is re-derived from it. The
/// cradle starts `runway_rows` before the axis row and never extends past
/// the list's last row. Returns `None` for the empty list.
pub fn compute_window(
    requested_axis_index: i64,
    pixel_offset_hint: f64,
    geometry: &RowGeometry,
    metrics: &WindowMetrics,
) -> Option<WindowPlan> {
    if geometry.is_empty() {
        return None;
    }
    let axis_index = requested_axis_index.clamp(geometry.low_index(), geometry.high_index());
    let mut axis_row = geometry.row_of(axis_index);
    let hint = if pixel_offset_hint.is_finite() {
        pixel_offset_hint
    } else {
        0.0
    };

    let desired_scroll = metrics.row_position(geometry, axis_row) - hint;
    let scroll_position = desired_scroll.clamp(0.0, metrics.max_scroll(geometry));
    let axis_pixel_offset = if scroll_position != desired_scroll {
        axis_row = metrics.row_at_scroll(geometry, scroll_position);
        metrics.row_position(geometry, axis_row) - scroll_position
    } else {
        hint
    };

    let cradle_row_count = metrics.cradle_row_count(geometry);
    let mut cradle_first_row = (axis_row - metrics.runway_rows as i64).max(geometry.first_row);
    let cradle_last_row = cradle_first_row + cradle_row_count as i64 - 1;
    if cradle_last_row > geometry.last_row {
        cradle_first_row = (geometry.last_row - cradle_row_count as i64 + 1).max(geometry.first_row);
    }
    let cradle_last_row = (cradle_first_row + cradle_row_count as i64 - 1).min(geometry.last_row);

    Some(WindowPlan {
        cradle_reference_index: geometry.row_start_index(cradle_first_row),
        axis_reference_index: geometry.row_start_index(axis_row),
        cradle_item_count: geometry.items_in_rows(cradle_first_row, cradle_last_row),
        cradle_first_row,
        cradle_row_count,
        axis_pixel_offset,
        scroll_position,
    })
}
