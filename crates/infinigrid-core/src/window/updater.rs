//! Turns a scroll position into head/tail changes of the cradle.

use super::calculator::WindowMetrics;
use super::cradle::CradleWindow;
use crate::axis::{whole_row_delta, AxisAnchor};
use crate::error::EngineError;
use crate::list_model::RowGeometry;

/// Head/tail delta for one scroll update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShiftSpec {
    /// Change of the cradle's first index.
    pub cradle_item_shift: i64,
    /// Change of the axis reference index.
    pub axis_item_shift: i64,
    pub new_cradle_content_count: usize,
    /// Items dropped (positive) or added (negative) at the head.
    pub list_start_change_count: i64,
    /// Items added (positive) or dropped (negative) at the tail.
    pub list_end_change_count: i64,
    pub new_axis_pixel_offset: f64,
    pub new_cradle_reference_index: i64,
    pub new_axis_reference_index: i64,
}

impl ShiftSpec {
    pub fn new_cradle_last_index(&self) -> i64 {
        self.new_cradle_reference_index + self.new_cradle_content_count as i64 - 1
    }
}

/// Outcome of [`update_for_scroll`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollUpdate {
    /// Less than a row moved; only the axis pixel offset changes.
    NoShift { axis_pixel_offset: f64 },
    Shift(ShiftSpec),
    /// The jump is larger than the cradle; rebuild around a new axis.
    Reposition {
        axis_index: i64,
        axis_pixel_offset: f64,
    },
}

/// Computes the cradle update for the current scroll position.
///
/// Only whole rows are converted into head/tail changes; the fractional
/// remainder stays in the axis pixel offset. The axis never leaves the list
/// rows, and the cradle is clamped so it never requests indices outside the
/// list.
pub fn update_for_scroll(
    current_scroll: f64,
    anchor: AxisAnchor,
    window: &CradleWindow,
    geometry: &RowGeometry,
    metrics: &WindowMetrics,
) -> Result<ScrollUpdate, EngineError> {
    if geometry.is_empty() {
        return Ok(ScrollUpdate::NoShift {
            axis_pixel_offset: 0.0,
        });
    }
    if anchor.reference_index < geometry.low_index() || anchor.reference_index > geometry.high_index()
    {
        return Err(EngineError::AxisOutOfBounds {
            index: anchor.reference_index,
            low: geometry.low_index(),
            high: geometry.high_index(),
        });
    }

    let row_length = metrics.row_length();
    let axis_row = geometry.row_of(anchor.reference_index);
    let offset = metrics.row_position(geometry, axis_row) - current_scroll;
    let requested = whole_row_delta(offset, row_length);
    let target_row = geometry.clamp_row(axis_row + requested);
    let row_delta = target_row - axis_row;
    let new_axis_pixel_offset = offset + row_delta as f64 * row_length;

    if row_delta == 0 {
        return Ok(ScrollUpdate::NoShift {
            axis_pixel_offset: new_axis_pixel_offset,
        });
    }

    let cradle_row_count = metrics.cradle_row_count(geometry);
    let (old_first, old_last) = match window.first_index().zip(window.last_index()) {
        Some(bounds) if row_delta.unsigned_abs() < cradle_row_count as u64 => bounds,
        _ => {
            return Ok(ScrollUpdate::Reposition {
                axis_index: geometry.row_start_index(target_row),
                axis_pixel_offset: new_axis_pixel_offset,
            })
        }
    };

    let latest_first_row = (geometry.last_row - cradle_row_count as i64 + 1).max(geometry.first_row);
    let new_first_row =
        (target_row - metrics.runway_rows as i64).clamp(geometry.first_row, latest_first_row);
    let new_last_row = (new_first_row + cradle_row_count as i64 - 1).min(geometry.last_row);
    let new_first = geometry.row_start_index(new_first_row);
    let new_last = geometry.row_end_index(new_last_row);

    let list_start_change_count = new_first - old_first;
    let list_end_change_count = new_last - old_last;
    let count = window.len() as i64 + list_end_change_count - list_start_change_count;
    if count < 0 {
        return Err(EngineError::NegativeContentCount { count });
    }

    let old_axis = window.axis_index().unwrap_or(anchor.reference_index);
    let new_axis_reference_index = geometry.row_start_index(target_row);
    Ok(ScrollUpdate::Shift(ShiftSpec {
        cradle_item_shift: list_start_change_count,
        axis_item_shift: new_axis_reference_index - old_axis,
        new_cradle_content_count: count as usize,
        list_start_change_count,
        list_end_change_count,
        new_axis_pixel_offset,
        new_cradle_reference_index: new_first,
        new_axis_reference_index,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::calculator::compute_window;
    use super::*;
    use crate::list_model::VirtualListRange;

    fn setup(axis: i64) -> (RowGeometry, WindowMetrics, CradleWindow, AxisAnchor) {
        let geometry = VirtualListRange::new(0, 999, 5).row_geometry();
        let metrics = WindowMetrics {
            viewport_length: 500.0,
            cell_length: 50.0,
            gap: 0.0,
            padding_start: 0.0,
            padding_end: 0.0,
            runway_rows: 2,
        };
        let plan = compute_window(axis, 0.0, &geometry, &metrics).unwrap();
        let window = CradleWindow::build(
            plan.cradle_reference_index,
            plan.cradle_item_count,
            plan.axis_reference_index,
            |_| None,
        );
        let anchor = AxisAnchor::new(plan.axis_reference_index, plan.axis_pixel_offset);
        (geometry, metrics, window, anchor)
    }

    #[test]
    fn test_sub_row_scroll_only_moves_offset() {
        let (geometry, metrics, window, anchor) = setup(500);
        let update = update_for_scroll(5020.0, anchor, &window, &geometry, &metrics).unwrap();
        assert_eq!(
            update,
            ScrollUpdate::NoShift {
                axis_pixel_offset: -20.0
            }
        );
    }

    #[test]
    fn test_forward_scroll_shifts_whole_rows() {
        let (geometry, metrics, window, anchor) = setup(500);
        // 2.4 rows forward from row 100.
        let update = update_for_scroll(5120.0, anchor, &window, &geometry, &metrics).unwrap();
        let ScrollUpdate::Shift(spec) = update else {
            panic!("expected shift, got {update:?}");
        };
        assert_eq!(spec.new_axis_reference_index, 510);
        assert_eq!(spec.axis_item_shift, 10);
        assert_eq!(spec.cradle_item_shift, 10);
        assert_eq!(spec.list_start_change_count, 10);
        assert_eq!(spec.list_end_change_count, 10);
        assert_eq!(spec.new_cradle_content_count, 70);
        assert!((spec.new_axis_pixel_offset + 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_backward_scroll_near_start_clamps_cradle() {
        let (geometry, metrics, window, anchor) = setup(15);
        // Axis row 3 at 150px; scroll back to 0.
        let update = update_for_scroll(0.0, anchor, &window, &geometry, &metrics).unwrap();
        let ScrollUpdate::Shift(spec) = update else {
            panic!("expected shift, got {update:?}");
        };
        assert_eq!(spec.new_axis_reference_index, 0);
        assert_eq!(spec.new_cradle_reference_index, 0);
        assert_eq!(spec.list_start_change_count, -5);
        assert_eq!(spec.list_end_change_count, -5);
        assert_eq!(spec.new_axis_pixel_offset, 0.0);
    }

    #[test]
    fn test_large_jump_repositions() {
        let (geometry, metrics, window, anchor) = setup(0);
        let update = update_for_scroll(50.0 * 60.0, anchor, &window, &geometry, &metrics).unwrap();
        assert_eq!(
            update,
            ScrollUpdate::Reposition {
                axis_index: 300,
                axis_pixel_offset: 0.0
            }
        );
    }

    #[test]
    fn test_axis_outside_list_is_rejected() {
        let (geometry, metrics, window, _) = setup(0);
        let err = update_for_scroll(0.0, AxisAnchor::new(5000, 0.0), &window, &geometry, &metrics)
            .unwrap_err();
        assert!(matches!(err, EngineError::AxisOutOfBounds { index: 5000, .. }));
    }
}
