//! The axis anchor ties one logical index to a pixel offset.
//!
//! The axis is the first index of the cradle's tail: the row at (or
//! straddling) the leading edge of the viewport. Its pixel offset is the
//! distance from the viewport's leading edge to the axis row's leading edge,
//! so a positive offset means the axis row sits inside the viewport and a
//! negative one means it is partially scrolled out.

/// The committed `(reference index, pixel offset)` anchor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisAnchor {
    pub reference_index: i64,
    pub pixel_offset: f64,
}

impl AxisAnchor {
    pub fn new(reference_index: i64, pixel_offset: f64) -> Self {
        Self {
            reference_index,
            pixel_offset,
        }
    }
}

/// Direction of the most recent scroll movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    #[default]
    None,
    Forward,
    Backward,
}

/// Owns the single axis anchor of a session.
#[derive(Debug, Default)]
pub struct AxisPositionTracker {
    anchor: Option<AxisAnchor>,
    last_scroll_position: f64,
    direction: ScrollDirection,
}

impl AxisPositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current anchor; `None` while the list is empty or not yet laid out.
    pub fn anchor(&self) -> Option<AxisAnchor> {
        self.anchor
    }

    pub fn commit(&mut self, anchor: AxisAnchor) {
        self.anchor = Some(anchor);
    }

    /// Updates only the pixel offset of the committed anchor.
    pub fn set_pixel_offset(&mut self, pixel_offset: f64) {
        if let Some(anchor) = self.anchor.as_mut() {
            anchor.pixel_offset = pixel_offset;
        }
    }

    pub fn clear(&mut self) {
        self.anchor = None;
        self.direction = ScrollDirection::None;
    }

    pub fn last_scroll_position(&self) -> f64 {
        self.last_scroll_position
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Records a scroll position and returns the signed pixel delta from the
    /// previous one.
    pub fn record_scroll(&mut self, scroll_position: f64) -> f64 {
        let delta = scroll_position - self.last_scroll_position;
        self.direction = if delta > 0.0 {
            ScrollDirection::Forward
        } else if delta < 0.0 {
            ScrollDirection::Backward
        } else {
            self.direction
        };
        self.last_scroll_position = scroll_position;
        delta
    }

    /// Resets the scroll baseline without reporting a delta.
    pub fn reset_scroll_position(&mut self, scroll_position: f64) {
        self.last_scroll_position = scroll_position;
    }
}

/// Whole rows the axis must move for a given axis pixel offset.
///
/// Positive results move the axis forward (toward higher indices). The
/// fractional remainder is left for the pixel offset.
pub fn whole_row_delta(axis_pixel_offset: f64, row_length: f64) -> i64 {
    if !(row_length > 0.0) || !axis_pixel_offset.is_finite() {
        return 0;
    }
    if axis_pixel_offset <= -row_length {
        (-axis_pixel_offset / row_length).floor() as i64
    } else if axis_pixel_offset >= row_length {
        -((axis_pixel_offset / row_length).floor() as i64)
    } else {
        0
    }
}
