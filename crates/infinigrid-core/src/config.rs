//! Scroller configuration.
//!
//! All lengths are in the host's pixel space. The main axis is the scroll
//! axis (vertical for [`Orientation::Vertical`]); the cross axis holds the
//! cells of a single row.

use std::time::Duration;

/// Default number of rows materialized beyond each edge of the viewport.
pub const DEFAULT_RUNWAY_ROWS: usize = 3;

/// Default trailing debounce for scroll-settled notifications.
pub const DEFAULT_SCROLL_SETTLE_TIMEOUT: Duration = Duration::from_millis(200);

/// Default trailing debounce for resize-settled notifications.
pub const DEFAULT_RESIZE_SETTLE_TIMEOUT: Duration = Duration::from_millis(250);

/// Scroll direction of the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl Orientation {
    /// Returns the other orientation.
    pub fn pivot(self) -> Self {
        match self {
            Orientation::Vertical => Orientation::Horizontal,
            Orientation::Horizontal => Orientation::Vertical,
        }
    }
}

/// How cached content outside the cradle is retained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Match the cache to the cradle after every rebuild or shift.
    #[default]
    Cradle,
    /// Keep content that leaves the cradle, paring to `cache_max` when set.
    Keep,
    /// Fetch the whole list (up to `cache_max`) after the first build.
    Preload,
}

/// Configuration for a scroller session.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollerConfig {
    /// Scroll axis.
    pub orientation: Orientation,

    /// Cell length along the main axis.
    pub cell_length: f64,

    /// Cell length along the cross axis.
    pub cell_cross_length: f64,

    /// Spacing between rows along the main axis.
    pub gap: f64,

    /// Spacing between cells of a row along the cross axis.
    pub cross_gap: f64,

    /// Padding before the first row.
    pub padding_start: f64,

    /// Padding after the last row.
    pub padding_end: f64,

    /// Padding on both sides of the cross axis.
    pub padding_cross: f64,

    /// Rows kept materialized beyond each edge of the viewport.
    pub runway_rows: usize,

    /// Cache retention policy.
    pub cache_mode: CacheMode,

    /// Maximum number of cached entries for [`CacheMode::Keep`] and
    /// [`CacheMode::Preload`]. `None` means unbounded.
    pub cache_max: Option<usize>,

    /// Quiet period after the last scroll signal before a settled event fires.
    pub scroll_settle_timeout: Duration,

    /// Quiet period after the last resize signal before a re-layout runs.
    pub resize_settle_timeout: Duration,
}

impl Default for ScrollerConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            cell_length: 40.0,
            cell_cross_length: 40.0,
            gap: 0.0,
            cross_gap: 0.0,
            padding_start: 0.0,
            padding_end: 0.0,
            padding_cross: 0.0,
            runway_rows: DEFAULT_RUNWAY_ROWS,
            cache_mode: CacheMode::Cradle,
            cache_max: None,
            scroll_settle_timeout: DEFAULT_SCROLL_SETTLE_TIMEOUT,
            resize_settle_timeout: DEFAULT_RESIZE_SETTLE_TIMEOUT,
        }
    }
}

impl ScrollerConfig {
    /// Creates a configuration for uniform square-ish cells.
    pub fn new(cell_length: f64, cell_cross_length: f64) -> Self {
        Self {
            cell_length,
            cell_cross_length,
            ..Self::default()
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_gaps(mut self, gap: f64, cross_gap: f64) -> Self {
        self.gap = gap;
        self.cross_gap = cross_gap;
        self
    }

    pub fn with_padding(mut self, start: f64, end: f64, cross: f64) -> Self {
        self.padding_start = start;
        self.padding_end = end;
        self.padding_cross = cross;
        self
    }

    pub fn with_runway_rows(mut self, runway_rows: usize) -> Self {
        self.runway_rows = runway_rows;
        self
    }

    pub fn with_cache(mut self, mode: CacheMode, cache_max: Option<usize>) -> Self {
        self.cache_mode = mode;
        self.cache_max = cache_max;
        self
    }

    pub fn with_settle_timeouts(mut self, scroll: Duration, resize: Duration) -> Self {
        self.scroll_settle_timeout = scroll;
        self.resize_settle_timeout = resize;
        self
    }

    /// Number of cells that fit in one row for a viewport of `cross_length`.
    ///
    /// Always at least 1, so a viewport narrower than one cell still shows a
    /// (clipped) column.
    pub fn cross_count_for(&self, cross_length: f64) -> usize {
        let pitch = self.cell_cross_length + self.cross_gap;
        if !(pitch > 0.0) || !cross_length.is_finite() {
            return 1;
        }
        let available = cross_length - 2.0 * self.padding_cross + self.cross_gap;
        let count = (available / pitch).floor();
        if count < 1.0 {
            1
        } else {
            count as usize
        }
    }
}
