//! Logical list description: index bounds, cross count and row geometry.
//!
//! Rows are aligned to multiples of the cross count in index space: row `r`
//! covers indices `r * cross_count ..= r * cross_count + cross_count - 1`.
//! A list whose low index is not a multiple of the cross count therefore has
//! unfilled cells ("blanks") at the start of its first row, and symmetrically
//! at the end of its last row. Negative indices are allowed so content can be
//! prepended before zero without renumbering.

/// Largest index a list may hold. Bounds are kept well inside `i64` so that
/// spans, row numbers and shifted indices never overflow.
pub const MAX_LIST_INDEX: i64 = i64::MAX / 4;

/// Smallest index a list may hold.
pub const MIN_LIST_INDEX: i64 = -MAX_LIST_INDEX;

/// Sign-aware modulo, always in `[0, n)` for `n > 0`.
///
/// This is the single normalization used for every index/row computation in
/// the crate.
#[inline]
pub fn euclid_mod(value: i64, n: i64) -> i64 {
    value.rem_euclid(n)
}

/// Row containing `index` for a given cross count (floor division).
#[inline]
pub fn row_of(index: i64, cross_count: usize) -> i64 {
    index.div_euclid(cross_count.max(1) as i64)
}

/// Canonical description of the logical list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VirtualListRange {
    low_index: i64,
    high_index: i64,
    size: usize,
    cross_count: usize,
}

impl Default for VirtualListRange {
    fn default() -> Self {
        Self::empty(1)
    }
}

impl VirtualListRange {
    /// Creates a range `[low, high]`. `high < low` produces the empty list.
    pub fn new(low_index: i64, high_index: i64, cross_count: usize) -> Self {
        let mut range = Self::empty(cross_count);
        range.set_range(low_index, high_index);
        range
    }

    /// Creates an empty list.
    pub fn empty(cross_count: usize) -> Self {
        Self {
            low_index: 0,
            high_index: -1,
            size: 0,
            cross_count: cross_count.max(1),
        }
    }

    /// Creates `[0, size - 1]`.
    pub fn with_size(size: usize, cross_count: usize) -> Self {
        Self::new(0, size as i64 - 1, cross_count)
    }

    /// Replaces the bounds and returns the resulting row geometry.
    ///
    /// An inverted range is the empty-list state, not an error. Bounds are
    /// clamped into `[MIN_LIST_INDEX, MAX_LIST_INDEX]`.
    pub fn set_range(&mut self, low_index: i64, high_index: i64) -> RowGeometry {
        if high_index < low_index {
            self.low_index = 0;
            self.high_index = -1;
            self.size = 0;
        } else {
            let low_index = low_index.clamp(MIN_LIST_INDEX, MAX_LIST_INDEX);
            let high_index = high_index.clamp(low_index, MAX_LIST_INDEX);
            self.low_index = low_index;
            self.high_index = high_index;
            self.size = (high_index - low_index + 1) as usize;
        }
        self.row_geometry()
    }

    /// Updates the number of cells per row and returns the new row geometry.
    pub fn set_cross_count(&mut self, cross_count: usize) -> RowGeometry {
        self.cross_count = cross_count.max(1);
        self.row_geometry()
    }

    pub fn low_index(&self) -> i64 {
        self.low_index
    }

    pub fn high_index(&self) -> i64 {
        self.high_index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn cross_count(&self) -> usize {
        self.cross_count
    }

    /// Returns `(low, high)` or `None` for the empty list.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        if self.is_empty() {
            None
        } else {
            Some((self.low_index, self.high_index))
        }
    }

    pub fn contains(&self, index: i64) -> bool {
        !self.is_empty() && index >= self.low_index && index <= self.high_index
    }

    /// Clamps `index` into the list bounds. `None` for the empty list.
    pub fn clamp(&self, index: i64) -> Option<i64> {
        self.bounds().map(|(low, high)| index.clamp(low, high))
    }

    /// Derives the row geometry for the current bounds and cross count.
    pub fn row_geometry(&self) -> RowGeometry {
        if self.is_empty() {
            return RowGeometry::default();
        }
        let cross = self.cross_count as i64;
        let first_row = row_of(self.low_index, self.cross_count);
        let last_row = row_of(self.high_index, self.cross_count);
        RowGeometry {
            row_count: (last_row - first_row + 1) as usize,
            base_row_blanks: euclid_mod(self.low_index, cross) as usize,
            end_row_blanks: (cross - 1 - euclid_mod(self.high_index, cross)) as usize,
            first_row,
            last_row,
            low_index: self.low_index,
            high_index: self.high_index,
            cross_count: self.cross_count,
        }
    }
}

/// Row layout derived from a [`VirtualListRange`].
///
/// For the empty list every field is zero, and [`RowGeometry::cross_count`]
/// returns `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowGeometry {
    pub row_count: usize,
    pub base_row_blanks: usize,
    pub end_row_blanks: usize,
    pub first_row: i64,
    pub last_row: i64,
    low_index: i64,
    high_index: i64,
    cross_count: usize,
}

impl RowGeometry {
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Cells per row, or `None` for the empty list.
    pub fn cross_count(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.cross_count)
        }
    }

    pub fn low_index(&self) -> i64 {
        self.low_index
    }

    pub fn high_index(&self) -> i64 {
        self.high_index
    }

    pub fn row_of(&self, index: i64) -> i64 {
        row_of(index, self.cross_count)
    }

    /// Clamps a row number into `[first_row, last_row]`.
    pub fn clamp_row(&self, row: i64) -> i64 {
        row.clamp(self.first_row, self.last_row)
    }

    /// First list index in `row`, honoring base-row blanks.
    pub fn row_start_index(&self, row: i64) -> i64 {
        (row * self.cross_count as i64).max(self.low_index)
    }

    /// Last list index in `row`, honoring end-row blanks.
    pub fn row_end_index(&self, row: i64) -> i64 {
        (row * self.cross_count as i64 + self.cross_count as i64 - 1).min(self.high_index)
    }

    /// Number of list items in rows `first..=last`.
    pub fn items_in_rows(&self, first: i64, last: i64) -> usize {
        if self.is_empty() || last < first {
            return 0;
        }
        let mut count = (last - first + 1) as usize * self.cross_count;
        if first == self.first_row {
            count -= self.base_row_blanks;
        }
        if last == self.last_row {
            count -= self.end_row_blanks;
        }
        count
    }

    /// Zero-based row number of `row` relative to the list's first row.
    pub fn row_ordinal(&self, row: i64) -> i64 {
        row - self.first_row
    }

    /// Cross-axis slot (`0..cross_count`) of `index` within its row.
    pub fn column_of(&self, index: i64) -> usize {
        euclid_mod(index, self.cross_count.max(1) as i64) as usize
    }
}
