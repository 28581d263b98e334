//! Host-facing service operations.
//!
//! Each operation validates its arguments first and returns a
//! [`ServiceError`] without touching state when they are bad. List
//! mutations keep the current anchor so the visible content stays put.

use std::collections::BTreeMap;

use crate::cache::{ItemId, PartitionId, RangeIncrement, RangeShift};
use crate::collections::map::HashSet;
use crate::config::Orientation;
use crate::error::ServiceError;
use crate::list_model::{MAX_LIST_INDEX, MIN_LIST_INDEX};
use crate::session::ScrollerSession;

impl<C: 'static> ScrollerSession<C> {
    /// Rebuilds the window with `index` at the viewport's leading edge.
    pub fn scroll_to_index(&mut self, index: i64) -> Result<(), ServiceError> {
        self.require_started()?;
        self.require_in_bounds(index)?;
        self.signals.discard_scroll();
        self.signals.cancel_settle();
        let result = self.rebuild(index, 0.0);
        self.settle(result);
        Ok(())
    }

    /// Rebuilds the window for an absolute scroll position.
    pub fn scroll_to_pixel(&mut self, position: f64) -> Result<(), ServiceError> {
        self.require_started()?;
        if !position.is_finite() {
            return Err(ServiceError::InvalidPixel { value: position });
        }
        if self.state.list.is_empty() {
            return Err(ServiceError::EmptyList);
        }
        let geometry = self.state.list.row_geometry();
        let metrics = self.metrics();
        let position = position.clamp(0.0, metrics.max_scroll(&geometry));
        let row = metrics.row_at_scroll(&geometry, position);
        let offset = metrics.row_position(&geometry, row) - position;
        self.signals.discard_scroll();
        self.signals.cancel_settle();
        let result = self.rebuild(geometry.row_start_index(row), offset);
        self.settle(result);
        Ok(())
    }

    pub fn scroll_by_pixel(&mut self, delta: f64) -> Result<(), ServiceError> {
        if !delta.is_finite() {
            return Err(ServiceError::InvalidPixel { value: delta });
        }
        let current = self.current_window().scroll_position;
        self.scroll_to_pixel(current + delta)
    }

    /// Replaces the list bounds. `None` empties the list.
    pub fn set_list_range(&mut self, range: Option<(i64, i64)>) -> Result<(), ServiceError> {
        match range {
            Some((low, high)) => {
                Self::require_list_bounds(low, high)?;
                self.apply_list_range(low, high);
                Ok(())
            }
            None => {
                self.apply_list_range(0, -1);
                Ok(())
            }
        }
    }

    /// Adds `count` indices before the current low index.
    pub fn prepend_count(&mut self, count: usize) -> Result<(), ServiceError> {
        let count = Self::checked_count(count)?;
        let (low, high) = self.state.list.bounds().unwrap_or((count, count - 1));
        Self::require_list_bounds(low - count, high)?;
        self.apply_list_range(low - count, high);
        Ok(())
    }

    /// Adds `count` indices after the current high index.
    pub fn append_count(&mut self, count: usize) -> Result<(), ServiceError> {
        let count = Self::checked_count(count)?;
        let (low, high) = self.state.list.bounds().unwrap_or((0, -1));
        Self::require_list_bounds(low, high + count)?;
        self.apply_list_range(low, high + count);
        Ok(())
    }

    /// Moves `from_low..=from_high` (a single index when `from_high` is
    /// `None`) so it starts at `to_low`. Returns the indices whose cached
    /// content moved.
    pub fn move_index(
        &mut self,
        to_low: i64,
        from_low: i64,
        from_high: Option<i64>,
    ) -> Result<Vec<i64>, ServiceError> {
        let from_high = from_high.unwrap_or(from_low);
        let (low, high) = self.state.list.bounds().ok_or(ServiceError::EmptyList)?;
        if from_high < from_low {
            return Err(ServiceError::InvalidRange {
                low: from_low,
                high: from_high,
            });
        }
        self.require_in_bounds(from_low)?;
        self.require_in_bounds(from_high)?;
        if to_low < low {
            return Err(ServiceError::IndexOutOfBounds {
                index: to_low,
                low,
                high,
            });
        }
        let to_high = to_low.saturating_add(from_high - from_low);
        if to_high > high {
            return Err(ServiceError::IndexOutOfBounds {
                index: to_high,
                low,
                high,
            });
        }
        let changed = self.state.cache.move_range(to_low, from_low, from_high);
        self.state.failed_indices.clear();
        self.resync_after_mutation();
        Ok(changed)
    }

    /// Opens `index..=range_high` (one index when `range_high` is `None`) and
    /// shifts later content up. `index` may be one past the high index to
    /// append.
    pub fn insert_index(
        &mut self,
        index: i64,
        range_high: Option<i64>,
    ) -> Result<RangeShift, ServiceError> {
        let range_high = range_high.unwrap_or(index);
        let (low, high) = match self.state.list.bounds() {
            Some(bounds) => bounds,
            None if index == 0 => (0, -1),
            None => return Err(ServiceError::EmptyList),
        };
        if index < low || index > high + 1 {
            return Err(ServiceError::IndexOutOfBounds { index, low, high });
        }
        let span = Self::checked_span(index, range_high)?;
        Self::require_list_bounds(low, high + span).map_err(|_| ServiceError::InvalidRange {
            low: index,
            high: range_high,
        })?;
        let shift = self
            .state
            .cache
            .insert_or_remove_range(index, range_high, RangeIncrement::Insert);
        self.state.list.set_range(low, high + span);
        self.state.failed_indices.clear();
        self.state.preloaded = false;
        self.resync_after_mutation();
        self.notify_list_range_change();
        Ok(shift)
    }

    /// Removes `index..=range_high` (one index when `range_high` is `None`)
    /// and shifts later content down.
    pub fn remove_index(
        &mut self,
        index: i64,
        range_high: Option<i64>,
    ) -> Result<RangeShift, ServiceError> {
        let range_high = range_high.unwrap_or(index);
        if range_high < index {
            return Err(ServiceError::InvalidRange {
                low: index,
                high: range_high,
            });
        }
        self.require_in_bounds(index)?;
        self.require_in_bounds(range_high)?;
        let (low, high) = self.state.list.bounds().ok_or(ServiceError::EmptyList)?;
        let span = Self::checked_span(index, range_high)?;
        let shift = self
            .state
            .cache
            .insert_or_remove_range(index, range_high, RangeIncrement::Remove);
        for item_id in &shift.orphaned {
            self.fetches.cancel(*item_id);
        }
        self.state.list.set_range(low, high - span);
        self.state.failed_indices.clear();
        self.resync_after_mutation();
        self.notify_list_range_change();
        Ok(shift)
    }

    /// Drops all cached content and refetches the window.
    pub fn clear_cache(&mut self) {
        self.fetches.clear();
        self.state.cache.clear();
        self.state.failed_indices.clear();
        self.state.preloaded = false;
        let result = self.rebuild_at_anchor();
        self.settle(result);
    }

    /// Refetches every cached index and retries failed ones.
    pub fn reload(&mut self) {
        self.fetches.clear();
        self.state.failed_indices.clear();
        let indices = self.state.cache.cached_indices();
        for &index in &indices {
            self.state.cache.mark_pending(index);
        }
        let mut fetched = self.request_content(indices);
        let window: Vec<i64> = self.state.window.indices().collect();
        fetched += self.request_content(window);
        log::debug!("session {}: reload requested {fetched} fetches", self.id());
    }

    /// Assigns items to new indices. Items displaced from a target index
    /// without a new assignment are dropped from the cache.
    pub fn remap_indexes(
        &mut self,
        changes: &BTreeMap<ItemId, i64>,
    ) -> Result<Vec<i64>, ServiceError> {
        let (low, high) = self.state.list.bounds().ok_or(ServiceError::EmptyList)?;
        let mut targets = HashSet::default();
        for (&item_id, &index) in changes {
            if self.state.cache.get_by_item(item_id).is_none() {
                return Err(ServiceError::InvalidRemap {
                    reason: format!("item {item_id} is not cached"),
                });
            }
            if index < low || index > high {
                return Err(ServiceError::IndexOutOfBounds { index, low, high });
            }
            if !targets.insert(index) {
                return Err(ServiceError::InvalidRemap {
                    reason: format!("index {index} is assigned more than once"),
                });
            }
        }
        let changes: Vec<(ItemId, i64)> = changes.iter().map(|(&id, &index)| (id, index)).collect();
        let changed = self.state.cache.remap_indexes(&changes);
        self.state.failed_indices.clear();
        self.resync_after_mutation();
        Ok(changed)
    }

    /// Switches the scroll axis and rebuilds at the current axis index.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.config.orientation == orientation {
            return;
        }
        self.config.orientation = orientation;
        self.refresh_viewport();
        let axis_index = self
            .anchor()
            .map(|anchor| anchor.reference_index)
            .unwrap_or_else(|| self.state.list.low_index());
        let result = self.rebuild(axis_index, 0.0);
        self.settle(result);
    }

    /// Ordered `index -> item id` map of the whole cache.
    pub fn cache_index_map(&self) -> BTreeMap<i64, ItemId> {
        self.state.cache.index_map()
    }

    /// Ordered `item id -> index` map of the whole cache.
    pub fn cache_item_map(&self) -> BTreeMap<ItemId, i64> {
        self.state.cache.item_map()
    }

    /// Ordered `index -> item id` map of the cradle's cached slots.
    pub fn cradle_index_map(&self) -> BTreeMap<i64, ItemId> {
        self.state
            .window
            .slots()
            .iter()
            .filter_map(|slot| slot.item_id.map(|item_id| (slot.index, item_id)))
            .collect()
    }

    /// Partitions whose members or content changed since the last call.
    /// A host re-renders only these.
    pub fn take_modified_partitions(&mut self) -> Vec<PartitionId> {
        self.state.cache.take_modified_partitions()
    }

    // ─────────────────────────────────────────────────────────────────────

    fn require_started(&self) -> Result<(), ServiceError> {
        if self.is_started() {
            Ok(())
        } else {
            Err(ServiceError::Uninitialized)
        }
    }

    fn require_in_bounds(&self, index: i64) -> Result<(), ServiceError> {
        let (low, high) = self.state.list.bounds().ok_or(ServiceError::EmptyList)?;
        if index < low || index > high {
            return Err(ServiceError::IndexOutOfBounds { index, low, high });
        }
        Ok(())
    }

    /// Rejects bounds outside `[MIN_LIST_INDEX, MAX_LIST_INDEX]` and inverted
    /// ranges.
    fn require_list_bounds(low: i64, high: i64) -> Result<(), ServiceError> {
        if high < low || low < MIN_LIST_INDEX || high > MAX_LIST_INDEX {
            return Err(ServiceError::InvalidRange { low, high });
        }
        Ok(())
    }

    /// Length of `low..=high`, or `InvalidRange` when it is empty or does not
    /// fit the index space.
    fn checked_span(low: i64, high: i64) -> Result<i64, ServiceError> {
        high.checked_sub(low)
            .and_then(|span| span.checked_add(1))
            .filter(|span| *span > 0 && *span <= MAX_LIST_INDEX)
            .ok_or(ServiceError::InvalidRange { low, high })
    }

    fn checked_count(count: usize) -> Result<i64, ServiceError> {
        match i64::try_from(count) {
            Ok(count) if count > 0 && count <= MAX_LIST_INDEX => Ok(count),
            _ => Err(ServiceError::InvalidCount { count }),
        }
    }

    fn apply_list_range(&mut self, low: i64, high: i64) {
        if self.state.list.bounds() == Some((low, high)) {
            return;
        }
        self.state.list.set_range(low, high);
        let outside: Vec<i64> = self
            .state
            .cache
            .cached_indices()
            .into_iter()
            .filter(|&index| !self.state.list.contains(index))
            .collect();
        for index in outside {
            self.state.cache.remove_index(index);
        }
        let cache = &self.state.cache;
        self.fetches.retain(|item_id| cache.is_wanted(item_id));
        self.state.failed_indices.clear();
        self.state.preloaded = false;
        let result = self.rebuild_at_anchor();
        self.settle(result);
        self.notify_list_range_change();
    }

    /// Rebuilds at the current anchor, then drops orphaned entries.
    fn resync_after_mutation(&mut self) {
        let result = self.rebuild_at_anchor();
        self.settle(result);
        let orphans = self.state.cache.delete_orphans();
        if !orphans.is_empty() {
            log::debug!(
                "session {}: deleted {} orphaned entries",
                self.id(),
                orphans.len()
            );
        }
    }
}
