//! Index-space mutations of the cache: block moves, insertion, removal and
//! explicit reassignment.
//!
//! Arguments are validated by the service layer before they reach these
//! methods. Every method leaves the index/item bijection intact.

use super::entry::ItemId;
use super::sparse_cache::SparseCache;
use crate::collections::map::HashSet;

/// Direction of an [`SparseCache::insert_or_remove_range`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeIncrement {
    Insert,
    Remove,
}

/// Outcome of an insertion or removal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeShift {
    /// New indices of entries that were shifted.
    pub shifted: Vec<i64>,
    /// Indices whose entries were removed.
    pub removed: Vec<i64>,
    /// Positions inside the affected range that held content before the
    /// change and hold none afterwards. Bounded by the cache size, not by the
    /// range length.
    pub to_replace: Vec<i64>,
    /// Items detached by the removal, awaiting [`SparseCache::delete_orphans`].
    pub orphaned: Vec<ItemId>,
}

impl<C> SparseCache<C> {
    /// Moves the block `from_low..=from_high` so that it starts at `to_low`.
    ///
    /// The block it lands on is displaced toward the vacated positions.
    /// Returns the new indices of every cached entry that changed position.
    pub fn move_range(&mut self, to_low: i64, from_low: i64, from_high: i64) -> Vec<i64> {
        if to_low == from_low || from_high < from_low {
            return Vec::new();
        }
        let span = from_high - from_low + 1;
        let offset = to_low - from_low;
        let mut moves = Vec::new();
        let cached = self.cached_indices();

        for &index in &cached {
            let new_index = if (from_low..=from_high).contains(&index) {
                index + offset
            } else if offset > 0 && index > from_high && index <= from_high + offset {
                index - span
            } else if offset < 0 && index >= to_low && index < from_low {
                index + span
            } else {
                continue;
            };
            moves.push((index, new_index));
        }
        let changed = self.rekey(&moves);
        log::debug!(
            "moved [{from_low}, {from_high}] to {to_low}: {} entries repositioned",
            changed.len()
        );
        changed
    }

    /// Opens (`Insert`) or closes (`Remove`) the index range `low..=high`.
    ///
    /// Insertion shifts every cached index `>= low` up by the range length.
    /// Removal orphans the entries inside the range and shifts every cached
    /// index `> high` down.
    pub fn insert_or_remove_range(
        &mut self,
        low: i64,
        high: i64,
        increment: RangeIncrement,
    ) -> RangeShift {
        if high < low {
            return RangeShift::default();
        }
        let span = high - low + 1;
        let cached = self.cached_indices();
        let mut shift = RangeShift::default();

        let moves: Vec<(i64, i64)> = match increment {
            RangeIncrement::Insert => cached
                .iter()
                .filter(|&&index| index >= low)
                .map(|&index| (index, index + span))
                .collect(),
            RangeIncrement::Remove => {
                for &index in cached.iter().filter(|&&index| (low..=high).contains(&index)) {
                    if let Some(item_id) = self.orphan_index(index) {
                        shift.removed.push(index);
                        shift.orphaned.push(item_id);
                    }
                }
                cached
                    .iter()
                    .filter(|&&index| index > high)
                    .map(|&index| (index, index - span))
                    .collect()
            }
        };
        shift.shifted = self.rekey(&moves);
        shift.to_replace = cached
            .iter()
            .copied()
            .filter(|index| (low..=high).contains(index) && !self.contains_index(*index))
            .collect();
        log::debug!(
            "{increment:?} [{low}, {high}]: {} shifted, {} removed",
            shift.shifted.len(),
            shift.removed.len()
        );
        shift
    }

    /// Reassigns items to new indices.
    ///
    /// Each item id must be live and each target index must appear once. An
    /// item already at a target index that is not itself reassigned becomes
    /// an orphan. Returns every index whose mapping changed.
    pub fn remap_indexes(&mut self, changes: &[(ItemId, i64)]) -> Vec<i64> {
        let moving: HashSet<ItemId> = changes.iter().map(|(item_id, _)| *item_id).collect();
        let mut touched: HashSet<i64> = HashSet::default();

        for &(_, target) in changes {
            if let Some(occupant) = self.item_id_at(target) {
                if !moving.contains(&occupant) {
                    self.orphan_index(target);
                    touched.insert(target);
                }
            }
        }

        let moves: Vec<(i64, i64)> = changes
            .iter()
            .filter_map(|&(item_id, target)| {
                self.get_by_item(item_id)
                    .map(|entry| (entry.logical_index, target))
            })
            .filter(|(old, new)| old != new)
            .collect();
        for &(old, _) in &moves {
            touched.insert(old);
        }
        for new in self.rekey(&moves) {
            touched.insert(new);
        }

        let mut changed: Vec<i64> = touched.into_iter().collect();
        changed.sort_unstable();
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::super::sparse_cache::test_support::filled;
    use super::*;

    #[test]
    fn test_move_range_forward_reports_whole_span() {
        let mut cache = filled(0..=99);
        let moved_ids: Vec<_> = (10..=14).map(|i| cache.item_id_at(i).unwrap()).collect();
        let displaced = cache.item_id_at(15).unwrap();

        let changed = cache.move_range(50, 10, 14);

        assert_eq!(changed, (10..=54).collect::<Vec<_>>());
        let landed: Vec<_> = (50..=54).map(|i| cache.item_id_at(i).unwrap()).collect();
        assert_eq!(landed, moved_ids);
        assert_eq!(cache.item_id_at(10), Some(displaced));
        assert_eq!(cache.len(), 100);
        cache.verify_bijection().unwrap();
    }

    #[test]
    fn test_move_range_backward_displaces_up() {
        let mut cache = filled(0..=19);
        let moved = cache.item_id_at(15).unwrap();
        let displaced = cache.item_id_at(5).unwrap();

        let changed = cache.move_range(5, 15, 16);

        assert_eq!(changed, (5..=16).collect::<Vec<_>>());
        assert_eq!(cache.item_id_at(5), Some(moved));
        assert_eq!(cache.item_id_at(7), Some(displaced));
        cache.verify_bijection().unwrap();
    }

    #[test]
    fn test_move_range_skips_uncached_positions() {
        let mut cache = filled(0..=9);
        cache.remove_index(4);
        let changed = cache.move_range(6, 2, 3);
        // 2,3 -> 6,7; 5 -> 3 (4 is a hole); 6,7 -> 4,5.
        assert_eq!(changed, vec![3, 4, 5, 6, 7]);
        assert!(!cache.contains_index(2));
        cache.verify_bijection().unwrap();
    }

    #[test]
    fn test_insert_then_remove_restores_map() {
        let mut cache = filled(-5..=20);
        let before = cache.index_map();

        let inserted = cache.insert_or_remove_range(3, 6, RangeIncrement::Insert);
        assert_eq!(inserted.to_replace, vec![3, 4, 5, 6]);
        assert!(inserted.removed.is_empty());
        assert_eq!(inserted.shifted, (7..=24).collect::<Vec<_>>());

        let removed = cache.insert_or_remove_range(3, 6, RangeIncrement::Remove);
        assert!(removed.removed.is_empty());
        assert!(removed.orphaned.is_empty());
        assert_eq!(cache.index_map(), before);
        cache.verify_bijection().unwrap();
    }

    #[test]
    fn test_huge_insert_only_touches_cached_entries() {
        let mut cache = filled(0..=9);
        let high = crate::list_model::MAX_LIST_INDEX;
        let shift = cache.insert_or_remove_range(4, high - 20, RangeIncrement::Insert);
        assert_eq!(shift.to_replace, vec![4, 5, 6, 7, 8, 9]);
        assert_eq!(shift.shifted.len(), 6);
        assert_eq!(cache.item_id_at(4), None);
        assert!(cache.contains_index(high - 16));
        cache.verify_bijection().unwrap();
    }

    #[test]
    fn test_remove_orphans_range_and_shifts_tail() {
        let mut cache = filled(0..=9);
        let survivor = cache.item_id_at(8).unwrap();
        let shift = cache.insert_or_remove_range(2, 4, RangeIncrement::Remove);

        assert_eq!(shift.removed, vec![2, 3, 4]);
        assert_eq!(shift.orphaned.len(), 3);
        assert_eq!(shift.shifted, vec![2, 3, 4, 5, 6]);
        assert!(shift.to_replace.is_empty());
        assert_eq!(cache.item_id_at(5), Some(survivor));
        assert_eq!(cache.len(), 7);
        assert_eq!(cache.orphan_count(), 3);
        assert_eq!(cache.delete_orphans().len(), 3);
        cache.verify_bijection().unwrap();
    }

    #[test]
    fn test_remap_swaps_and_orphans_occupant() {
        let mut cache = filled(0..=4);
        let a = cache.item_id_at(0).unwrap();
        let b = cache.item_id_at(1).unwrap();
        let occupant = cache.item_id_at(4).unwrap();

        let changed = cache.remap_indexes(&[(a, 1), (b, 4)]);

        assert_eq!(changed, vec![0, 1, 4]);
        assert_eq!(cache.item_id_at(1), Some(a));
        assert_eq!(cache.item_id_at(4), Some(b));
        assert_eq!(cache.item_id_at(0), None);
        assert!(cache.get_by_item(occupant).is_none());
        assert_eq!(cache.orphan_count(), 1);
        cache.verify_bijection().unwrap();
    }
}
