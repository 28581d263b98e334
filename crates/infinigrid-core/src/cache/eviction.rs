//! Cache paring against the cradle's required index set.

use super::sparse_cache::SparseCache;
use crate::collections::map::HashSet;

/// Entries removed by one eviction pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Eviction {
    pub head: Vec<i64>,
    pub tail: Vec<i64>,
}

impl Eviction {
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.tail.is_empty()
    }

    /// All evicted indices in ascending order.
    pub fn indices(&self) -> Vec<i64> {
        let mut indices = Vec::with_capacity(self.len());
        indices.extend_from_slice(&self.head);
        indices.extend_from_slice(&self.tail);
        indices.sort_unstable();
        indices
    }
}

impl<C> SparseCache<C> {
    /// Removes every entry whose index is not in `required`.
    ///
    /// Pending entries are removed as well; their in-flight fetches resolve
    /// against a missing entry and are discarded.
    pub fn evict_to_match(&mut self, required: &HashSet<i64>) -> Vec<i64> {
        let mut evicted: Vec<i64> = self
            .index_to_item_id
            .keys()
            .copied()
            .filter(|index| !required.contains(index))
            .collect();
        evicted.sort_unstable();
        for &index in &evicted {
            self.remove_index(index);
        }
        if !evicted.is_empty() {
            log::debug!("evicted {} entries outside the cradle", evicted.len());
        }
        evicted
    }

    /// Pares the cache down to `max(required.len(), cache_max)` entries.
    ///
    /// `required` is the ascending, contiguous cradle index list. Eviction
    /// takes entries farthest from the cradle first, splitting the pare count
    /// between the room before the cradle (head) and after it (tail) in
    /// proportion to how many cached entries each side holds.
    pub fn evict_to_max(&mut self, cache_max: usize, required: &[i64]) -> Eviction {
        let total = self.entries.len();
        let target = required.len().max(cache_max);
        if total <= target {
            return Eviction::default();
        }
        let parecount = total - target;

        let cached = self.cached_indices();
        let (low, high) = match (required.first(), required.last()) {
            (Some(&low), Some(&high)) => (low, high),
            // No cradle: everything counts as head room.
            _ => (i64::MAX, i64::MAX),
        };
        let headroom = cached.partition_point(|&index| index < low);
        let tailroom = cached.len() - cached.partition_point(|&index| index <= high);
        let pareroom = headroom + tailroom;
        if pareroom == 0 {
            return Eviction::default();
        }

        let head_count = (parecount * headroom / pareroom).min(headroom);
        let tail_count = (parecount - head_count).min(tailroom);

        let head: Vec<i64> = cached[..head_count].to_vec();
        let tail: Vec<i64> = cached[cached.len() - tail_count..].to_vec();
        for &index in head.iter().chain(tail.iter()) {
            self.remove_index(index);
        }
        log::debug!(
            "pared cache from {total} to {} (head {}, tail {})",
            self.entries.len(),
            head.len(),
            tail.len()
        );
        Eviction { head, tail }
    }
}

#[cfg(test)]
mod tests {
    use super::super::sparse_cache::test_support::filled;
    use super::*;

    #[test]
    fn test_evict_to_max_splits_by_room() {
        let mut cache = filled(0..=79);
        let required: Vec<i64> = (40..=60).collect();
        let eviction = cache.evict_to_max(50, &required);

        // 80 - max(21, 50) = 30; head room 40, tail room 19.
        assert_eq!(eviction.len(), 30);
        assert_eq!(eviction.head, (0..20).collect::<Vec<_>>());
        assert_eq!(eviction.tail, (70..80).collect::<Vec<_>>());
        assert_eq!(cache.len(), 50);
        for index in 40..=60 {
            assert!(cache.contains_index(index));
        }
        cache.verify_bijection().unwrap();
    }

    #[test]
    fn test_evict_to_max_under_cap_is_noop() {
        let mut cache = filled(0..=9);
        let required: Vec<i64> = (0..=4).collect();
        assert!(cache.evict_to_max(20, &required).is_empty());
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_evict_to_max_without_room_is_noop() {
        let mut cache = filled(10..=19);
        let required: Vec<i64> = (10..=19).collect();
        assert!(cache.evict_to_max(0, &required).is_empty());
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_evict_to_max_counts_pending_entries() {
        let mut cache = filled(0..=9);
        for index in 10..=14 {
            cache.create_entry(index, super::super::CellContent::Pending);
        }
        let required: Vec<i64> = (0..=4).collect();
        let eviction = cache.evict_to_max(10, &required);
        assert_eq!(eviction.head, Vec::<i64>::new());
        assert_eq!(eviction.tail, (10..=14).collect::<Vec<_>>());
    }

    #[test]
    fn test_evict_to_match_is_idempotent() {
        let mut cache = filled(0..=30);
        let required: HashSet<i64> = (10..=20).collect();
        let evicted = cache.evict_to_match(&required);
        assert_eq!(evicted.len(), 20);
        let snapshot = cache.index_map();
        assert!(cache.evict_to_match(&required).is_empty());
        assert_eq!(cache.index_map(), snapshot);
    }
}
