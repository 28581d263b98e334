use std::collections::BTreeMap;

use super::entry::{CacheEntry, CellContent, ItemId, PartitionId};
use super::partition::{CachePartition, PartitionPool};
use crate::collections::map::HashMap;
use crate::error::EngineError;

/// Lifecycle of a cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheState {
    #[default]
    Uninitialized,
    Populated,
    /// Entries were orphaned by a list mutation and await deletion.
    PartialRebuild,
}

/// Sparse, partitioned map from logical index to cached content.
///
/// `index_to_item_id` is a bijection with the `logical_index` fields of the
/// live entries. Orphans are entries that lost their index in a list
/// mutation; they keep their partition slot until [`SparseCache::delete_orphans`]
/// runs so the render surface can drop them in the same pass that shows the
/// new window.
#[derive(Debug)]
pub struct SparseCache<C> {
    pub(super) entries: HashMap<ItemId, CacheEntry<C>>,
    pub(super) index_to_item_id: HashMap<i64, ItemId>,
    pub(super) orphans: HashMap<ItemId, CacheEntry<C>>,
    pub(super) partitions: PartitionPool,
    next_item_id: u64,
    state: CacheState,
}

impl<C> Default for SparseCache<C> {
    fn default() -> Self {
        Self {
            entries: HashMap::default(),
            index_to_item_id: HashMap::default(),
            orphans: HashMap::default(),
            partitions: PartitionPool::new(),
            next_item_id: 0,
            state: CacheState::Uninitialized,
        }
    }
}

impl<C> SparseCache<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Number of live entries, pending ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.is_pending()).count()
    }

    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    pub fn contains_index(&self, index: i64) -> bool {
        self.index_to_item_id.contains_key(&index)
    }

    pub fn item_id_at(&self, index: i64) -> Option<ItemId> {
        self.index_to_item_id.get(&index).copied()
    }

    pub fn get(&self, index: i64) -> Option<&CacheEntry<C>> {
        self.index_to_item_id
            .get(&index)
            .and_then(|item_id| self.entries.get(item_id))
    }

    pub fn get_by_item(&self, item_id: ItemId) -> Option<&CacheEntry<C>> {
        self.entries.get(&item_id)
    }

    pub fn content(&self, index: i64) -> Option<&C> {
        self.get(index).and_then(|entry| entry.content.ready())
    }

    /// Returns the entry's id, creating an entry with `content` if `index`
    /// is not cached yet. An existing entry is left untouched.
    pub fn create_entry(&mut self, index: i64, content: CellContent<C>) -> ItemId {
        if let Some(&item_id) = self.index_to_item_id.get(&index) {
            return item_id;
        }
        let item_id = ItemId(self.next_item_id);
        self.next_item_id += 1;
        let partition_id = self.partitions.allocate(item_id);
        self.entries.insert(
            item_id,
            CacheEntry {
                item_id,
                logical_index: index,
                partition_id,
                content,
            },
        );
        self.index_to_item_id.insert(index, item_id);
        if self.state == CacheState::Uninitialized {
            self.state = CacheState::Populated;
        }
        item_id
    }

    /// Stores fetched content for a pending entry.
    ///
    /// Returns the entry's current logical index, or `None` when the item is
    /// no longer wanted (evicted, orphaned or already fulfilled).
    pub fn fulfill(&mut self, item_id: ItemId, content: C) -> Option<i64> {
        let entry = self.entries.get_mut(&item_id)?;
        if !entry.is_pending() {
            return None;
        }
        entry.content = CellContent::Ready(content);
        self.partitions.touch(entry.partition_id);
        Some(entry.logical_index)
    }

    /// True if `item_id` is live and still waiting for content.
    pub fn is_wanted(&self, item_id: ItemId) -> bool {
        self.entries
            .get(&item_id)
            .is_some_and(|entry| entry.is_pending())
    }

    /// Puts an entry back into the pending state so it is fetched again.
    pub fn mark_pending(&mut self, index: i64) -> Option<ItemId> {
        let item_id = *self.index_to_item_id.get(&index)?;
        let entry = self.entries.get_mut(&item_id)?;
        entry.content = CellContent::Pending;
        self.partitions.touch(entry.partition_id);
        Some(item_id)
    }

    /// Removes the entry at `index` outright.
    pub fn remove_index(&mut self, index: i64) -> Option<CacheEntry<C>> {
        let item_id = self.index_to_item_id.remove(&index)?;
        let entry = self.entries.remove(&item_id)?;
        self.partitions.release(item_id, entry.partition_id);
        Some(entry)
    }

    pub fn remove_item(&mut self, item_id: ItemId) -> Option<CacheEntry<C>> {
        let entry = self.entries.remove(&item_id)?;
        self.index_to_item_id.remove(&entry.logical_index);
        self.partitions.release(item_id, entry.partition_id);
        Some(entry)
    }

    /// Detaches the entry at `index` from the index map and parks it as an
    /// orphan.
    pub(super) fn orphan_index(&mut self, index: i64) -> Option<ItemId> {
        let item_id = self.index_to_item_id.remove(&index)?;
        let entry = self.entries.remove(&item_id)?;
        self.orphans.insert(item_id, entry);
        self.state = CacheState::PartialRebuild;
        Some(item_id)
    }

    /// Deletes every orphan and releases its partition slot.
    pub fn delete_orphans(&mut self) -> Vec<ItemId> {
        let mut deleted: Vec<ItemId> = Vec::with_capacity(self.orphans.len());
        for (item_id, entry) in self.orphans.drain() {
            self.partitions.release(item_id, entry.partition_id);
            deleted.push(item_id);
        }
        deleted.sort_unstable();
        if self.state == CacheState::PartialRebuild {
            self.state = CacheState::Populated;
        }
        deleted
    }

    /// Moves the entries at the given old indices to new indices in one step.
    ///
    /// Every old index must be cached and the resulting index set must be
    /// collision free; the caller guarantees both. Returns the new indices.
    pub(super) fn rekey(&mut self, moves: &[(i64, i64)]) -> Vec<i64> {
        let detached: Vec<(ItemId, i64)> = moves
            .iter()
            .filter_map(|&(old, new)| self.index_to_item_id.remove(&old).map(|id| (id, new)))
            .collect();
        let mut changed = Vec::with_capacity(detached.len());
        for (item_id, new_index) in detached {
            if let Some(entry) = self.entries.get_mut(&item_id) {
                entry.logical_index = new_index;
                self.partitions.touch(entry.partition_id);
            }
            self.index_to_item_id.insert(new_index, item_id);
            changed.push(new_index);
        }
        changed.sort_unstable();
        changed
    }

    /// Cached indices in ascending order.
    pub fn cached_indices(&self) -> Vec<i64> {
        let mut indices: Vec<i64> = self.index_to_item_id.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Ordered `index -> item id` view of the cache.
    pub fn index_map(&self) -> BTreeMap<i64, ItemId> {
        self.index_to_item_id
            .iter()
            .map(|(&index, &item_id)| (index, item_id))
            .collect()
    }

    /// Ordered `item id -> index` view of the cache.
    pub fn item_map(&self) -> BTreeMap<ItemId, i64> {
        self.entries
            .iter()
            .map(|(&item_id, entry)| (item_id, entry.logical_index))
            .collect()
    }

    pub fn partitions(&self) -> &[CachePartition] {
        self.partitions.partitions()
    }

    pub fn partition(&self, partition_id: PartitionId) -> Option<&CachePartition> {
        self.partitions.get(partition_id)
    }

    pub fn take_modified_partitions(&mut self) -> Vec<PartitionId> {
        self.partitions.take_modified()
    }

    /// Drops every entry and orphan. Partitions are drained, not removed.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index_to_item_id.clear();
        self.orphans.clear();
        self.partitions.drain_all();
        self.state = CacheState::Uninitialized;
    }

    /// Checks that the index map and the entries agree in both directions.
    pub fn verify_bijection(&self) -> Result<(), EngineError> {
        for (&index, &item_id) in &self.index_to_item_id {
            match self.entries.get(&item_id) {
                Some(entry) if entry.logical_index == index => {}
                _ => return Err(EngineError::CacheBijectionLost { index, item_id }),
            }
        }
        for (&item_id, entry) in &self.entries {
            if self.index_to_item_id.get(&entry.logical_index) != Some(&item_id) {
                return Err(EngineError::CacheBijectionLost {
                    index: entry.logical_index,
                    item_id,
                });
            }
        }
        Ok(())
    }
}
