//! Fixed-capacity buckets that group cache entries for incremental rendering.
//!
//! Partitions are append-only: once created they are drained but never
//! removed, so a [`PartitionId`] stays valid for the lifetime of the pool.

use super::entry::{ItemId, PartitionId};
use crate::collections::map::HashSet;

/// Number of entries a single partition can hold.
pub const CACHE_PARTITION_SIZE: usize = 30;

#[derive(Debug)]
pub struct CachePartition {
    id: PartitionId,
    items: HashSet<ItemId>,
}

impl CachePartition {
    fn new(id: PartitionId) -> Self {
        Self {
            id,
            items: HashSet::default(),
        }
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_room(&self) -> bool {
        self.items.len() < CACHE_PARTITION_SIZE
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.items.contains(&item_id)
    }

    /// Items currently held, in ascending id order.
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.items.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Debug, Default)]
pub struct PartitionPool {
    partitions: Vec<CachePartition>,
    current: usize,
    modified: HashSet<PartitionId>,
}

impl PartitionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `item_id` in the current partition if it has room, otherwise in
    /// the first partition with room, otherwise in a new one.
    pub fn allocate(&mut self, item_id: ItemId) -> PartitionId {
        let slot = if self
            .partitions
            .get(self.current)
            .is_some_and(CachePartition::has_room)
        {
            self.current
        } else if let Some(position) = self.partitions.iter().position(CachePartition::has_room) {
            position
        } else {
            let id = PartitionId(self.partitions.len() as u32);
            self.partitions.push(CachePartition::new(id));
            self.partitions.len() - 1
        };
        self.current = slot;
        let partition = &mut self.partitions[slot];
        partition.items.insert(item_id);
        self.modified.insert(partition.id);
        partition.id
    }

    pub fn release(&mut self, item_id: ItemId, partition_id: PartitionId) {
        if let Some(partition) = self.partitions.get_mut(partition_id.0 as usize) {
            if partition.items.remove(&item_id) {
                self.modified.insert(partition_id);
            }
        }
    }

    /// Marks a partition for re-render without changing its membership.
    pub fn touch(&mut self, partition_id: PartitionId) {
        self.modified.insert(partition_id);
    }

    pub fn get(&self, partition_id: PartitionId) -> Option<&CachePartition> {
        self.partitions.get(partition_id.0 as usize)
    }

    pub fn partitions(&self) -> &[CachePartition] {
        &self.partitions
    }

    pub fn current(&self) -> Option<PartitionId> {
        self.partitions.get(self.current).map(CachePartition::id)
    }

    /// Returns and clears the set of partitions changed since the last call.
    pub fn take_modified(&mut self) -> Vec<PartitionId> {
        let mut ids: Vec<PartitionId> = self.modified.drain().collect();
        ids.sort_unstable();
        ids
    }

    /// Drains every partition and resets the allocation pointer.
    pub fn drain_all(&mut self) {
        for partition in &mut self.partitions {
            if !partition.items.is_empty() {
                partition.items.clear();
                self.modified.insert(partition.id);
            }
        }
        self.current = 0;
    }
}
