use std::fmt;

/// Stable surrogate key of a cached item.
///
/// An item keeps its id while its logical index moves; ids are never reused
/// within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) u64);

impl ItemId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionId(pub(crate) u32);

impl PartitionId {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Content slot of a cache entry.
#[derive(Clone, Debug, PartialEq)]
pub enum CellContent<C> {
    /// A fetch for this entry is in flight.
    Pending,
    Ready(C),
}

impl<C> CellContent<C> {
    pub fn is_pending(&self) -> bool {
        matches!(self, CellContent::Pending)
    }

    pub fn ready(&self) -> Option<&C> {
        match self {
            CellContent::Ready(content) => Some(content),
            CellContent::Pending => None,
        }
    }
}

/// One cached item.
#[derive(Clone, Debug)]
pub struct CacheEntry<C> {
    pub item_id: ItemId,
    pub logical_index: i64,
    pub partition_id: PartitionId,
    pub content: CellContent<C>,
}

impl<C> CacheEntry<C> {
    pub fn is_pending(&self) -> bool {
        self.content.is_pending()
    }
}
