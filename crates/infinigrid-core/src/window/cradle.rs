//! The materialized cradle: a contiguous run of cell slots split at the axis.
//!
//! Scroll updates patch the window at its ends with
//! [`CradleWindow::apply_shift`]; rebuilds replace it wholesale.

use crate::cache::ItemId;
use crate::error::EngineError;

/// One materialized cell of the cradle.
///
/// `item_id` is `None` while the index has no cache entry, e.g. after a
/// failed fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellSlot {
    pub index: i64,
    pub item_id: Option<ItemId>,
}

/// Indices entering and leaving the cradle in one update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WindowDelta {
    pub added: Vec<i64>,
    pub dropped: Vec<i64>,
}

/// The ordered set of cells currently materialized.
///
/// Slots are contiguous and strictly ascending. The head holds the rows
/// before the axis; the tail starts at the axis reference index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CradleWindow {
    slots: Vec<CellSlot>,
    axis_position: usize,
}

impl CradleWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the window `first..first + count` with the tail starting at
    /// `axis_index`.
    pub fn build(
        first: i64,
        count: usize,
        axis_index: i64,
        mut resolve: impl FnMut(i64) -> Option<ItemId>,
    ) -> Self {
        let slots = (first..first + count as i64)
            .map(|index| CellSlot {
                index,
                item_id: resolve(index),
            })
            .collect();
        let mut window = Self {
            slots,
            axis_position: 0,
        };
        window.set_axis(axis_index);
        window
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[CellSlot] {
        &self.slots
    }

    pub fn head(&self) -> &[CellSlot] {
        &self.slots[..self.axis_position]
    }

    pub fn tail(&self) -> &[CellSlot] {
        &self.slots[self.axis_position..]
    }

    pub fn first_index(&self) -> Option<i64> {
        self.slots.first().map(|slot| slot.index)
    }

    pub fn last_index(&self) -> Option<i64> {
        self.slots.last().map(|slot| slot.index)
    }

    /// First index of the tail, if the tail is non-empty.
    pub fn axis_index(&self) -> Option<i64> {
        self.slots.get(self.axis_position).map(|slot| slot.index)
    }

    pub fn contains(&self, index: i64) -> bool {
        match (self.first_index(), self.last_index()) {
            (Some(first), Some(last)) => index >= first && index <= last,
            _ => false,
        }
    }

    pub fn indices(&self) -> impl Iterator<Item = i64> + '_ {
        self.slots.iter().map(|slot| slot.index)
    }

    pub fn slot(&self, index: i64) -> Option<&CellSlot> {
        let first = self.first_index()?;
        let offset = usize::try_from(index - first).ok()?;
        self.slots.get(offset)
    }

    pub fn set_item_id(&mut self, index: i64, item_id: Option<ItemId>) -> bool {
        let Some(first) = self.first_index() else {
            return false;
        };
        let Ok(offset) = usize::try_from(index - first) else {
            return false;
        };
        match self.slots.get_mut(offset) {
            Some(slot) => {
                slot.item_id = item_id;
                true
            }
            None => false,
        }
    }

    /// Re-reads every slot's item id.
    pub fn refresh_item_ids(&mut self, mut resolve: impl FnMut(i64) -> Option<ItemId>) {
        for slot in &mut self.slots {
            slot.item_id = resolve(slot.index);
        }
    }

    /// Moves the head/tail split so the tail starts at `axis_index`.
    pub fn set_axis(&mut self, axis_index: i64) {
        self.axis_position = match self.first_index() {
            Some(first) => (axis_index - first).clamp(0, self.slots.len() as i64) as usize,
            None => 0,
        };
    }

    /// Patches the window to cover `new_first..=new_last`, dropping slots at
    /// one end and adding at the other.
    pub fn apply_shift(
        &mut self,
        new_first: i64,
        new_last: i64,
        axis_index: i64,
        mut resolve: impl FnMut(i64) -> Option<ItemId>,
    ) -> WindowDelta {
        let mut delta = WindowDelta::default();
        let bounds = self.first_index().zip(self.last_index());
        let disjoint = match bounds {
            Some((first, last)) => new_first > last || new_last < first,
            None => true,
        };
        if disjoint || new_last < new_first {
            delta.dropped = self.indices().collect();
            let count = (new_last - new_first + 1).max(0) as usize;
            *self = Self::build(new_first, count, axis_index, &mut resolve);
            delta.added = self.indices().collect();
            return delta;
        }
        let Some((old_first, old_last)) = bounds else {
            return delta;
        };

        if new_first > old_first {
            let drop = (new_first - old_first) as usize;
            delta
                .dropped
                .extend(self.slots.drain(..drop).map(|slot| slot.index));
        } else if new_first < old_first {
            let prefix: Vec<CellSlot> = (new_first..old_first)
                .map(|index| CellSlot {
                    index,
                    item_id: resolve(index),
                })
                .collect();
            delta.added.extend(prefix.iter().map(|slot| slot.index));
            self.slots.splice(0..0, prefix);
        }

        if new_last < old_last {
            let keep = self.slots.len() - (old_last - new_last) as usize;
            delta
                .dropped
                .extend(self.slots.drain(keep..).map(|slot| slot.index));
        } else if new_last > old_last {
            for index in old_last + 1..=new_last {
                self.slots.push(CellSlot {
                    index,
                    item_id: resolve(index),
                });
                delta.added.push(index);
            }
        }

        self.set_axis(axis_index);
        delta.added.sort_unstable();
        delta.dropped.sort_unstable();
        delta
    }

    /// Drops every slot beyond `high_index`.
    pub fn truncate_after(&mut self, high_index: i64) -> Vec<i64> {
        let keep = self.slots.partition_point(|slot| slot.index <= high_index);
        let axis = self.axis_index();
        let dropped = self.slots.drain(keep..).map(|slot| slot.index).collect();
        self.axis_position = self.axis_position.min(self.slots.len());
        if let Some(axis) = axis {
            self.set_axis(axis);
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.axis_position = 0;
    }

    /// Checks that slot indices increase by exactly one.
    pub fn verify_contiguous(&self) -> Result<(), EngineError> {
        for pair in self.slots.windows(2) {
            let expected = pair[0].index + 1;
            if pair[1].index != expected {
                return Err(EngineError::NonContiguousWindow {
                    expected,
                    found: pair[1].index,
                });
            }
        }
        Ok(())
    }
}
