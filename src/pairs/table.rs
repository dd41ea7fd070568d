//! Fixed-size table of pair slots

use super::slot::{PairId, Slot};

/// Storage for every pair id of a session, index = pair id.
///
/// Slot 0 is the sentinel and is created in `Kept` mode; all other slots
/// start out free.
#[derive(Debug)]
pub struct SlotTable {
    slots: Box<[Slot]>,
}

impl SlotTable {
    /// Create a table with `capacity` slots, sentinel included.
    ///
    /// Capacity is validated by the caller (see `PairAllocator::new`).
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|n| {
                if n == 0 {
                    Slot::sentinel()
                } else {
                    Slot::new(PairId(n as u16))
                }
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether `id` may be the target of a reservation or release.
    ///
    /// The sentinel is never a valid target.
    pub fn is_valid(&self, id: PairId) -> bool {
        id.index() > 0 && id.index() < self.slots.len()
    }

    /// Get a slot, including the sentinel
    pub fn get(&self, id: PairId) -> Option<&Slot> {
        self.slots.get(id.index())
    }

    /// Index access for ids already known to be in range.
    pub(crate) fn slot(&self, id: PairId) -> &Slot {
        &self.slots[id.index()]
    }

    pub(crate) fn slot_mut(&mut self, id: PairId) -> &mut Slot {
        &mut self.slots[id.index()]
    }

    /// Iterate over every slot with its id
    pub fn iter(&self) -> impl Iterator<Item = (PairId, &Slot)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(n, slot)| (PairId(n as u16), slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pairs::slot::SlotMode;

    #[test]
    fn test_table_layout() {
        let table = SlotTable::new(4);
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.slot(PairId(0)).mode, SlotMode::Kept);
        assert!(table.iter().skip(1).all(|(_, s)| s.mode.is_free()));
    }

    #[test]
    fn test_valid_range() {
        let table = SlotTable::new(4);
        assert!(!table.is_valid(PairId(0)));
        assert!(table.is_valid(PairId(1)));
        assert!(table.is_valid(PairId(3)));
        assert!(!table.is_valid(PairId(4)));
        assert!(table.get(PairId(4)).is_none());
        assert!(table.get(PairId(0)).is_some());
    }
}
