//! Reverse lookup from colors to the pair holding them

use super::slot::{ColorKey, PairId};
use std::collections::BTreeSet;

/// Ordered index of occupied slots by color key.
///
/// Entries are `(key, pair)` so that two pairs explicitly set to the same
/// colors keep one entry each. A lookup returns the lowest-numbered pair
/// holding the key.
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: BTreeSet<(ColorKey, PairId)>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a pair currently mapped to `key`
    pub fn find(&self, key: ColorKey) -> Option<PairId> {
        self.entries
            .range((key, PairId(0))..=(key, PairId(u16::MAX)))
            .next()
            .map(|&(_, pair)| pair)
    }

    /// Record that `pair` now holds `key`.
    ///
    /// Returns false if that exact entry was already present.
    pub fn insert(&mut self, key: ColorKey, pair: PairId) -> bool {
        self.entries.insert((key, pair))
    }

    /// Forget that `pair` holds `key`. Returns whether an entry was removed.
    pub fn delete(&mut self, key: ColorKey, pair: PairId) -> bool {
        self.entries.remove(&(key, pair))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the exact entry exists
    pub fn contains(&self, key: ColorKey, pair: PairId) -> bool {
        self.entries.contains(&(key, pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_insert_delete() {
        let mut index = KeyIndex::new();
        let key = ColorKey::new(1, 2);

        assert_eq!(index.find(key), None);
        assert!(index.insert(key, PairId(5)));
        assert_eq!(index.find(key), Some(PairId(5)));
        assert_eq!(index.find(ColorKey::new(2, 1)), None);

        assert!(index.delete(key, PairId(5)));
        assert_eq!(index.find(key), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_delete_only_own_entry() {
        let mut index = KeyIndex::new();
        let key = ColorKey::new(3, 4);
        index.insert(key, PairId(2));
        index.insert(key, PairId(7));
        assert_eq!(index.len(), 2);

        // Lowest holder wins the lookup
        assert_eq!(index.find(key), Some(PairId(2)));

        // Removing pair 2 leaves pair 7 findable
        assert!(index.delete(key, PairId(2)));
        assert!(!index.delete(key, PairId(2)));
        assert_eq!(index.find(key), Some(PairId(7)));
    }

    #[test]
    fn test_neighbouring_keys_do_not_match() {
        let mut index = KeyIndex::new();
        index.insert(ColorKey::new(1, 1), PairId(1));
        index.insert(ColorKey::new(1, 3), PairId(3));
        index.insert(ColorKey::new(-1, 2), PairId(4));

        assert_eq!(index.find(ColorKey::new(1, 2)), None);
        assert_eq!(index.find(ColorKey::new(1, 3)), Some(PairId(3)));
        assert_eq!(index.find(ColorKey::new(-1, 2)), Some(PairId(4)));
    }
}
