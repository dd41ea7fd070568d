//! Slot records for the color-pair table

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal color number. Negative values (e.g. -1) name the default color.
pub type ColorId = i32;

/// Identifier of a color pair, i.e. an index into the slot table.
///
/// The default is the sentinel, which doubles as the terminal's default pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairId(pub u16);

impl PairId {
    /// Slot 0: anchors the recency list and is never handed out
    pub const SENTINEL: PairId = PairId(0);

    /// Get the table index for this pair
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the sentinel slot
    pub fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for PairId {
    fn from(value: u16) -> Self {
        PairId(value)
    }
}

/// Foreground/background combination cached by a pair.
///
/// Ordering is lexicographic: foreground first, then background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColorKey {
    pub fg: ColorId,
    pub bg: ColorId,
}

impl ColorKey {
    pub fn new(fg: ColorId, bg: ColorId) -> Self {
        Self { fg, bg }
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.fg, self.bg)
    }
}

/// Occupancy state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotMode {
    /// Unused; candidate for the gap scan
    Free,
    /// Handed out by `allocate`
    Allocated,
    /// Set explicitly by number. Skipped by the gap scan, still evictable.
    Reserved,
    /// Pinned forever. Only the sentinel uses this.
    Kept,
}

impl SlotMode {
    pub fn is_free(self) -> bool {
        self == SlotMode::Free
    }
}

/// One entry of the pair table
#[derive(Debug, Clone)]
pub struct Slot {
    /// Colors currently mapped by this pair (stale while free)
    pub key: ColorKey,
    pub mode: SlotMode,
    /// Next slot towards the least recently used end
    pub next: PairId,
    /// Previous slot towards the most recently used end
    pub prev: PairId,
}

impl Slot {
    /// Create a free, unlinked slot. Unlinked slots point at themselves.
    pub fn new(id: PairId) -> Self {
        Self {
            key: ColorKey::default(),
            mode: SlotMode::Free,
            next: id,
            prev: id,
        }
    }

    /// Create the sentinel slot
    pub fn sentinel() -> Self {
        Self {
            mode: SlotMode::Kept,
            ..Self::new(PairId::SENTINEL)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_id_basics() {
        let id = PairId(7);
        assert_eq!(id.index(), 7);
        assert!(!id.is_sentinel());
        assert!(PairId::SENTINEL.is_sentinel());
        assert_eq!(id.to_string(), "7");
        assert_eq!(PairId::default(), PairId::SENTINEL);
    }

    #[test]
    fn test_color_key_ordering() {
        let a = ColorKey::new(1, 9);
        let b = ColorKey::new(2, 0);
        let c = ColorKey::new(2, 1);

        // Foreground dominates, background breaks ties
        assert!(a < b);
        assert!(b < c);
        assert!(ColorKey::new(-1, -1) < ColorKey::new(0, 0));
    }

    #[test]
    fn test_slot_lifecycle() {
        let slot = Slot::new(PairId(3));
        assert!(slot.mode.is_free());
        assert_eq!(slot.next, PairId(3));
        assert_eq!(slot.prev, PairId(3));

        let sentinel = Slot::sentinel();
        assert_eq!(sentinel.mode, SlotMode::Kept);
        assert_eq!(sentinel.next, PairId::SENTINEL);
    }
}
