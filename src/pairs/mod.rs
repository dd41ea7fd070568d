//! Color-pair slot allocator
//!
//! Maps (foreground, background) color keys to small pair ids for a
//! terminal renderer. The table has a fixed number of slots; once they are
//! all taken, the least recently touched pair is reused.
//!
//! # Architecture
//!
//! ```text
//! PairAllocator
//!   ├─→ SlotTable    [0:sentinel][1][2][3]...   key, mode, next/prev
//!   ├─→ KeyIndex     (fg,bg) → pair             ordered, O(log n) lookup
//!   └─→ recency      0 → MRU → ... → LRU → 0    links stored in the table
//! ```
//!
//! Slot 0 is a permanent sentinel: it anchors the recency list and is never
//! handed out. Pairs set explicitly with `reserve` are skipped by the gap
//! scan but age out like any other pair.

pub mod allocator;
pub mod hooks;
pub mod index;
pub mod recency;
pub mod shared;
pub mod slot;
pub mod table;

pub use allocator::{PairAllocator, PairStats, MAX_PAIR_LIMIT};
pub use hooks::{ActivePair, CapacitySource, NoopObserver, PairObserver};
pub use index::KeyIndex;
pub use shared::SharedPairCache;
pub use slot::{ColorId, ColorKey, PairId, Slot, SlotMode};
pub use table::SlotTable;
