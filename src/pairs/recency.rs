//! Circular recency list threaded through the slot table
//!
//! ```text
//!        next            next            next
//!   ┌──► [0] ──────► [MRU] ──► ... ──► [LRU] ──┐
//!   └──────────────────────────────────────────┘
//! ```
//!
//! Slot 0 is the anchor: `slot0.next` is the most recently touched pair and
//! `slot0.prev` the least recently touched one, which is what eviction takes.
//! Links are pair ids, so the list lives entirely inside the table.

use super::slot::{PairId, SlotMode};
use super::table::SlotTable;
use crate::error::{Error, Result};
use std::fmt::Write;
use tracing::warn;

/// Remove `pair` from the list.
///
/// Neighbours are only rewired when both of them point back at `pair`;
/// otherwise nothing is touched and `false` is returned. Unlinked slots are
/// left pointing at themselves.
pub(crate) fn unlink(table: &mut SlotTable, pair: PairId) -> bool {
    let (prev, next) = match table.get(pair) {
        Some(slot) => (slot.prev, slot.next),
        None => return false,
    };

    if prev == pair && next == pair {
        return false;
    }

    let prev_links_back = table.get(prev).map(|s| s.next) == Some(pair);
    let next_links_back = table.get(next).map(|s| s.prev) == Some(pair);

    if prev_links_back && next_links_back {
        table.slot_mut(prev).next = next;
        table.slot_mut(next).prev = prev;
        let slot = table.slot_mut(pair);
        slot.next = pair;
        slot.prev = pair;
        true
    } else {
        warn!(pair = %pair, prev = %prev, next = %next, "Neighbours do not link back, not unlinking");
        false
    }
}

/// Insert `pair` right after the sentinel, making it the most recent.
///
/// `pair` must not be linked. Returns `false` for the sentinel or ids
/// outside the table.
pub(crate) fn link_front(table: &mut SlotTable, pair: PairId) -> bool {
    if pair.is_sentinel() || table.get(pair).is_none() {
        return false;
    }

    table.slot_mut(PairId::SENTINEL).mode = SlotMode::Kept;

    let head = table.slot(PairId::SENTINEL).next;
    if head == pair {
        return true;
    }
    if table.get(head).is_none() {
        warn!(pair = %pair, head = %head, "List head outside the table, not linking");
        return false;
    }

    {
        let slot = table.slot_mut(pair);
        slot.next = head;
        slot.prev = PairId::SENTINEL;
    }
    table.slot_mut(head).prev = pair;
    table.slot_mut(PairId::SENTINEL).next = pair;
    true
}

/// Most recently touched pair
pub fn mru(table: &SlotTable) -> Option<PairId> {
    table
        .get(PairId::SENTINEL)
        .map(|s| s.next)
        .filter(|p| !p.is_sentinel())
}

/// Least recently touched pair, i.e. the eviction candidate
pub fn lru(table: &SlotTable) -> Option<PairId> {
    table
        .get(PairId::SENTINEL)
        .map(|s| s.prev)
        .filter(|p| !p.is_sentinel())
}

/// Walk the list from most to least recently touched
pub fn iter(table: &SlotTable) -> Iter<'_> {
    Iter {
        table,
        next: table.get(PairId::SENTINEL).map_or(PairId::SENTINEL, |s| s.next),
        remaining: table.capacity(),
    }
}

/// Iterator over linked pairs, MRU first
pub struct Iter<'a> {
    table: &'a SlotTable,
    next: PairId,
    // Bounds the walk if the list is ever corrupted into a cycle
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = PairId;

    fn next(&mut self) -> Option<PairId> {
        if self.next.is_sentinel() || self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.next = self.table.get(current)?.next;
        self.remaining -= 1;
        Some(current)
    }
}

/// Check that the list is symmetric and holds `expected` real slots.
///
/// Walks both directions from the sentinel. Returns the number of linked
/// slots when everything agrees.
pub fn verify(table: &SlotTable, expected: usize) -> Result<usize> {
    let forward = walk(table, |p| table.get(p).map(|s| s.next), |p| {
        table.get(p).map(|s| s.prev)
    })?;
    let backward = walk(table, |p| table.get(p).map(|s| s.prev), |p| {
        table.get(p).map(|s| s.next)
    })?;

    if forward != backward {
        return Err(Error::ConsistencyViolation(format!(
            "next walk counts {} pairs, prev walk counts {}",
            forward, backward
        )));
    }
    if forward != expected {
        return Err(Error::ConsistencyViolation(format!(
            "list holds {} pairs, expected {}",
            forward, expected
        )));
    }
    Ok(forward)
}

fn walk(
    table: &SlotTable,
    step: impl Fn(PairId) -> Option<PairId>,
    back: impl Fn(PairId) -> Option<PairId>,
) -> Result<usize> {
    let mut count = 0;
    let mut current = PairId::SENTINEL;
    loop {
        let next = step(current).ok_or_else(|| {
            Error::ConsistencyViolation(format!("pair {} links outside the table", current))
        })?;
        if back(next) != Some(current) {
            return Err(Error::ConsistencyViolation(format!(
                "pair {} does not link back to {}",
                next, current
            )));
        }
        if next.is_sentinel() {
            return Ok(count);
        }
        count += 1;
        if count >= table.capacity() {
            return Err(Error::ConsistencyViolation(
                "walk does not return to the sentinel".to_string(),
            ));
        }
        current = next;
    }
}

/// Render occupied slots as ` id:(next,prev)`, marking `touched` with `@`.
pub fn dump(table: &SlotTable, touched: Option<PairId>) -> String {
    let mut out = String::new();
    for (id, slot) in table.iter().filter(|(_, s)| !s.mode.is_free()) {
        let mark = if Some(id) == touched { '@' } else { ':' };
        let _ = write!(out, " {}{}({},{})", id, mark, slot.next, slot.prev);
    }
    out
}
