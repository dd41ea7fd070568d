//! Pair allocator: lookup, allocation, reservation and eviction

use super::hooks::{CapacitySource, NoopObserver, PairObserver};
use super::index::KeyIndex;
use super::recency;
use super::slot::{ColorId, ColorKey, PairId, SlotMode};
use super::table::SlotTable;
use crate::error::{Error, Result};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

/// Largest supported table size. Pair ids must fit in 15 bits.
pub const MAX_PAIR_LIMIT: usize = 32768;

/// Color-pair cache for one terminal session.
///
/// Keeps the slot table, the key index and the recency list in step. Every
/// public operation either fully applies or leaves all three untouched.
///
/// Two ways of filling slots coexist:
/// - [`allocate`](Self::allocate) picks any free slot for a color key, or
///   evicts the least recently touched one once the table is full
/// - [`reserve`](Self::reserve) sets an exact pair id chosen by the caller
pub struct PairAllocator<O: PairObserver = NoopObserver> {
    table: SlotTable,
    index: KeyIndex,
    /// Non-free slots, sentinel excluded. Always below capacity.
    used: usize,
    /// Most recent gap-scan result; the next scan starts after it.
    hint: PairId,
    observer: O,
    counters: Counters,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    releases: u64,
    reservations: u64,
}

impl PairAllocator<NoopObserver> {
    /// Create an allocator with `capacity` slots (sentinel included)
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_observer(capacity, NoopObserver)
    }

    /// Create an allocator sized by a capacity source
    pub fn from_source<S: CapacitySource + ?Sized>(source: &S) -> Result<Self> {
        Self::new(source.pair_limit())
    }
}

impl<O: PairObserver> PairAllocator<O> {
    /// Create an allocator that reports pair changes to `observer`
    pub fn with_observer(capacity: usize, observer: O) -> Result<Self> {
        if capacity == 0 || capacity > MAX_PAIR_LIMIT {
            return Err(Error::Config(format!(
                "pair limit {} outside 1..={}",
                capacity, MAX_PAIR_LIMIT
            )));
        }

        info!(capacity, "Initializing pair allocator");

        Ok(Self {
            table: SlotTable::new(capacity),
            index: KeyIndex::new(),
            used: 0,
            hint: PairId::SENTINEL,
            observer,
            counters: Counters::default(),
        })
    }

    /// Look up the pair holding (fg, bg) without touching anything
    pub fn find(&self, fg: ColorId, bg: ColorId) -> Option<PairId> {
        self.index.find(ColorKey::new(fg, bg))
    }

    /// Get a pair for (fg, bg), allocating or evicting as needed.
    ///
    /// A cache hit returns the existing pair and leaves the recency order
    /// alone. On a miss the gap scan looks for a free slot while there is
    /// room; once the table is full the least recently touched pair is
    /// reused.
    pub fn allocate(&mut self, fg: ColorId, bg: ColorId) -> Result<PairId> {
        let key = ColorKey::new(fg, bg);

        if let Some(pair) = self.index.find(key) {
            self.counters.hits += 1;
            metrics::counter!("paircache_hits_total").increment(1);
            trace!(pair = %pair, fg, bg, "Pair cache hit");
            return Ok(pair);
        }

        self.counters.misses += 1;
        metrics::counter!("paircache_misses_total").increment(1);

        let pair = if self.used + 1 < self.capacity() {
            let pair = self.find_gap().ok_or_else(|| {
                warn!(used = self.used, "Pair accounting says there is room but no slot is free");
                Error::NoFreeSlot
            })?;
            debug!(pair = %pair, "Found gap");
            self.hint = pair;
            pair
        } else {
            let pair = recency::lru(&self.table).ok_or(Error::NoFreeSlot)?;
            debug!(pair = %pair, "Reusing oldest pair");
            self.counters.evictions += 1;
            metrics::counter!("paircache_evictions_total").increment(1);
            pair
        };

        self.reserve_with_mode(pair, key, SlotMode::Allocated)?;
        Ok(pair)
    }

    /// Set `pair` to (fg, bg), whatever it held before.
    ///
    /// The pair becomes the most recently touched one and is marked
    /// `Reserved`, so the gap scan will not hand it out. It can still be
    /// evicted.
    pub fn reserve(&mut self, pair: PairId, fg: ColorId, bg: ColorId) -> Result<()> {
        self.reserve_with_mode(pair, ColorKey::new(fg, bg), SlotMode::Reserved)
    }

    fn reserve_with_mode(&mut self, pair: PairId, key: ColorKey, mode: SlotMode) -> Result<()> {
        if !self.table.is_valid(pair) {
            warn!(pair = %pair, "Refusing to set invalid pair");
            return Err(Error::InvalidSlot(pair));
        }

        let (was_free, old_key) = {
            let slot = self.table.slot(pair);
            (slot.mode.is_free(), slot.key)
        };

        recency::unlink(&mut self.table, pair);

        if !was_free && old_key != key {
            self.index.delete(old_key, pair);
        }

        {
            let slot = self.table.slot_mut(pair);
            slot.key = key;
            slot.mode = mode;
        }

        if was_free || old_key != key {
            self.index.insert(key, pair);
        }
        if was_free {
            self.used += 1;
            metrics::gauge!("paircache_pairs_used").set(self.used as f64);
        }

        recency::link_front(&mut self.table, pair);
        self.counters.reservations += 1;

        debug!(pair = %pair, key = %key, mode = ?mode, "Set pair");
        self.observer.pair_initialized(pair, key);

        #[cfg(feature = "pair-debug")]
        self.check_links(pair, "set");

        Ok(())
    }

    /// Free `pair` so its slot can be reused.
    ///
    /// The observer hears about it first, while the pair is still valid.
    pub fn release(&mut self, pair: PairId) -> Result<()> {
        if !self.table.is_valid(pair) {
            warn!(pair = %pair, "Refusing to free invalid pair");
            return Err(Error::InvalidSlot(pair));
        }

        let key = {
            let slot = self.table.slot(pair);
            if slot.mode.is_free() {
                return Err(Error::AlreadyFree(pair));
            }
            slot.key
        };

        self.observer.pair_released(pair);

        recency::unlink(&mut self.table, pair);
        self.index.delete(key, pair);
        self.table.slot_mut(pair).mode = SlotMode::Free;
        self.used -= 1;

        self.counters.releases += 1;
        metrics::counter!("paircache_releases_total").increment(1);
        metrics::gauge!("paircache_pairs_used").set(self.used as f64);
        debug!(pair = %pair, key = %key, "Freed pair");

        #[cfg(feature = "pair-debug")]
        self.check_links(pair, "free");

        Ok(())
    }

    /// Release every pair, most recent first. Returns how many were freed.
    pub fn teardown(&mut self) -> usize {
        let mut drained = 0;
        while let Some(pair) = recency::mru(&self.table) {
            if let Err(e) = self.release(pair) {
                warn!(pair = %pair, error = %e, "Stopping teardown");
                break;
            }
            drained += 1;
        }
        info!(drained, "Released all pairs");
        drained
    }

    /// Check that the recency list is symmetric and holds every used pair
    pub fn verify_links(&self) -> Result<usize> {
        recency::verify(&self.table, self.used)
    }

    #[cfg(feature = "pair-debug")]
    fn check_links(&self, pair: PairId, tag: &str) {
        trace!(tag, list = %recency::dump(&self.table, Some(pair)), "Pair list");
        if let Err(e) = self.verify_links() {
            tracing::error!(error = %e, list = %recency::dump(&self.table, Some(pair)), "Pair list corrupted");
            std::process::abort();
        }
    }

    /// Next free slot after the hint, wrapping around to 1
    fn find_gap(&self) -> Option<PairId> {
        let limit = self.capacity();
        let start = self.hint.index() + 1;
        (start..limit)
            .chain(1..start.min(limit))
            .map(|n| PairId(n as u16))
            .find(|&pair| self.table.slot(pair).mode.is_free())
    }

    /// Total slots, sentinel included
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Pairs currently in use
    pub fn used(&self) -> usize {
        self.used
    }

    /// Whether the next miss would evict instead of taking a free slot
    pub fn is_full(&self) -> bool {
        self.used + 1 >= self.capacity()
    }

    /// Colors held by `pair`, if it is in use
    pub fn key_of(&self, pair: PairId) -> Option<ColorKey> {
        self.table
            .get(pair)
            .filter(|slot| !pair.is_sentinel() && !slot.mode.is_free())
            .map(|slot| slot.key)
    }

    /// Mode of `pair`, sentinel included
    pub fn mode_of(&self, pair: PairId) -> Option<SlotMode> {
        self.table.get(pair).map(|slot| slot.mode)
    }

    /// Pairs in use, most recently touched first
    pub fn recent(&self) -> recency::Iter<'_> {
        recency::iter(&self.table)
    }

    /// Occupied slots with their links, for diagnostics
    pub fn dump(&self) -> String {
        recency::dump(&self.table, None)
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Get allocator statistics
    pub fn stats(&self) -> PairStats {
        let c = self.counters;
        let lookups = c.hits + c.misses;
        let hit_rate = if lookups > 0 {
            c.hits as f64 / lookups as f64
        } else {
            0.0
        };

        PairStats {
            hits: c.hits,
            misses: c.misses,
            evictions: c.evictions,
            releases: c.releases,
            reservations: c.reservations,
            used: self.used,
            capacity: self.capacity(),
            hit_rate,
        }
    }
}

/// Allocator statistics
#[derive(Debug, Clone, Serialize)]
pub struct PairStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub releases: u64,
    pub reservations: u64,
    pub used: usize,
    pub capacity: usize,
    pub hit_rate: f64,
}
