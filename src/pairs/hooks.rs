//! Interfaces to the rendering layer around the allocator

use super::slot::{ColorKey, PairId};
use tracing::debug;

/// Supplies the number of color pairs the terminal supports.
pub trait CapacitySource {
    /// Total slot count, sentinel included
    fn pair_limit(&self) -> usize;
}

impl CapacitySource for usize {
    fn pair_limit(&self) -> usize {
        *self
    }
}

/// Receives notifications about pairs changing underneath the renderer.
///
/// Both methods default to doing nothing.
pub trait PairObserver {
    /// `pair` is about to be freed. If it is the pair currently applied to
    /// output, the renderer must switch to a default pair before it goes.
    fn pair_released(&mut self, _pair: PairId) {}

    /// `pair` now maps to `key` and should be (re)initialized on the
    /// terminal.
    fn pair_initialized(&mut self, _pair: PairId, _key: ColorKey) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PairObserver for NoopObserver {}

/// Tracks which pair the renderer currently has applied.
///
/// Falls back to the default pair 0 when the applied pair is released.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivePair {
    current: PairId,
}

impl ActivePair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair currently applied to output
    pub fn current(&self) -> PairId {
        self.current
    }

    /// Apply `pair` to subsequent output
    pub fn apply(&mut self, pair: PairId) {
        self.current = pair;
    }
}

impl PairObserver for ActivePair {
    fn pair_released(&mut self, pair: PairId) {
        if self.current == pair {
            debug!(pair = %pair, "Active pair released, falling back to default");
            self.current = PairId::SENTINEL;
        }
    }
}

impl<O: PairObserver + ?Sized> PairObserver for &mut O {
    fn pair_released(&mut self, pair: PairId) {
        (**self).pair_released(pair)
    }

    fn pair_initialized(&mut self, pair: PairId, key: ColorKey) {
        (**self).pair_initialized(pair, key)
    }
}

impl<O: PairObserver + ?Sized> PairObserver for Box<O> {
    fn pair_released(&mut self, pair: PairId) {
        (**self).pair_released(pair)
    }

    fn pair_initialized(&mut self, pair: PairId, key: ColorKey) {
        (**self).pair_initialized(pair, key)
    }
}
