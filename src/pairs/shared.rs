//! Lock-guarded handle for sharing one allocator between threads

use super::allocator::{PairAllocator, PairStats};
use super::hooks::{NoopObserver, PairObserver};
use super::slot::{ColorId, PairId};
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable handle to a session's allocator.
///
/// The allocator itself does no locking. Each method here holds the lock for
/// exactly one allocator operation, so a find followed by an allocate is not
/// atomic; use [`with`](Self::with) for that.
pub struct SharedPairCache<O: PairObserver = NoopObserver> {
    inner: Arc<Mutex<PairAllocator<O>>>,
}

impl<O: PairObserver> Clone for SharedPairCache<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: PairObserver> SharedPairCache<O> {
    pub fn new(allocator: PairAllocator<O>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(allocator)),
        }
    }

    pub fn allocate(&self, fg: ColorId, bg: ColorId) -> Result<PairId> {
        self.inner.lock().allocate(fg, bg)
    }

    pub fn find(&self, fg: ColorId, bg: ColorId) -> Option<PairId> {
        self.inner.lock().find(fg, bg)
    }

    pub fn reserve(&self, pair: PairId, fg: ColorId, bg: ColorId) -> Result<()> {
        self.inner.lock().reserve(pair, fg, bg)
    }

    pub fn release(&self, pair: PairId) -> Result<()> {
        self.inner.lock().release(pair)
    }

    pub fn teardown(&self) -> usize {
        self.inner.lock().teardown()
    }

    pub fn stats(&self) -> PairStats {
        self.inner.lock().stats()
    }

    /// Run `f` with the allocator locked
    pub fn with<R>(&self, f: impl FnOnce(&mut PairAllocator<O>) -> R) -> R {
        f(&mut *self.inner.lock())
    }
}
