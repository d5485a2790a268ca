use std::collections::VecDeque;

use crate::queue::SharedQueue;

/// FIFO of flat indices whose refcount is currently zero.
pub(crate) type FreeList = VecDeque<u64>;

// -----------------------------------------------------------------------------
// Global Pool
// -----------------------------------------------------------------------------

/// The storage-wide pool of spilled per-thread free lists.
///
/// Entries are whole FIFOs, never individual indices: a thread touches this
/// queue at most once per spill event and at most once per refill attempt,
/// which keeps the mutex off the single-threaded allocation path.
#[repr(transparent)]
pub(crate) struct GlobalPool {
  spilled: SharedQueue<FreeList>,
}

impl GlobalPool {
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      spilled: SharedQueue::new(),
    }
  }

  /// Stages a spilled free list for adoption by another thread.
  pub(crate) fn push(&self, list: FreeList) {
    debug_assert!(!list.is_empty(), "empty free list spilled");

    self.spilled.push(list);
  }

  /// Removes one spilled free list, or returns `None` if none is staged.
  pub(crate) fn try_adopt(&self) -> Option<FreeList> {
    self.spilled.try_pop()
  }

  #[cfg(test)]
  pub(crate) fn len(&self) -> usize {
    self.spilled.len()
  }
}
