use std::mem;
use triomphe::Arc;

use crate::store::pool;
use crate::store::pool::GlobalPool;

// -----------------------------------------------------------------------------
// Reclaim Guard
// -----------------------------------------------------------------------------

/// Returns a slot to the free pool unless disarmed.
///
/// Armed around entity construction: if the initialiser unwinds before a
/// handle exists, the slot's index goes back to the calling thread's free
/// pool (its refcount is still zero) and the panic propagates to the caller.
#[must_use]
pub(crate) struct Reclaim<'pool> {
  global: &'pool Arc<GlobalPool>,
  flat: u64,
}

impl<'pool> Reclaim<'pool> {
  #[inline]
  pub(crate) fn new(global: &'pool Arc<GlobalPool>, flat: u64) -> Self {
    Self { global, flat }
  }

  /// Consumes the guard without reclaiming the slot.
  #[inline]
  pub(crate) fn disarm(self) {
    mem::forget(self);
  }
}

impl Drop for Reclaim<'_> {
  fn drop(&mut self) {
    pool::push(self.global, self.flat);
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_drop_reclaims() {
    let global: Arc<GlobalPool> = Arc::new(GlobalPool::new());

    drop(Reclaim::new(&global, 5));

    assert_eq!(pool::pop(&global), Some(5));
  }

  #[test]
  fn test_disarm_keeps_slot() {
    let global: Arc<GlobalPool> = Arc::new(GlobalPool::new());

    Reclaim::new(&global, 5).disarm();

    assert_eq!(pool::pop(&global), None);
  }
}
