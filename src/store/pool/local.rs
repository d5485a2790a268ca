use hashbrown::HashMap;
use std::cell::RefCell;
use std::mem;
use triomphe::Arc;

use crate::store::pool::FreeList;
use crate::store::pool::GlobalPool;

thread_local! {
  static REGISTRY: RefCell<Registry> = RefCell::new(Registry::new());
}

// -----------------------------------------------------------------------------
// Registry
// -----------------------------------------------------------------------------

/// Per-thread table of free lists, one per storage this thread has touched.
///
/// Entries are keyed by the address of the storage's global pool and hold a
/// strong reference to it, which guarantees the key is never reused while the
/// entry exists. When the thread exits, the registry's destructor spills
/// every surviving free list into its global pool so the indices become
/// available to other threads.
struct Registry {
  entries: HashMap<usize, PoolEntry>,
}

struct PoolEntry {
  list: FreeList,
  global: Arc<GlobalPool>,
}

impl Registry {
  #[inline]
  fn new() -> Self {
    Self {
      entries: HashMap::new(),
    }
  }

  #[inline]
  fn entry(&mut self, global: &Arc<GlobalPool>) -> &mut PoolEntry {
    self.entries.entry(key(global)).or_insert_with(|| PoolEntry {
      list: FreeList::new(),
      global: Arc::clone(global),
    })
  }
}

impl Drop for Registry {
  fn drop(&mut self) {
    for (_, entry) in self.entries.drain() {
      if !entry.list.is_empty() {
        entry.global.push(entry.list);
      }
    }
  }
}

#[inline]
fn key(global: &Arc<GlobalPool>) -> usize {
  (&**global as *const GlobalPool) as usize
}

// -----------------------------------------------------------------------------
// Pool Operations
// -----------------------------------------------------------------------------

/// Tracks `flat` in the calling thread's free list for this storage.
pub(crate) fn push(global: &Arc<GlobalPool>, flat: u64) {
  let tracked = REGISTRY.try_with(|registry| {
    registry.borrow_mut().entry(global).list.push_back(flat);
  });

  // The registry is unavailable during thread teardown; hand the index
  // straight to the global pool as a single-element batch.
  if tracked.is_err() {
    global.push(FreeList::from([flat]));
  }
}

/// Removes the oldest free index available to the calling thread.
///
/// The thread-local list is consulted first; when it is empty, one spilled
/// list is adopted from the global pool and installed as the new thread-local
/// list. Returns `None` when both are empty.
pub(crate) fn pop(global: &Arc<GlobalPool>) -> Option<u64> {
  REGISTRY
    .try_with(|registry| {
      let mut registry = registry.borrow_mut();
      let entry: &mut PoolEntry = registry.entry(global);

      if let Some(flat) = entry.list.pop_front() {
        return Some(flat);
      }

      entry.list = global.try_adopt()?;

      debug_assert!(!entry.list.is_empty());

      entry.list.pop_front()
    })
    .ok()
    .flatten()
}

/// Moves the calling thread's free list into the global pool, leaving a fresh
/// empty list behind. Returns the number of indices spilled.
pub(crate) fn spill(global: &Arc<GlobalPool>) -> usize {
  REGISTRY
    .try_with(|registry| {
      let mut registry = registry.borrow_mut();
      let entry: &mut PoolEntry = registry.entry(global);
      let list: FreeList = mem::take(&mut entry.list);
      let count: usize = list.len();

      if count > 0 {
        entry.global.push(list);
      }

      count
    })
    .unwrap_or(0)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
