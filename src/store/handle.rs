use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ops::Deref;
use std::ptr::NonNull;

use crate::loom::sync::atomic::Ordering;
use crate::loom::sync::atomic::fence;
use crate::num::RefCount;
use crate::num::SlotIndex;
use crate::store::DEFAULT_BUFFER_ORDER;
use crate::store::Storage;

// -----------------------------------------------------------------------------
// Handle
// -----------------------------------------------------------------------------

/// A reference-counted name for one entity in a [`Storage`].
///
/// A handle is the only legitimate way to reach a stored entity. It carries a
/// cached slot address for constant-time dereference and the slot's flat
/// index for refcount bookkeeping. Cloning shares the entity, dropping
/// releases one share; when the last handle drops, the slot joins the current
/// thread's free pool. Moves transfer ownership without touching the count.
///
/// Handles are immutable bindings: dereferencing yields a read-only view of
/// the entity, and no mutation path exists. To "change" an entity, allocate a
/// new one and replace the handle.
///
/// # Equality
///
/// Handles compare by slot address, giving a cheap identity check. Slot
/// addresses are stable and never shared between live storages, so two
/// handles are equal exactly when they name the same slot of the same
/// storage; still, only comparisons between handles of one storage are
/// meaningful.
pub struct Handle<'store, T, I = u32, R = i16, const B: u32 = DEFAULT_BUFFER_ORDER>
where
  I: SlotIndex,
  R: RefCount,
{
  slot: NonNull<T>,
  index: I,
  storage: &'store Storage<T, I, R, B>,
}

impl<'store, T, I, R, const B: u32> Handle<'store, T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
  /// Binds a new handle to `slot`, incrementing the slot's refcount.
  #[inline]
  pub(crate) fn bind(storage: &'store Storage<T, I, R, B>, slot: NonNull<T>, index: I) -> Self {
    let prev: R = R::incr(storage.count_cell(index));

    debug_assert!(prev.count() < R::MAX_COUNT, "refcount overflow");

    Self {
      slot,
      index,
      storage,
    }
  }

  /// Returns the flat index of the slot this handle names.
  #[inline]
  pub fn index(&self) -> I {
    self.index
  }

  /// Returns the number of handles currently naming this slot.
  ///
  /// The count is read with relaxed ordering and may be stale the moment it
  /// returns; it is intended for telemetry and for tests that quiesce all
  /// threads first.
  #[inline]
  pub fn strong_count(&self) -> R {
    R::load(self.storage.count_cell(self.index))
  }
}

impl<T, I, R, const B: u32> Clone for Handle<'_, T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
  #[inline]
  fn clone(&self) -> Self {
    Self::bind(self.storage, self.slot, self.index)
  }
}

impl<T, I, R, const B: u32> Drop for Handle<'_, T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
  fn drop(&mut self) {
    let prev: R = R::decr(self.storage.count_cell(self.index));

    debug_assert!(prev.count() >= 1, "refcount underflow");

    if prev.count() == 1 {
      // Pair with the `Release` decrements of every other handle that named
      // this slot, so reuse happens-after all of their accesses. The stored
      // entity is not dropped; the slot is recycled by overwriting.
      fence(Ordering::Acquire);

      self.storage.recycle(self.index);
    }
  }
}

impl<T, I, R, const B: u32> Deref for Handle<'_, T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
  type Target = T;

  #[inline]
  fn deref(&self) -> &T {
    // SAFETY: The slot holds a fully constructed entity for as long as this
    //         handle exists, and its address is stable.
    unsafe { self.slot.as_ref() }
  }
}

impl<T, I, R, const B: u32> PartialEq for Handle<'_, T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
  #[inline]
  fn eq(&self, other: &Self) -> bool {
    self.slot == other.slot
  }
}

impl<T, I, R, const B: u32> Eq for Handle<'_, T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
}

impl<T, I, R, const B: u32> Debug for Handle<'_, T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Handle").field("index", &self.index).finish_non_exhaustive()
  }
}

// SAFETY: A handle is a shared, read-only view of the entity plus atomic
//         refcount updates; it is safe to transfer across thread boundaries
//         when the entity itself can be shared and the storage reference can
//         travel along.
unsafe impl<T, I, R, const B: u32> Send for Handle<'_, T, I, R, B>
where
  T: Send + Sync,
  I: SlotIndex,
  R: RefCount,
{
}

// SAFETY: All shared access through a handle is either read-only or atomic.
unsafe impl<T, I, R, const B: u32> Sync for Handle<'_, T, I, R, B>
where
  T: Send + Sync,
  I: SlotIndex,
  R: RefCount,
{
}
