use std::num::NonZeroUsize;
use std::ptr;
use std::ptr::NonNull;

use crate::error::fatal;
use crate::loom::alloc::Layout;
use crate::loom::alloc::alloc;
use crate::loom::alloc::dealloc;
use crate::loom::alloc::handle_alloc_error;
use crate::loom::sync::atomic::AtomicPtr;
use crate::loom::sync::atomic::Ordering;
use crate::num::RefCount;

// -----------------------------------------------------------------------------
// Shelf
// -----------------------------------------------------------------------------

/// One superbuffer table: a fixed array of lazily-populated buffer pointers.
///
/// Entries start out null and are published at most once, by the single
/// thread responsible for growing capacity past the corresponding buffer.
/// The array itself covers the entire index range and is never reallocated,
/// so published buffer addresses are stable for the life of the shelf.
struct Shelf<P> {
  table: NonNull<AtomicPtr<P>>,
  len: NonZeroUsize,
}

impl<P> Shelf<P> {
  fn new(len: NonZeroUsize) -> Self {
    let layout: Layout = table_layout::<P>(len);

    // SAFETY: The layout has a non-zero size; every entry is initialized
    //         below before the shelf is returned.
    let target: *mut u8 = unsafe { alloc(layout) };

    let Some(table) = NonNull::new(target) else {
      handle_alloc_error(layout);
    };

    let table: NonNull<AtomicPtr<P>> = table.cast();

    for offset in 0..len.get() {
      // SAFETY: `offset` is within the allocation we just made.
      unsafe {
        table.add(offset).write(AtomicPtr::new(ptr::null_mut()));
      }
    }

    Self { table, len }
  }

  #[inline]
  const fn len(&self) -> NonZeroUsize {
    self.len
  }

  #[inline]
  fn entry(&self, outer: usize) -> &AtomicPtr<P> {
    debug_assert!(outer < self.len.get(), "superbuffer index out of bounds");

    // SAFETY: `outer` is in bounds and every entry was initialized in `new`.
    unsafe { self.table.add(outer).as_ref() }
  }

  /// Loads the buffer pointer for `outer`, null if not yet published.
  ///
  /// The `Acquire` load pairs with the `Release` store in
  /// [`publish`][Self::publish]; a non-null result is a fully allocated,
  /// fully initialized buffer.
  #[inline]
  fn load(&self, outer: usize) -> *mut P {
    self.entry(outer).load(Ordering::Acquire)
  }

  /// Publishes the buffer for `outer`.
  #[inline]
  fn publish(&self, outer: usize, buffer: NonNull<P>) {
    self.entry(outer).store(buffer.as_ptr(), Ordering::Release);
  }
}

impl<P> Drop for Shelf<P> {
  fn drop(&mut self) {
    let entries: *mut [AtomicPtr<P>] =
      ptr::slice_from_raw_parts_mut(self.table.as_ptr(), self.len.get());

    // SAFETY: Every entry was initialized in `new` and the table was
    //         allocated with this exact layout.
    unsafe {
      ptr::drop_in_place(entries);
      dealloc(self.table.as_ptr().cast(), table_layout::<P>(self.len));
    }
  }
}

#[inline]
fn table_layout<P>(len: NonZeroUsize) -> Layout {
  match Layout::array::<AtomicPtr<P>>(len.get()) {
    Ok(layout) => layout,
    Err(error) => fatal!(error),
  }
}

// -----------------------------------------------------------------------------
// Tables
// -----------------------------------------------------------------------------

/// The two parallel superbuffer tables: entity data and refcounts.
///
/// Both shelves are populated together: a superbuffer entry either has both
/// buffers published or neither. Refcount cells are zeroed before the
/// pointers become visible, so a reader that can see a buffer always sees
/// well-formed counts.
pub(crate) struct Tables<T, R: RefCount> {
  data: Shelf<T>,
  counts: Shelf<R::Cell>,
  buffer_len: usize,
}

impl<T, R: RefCount> Tables<T, R> {
  pub(crate) fn new(table_len: NonZeroUsize, buffer_len: usize) -> Self {
    Self {
      data: Shelf::new(table_len),
      counts: Shelf::new(table_len),
      buffer_len,
    }
  }

  /// Allocates and publishes the buffer pair for superbuffer entry `outer`.
  ///
  /// Must be called at most once per entry, by the thread that owns the
  /// pending capacity advance. Data cells are left uninitialized; refcount
  /// cells are zeroed.
  pub(crate) fn publish(&self, outer: usize) {
    debug_assert!(self.data.load(outer).is_null(), "buffer published twice");

    self.data.publish(outer, alloc_data_buffer::<T>(self.buffer_len));
    self.counts.publish(outer, alloc_count_buffer::<R>(self.buffer_len));
  }

  /// Returns the address of the data cell at `(outer, inner)`.
  ///
  /// # Safety
  ///
  /// The buffer pair for `outer` must have been published, and `inner` must
  /// be below the buffer length.
  #[inline]
  pub(crate) unsafe fn data_cell(&self, outer: usize, inner: usize) -> NonNull<T> {
    let buffer: *mut T = self.data.load(outer);

    debug_assert!(!buffer.is_null(), "data cell in unpublished buffer");
    debug_assert!(inner < self.buffer_len, "buffer index out of bounds");

    // SAFETY: This is guaranteed to be safe by the caller.
    unsafe { NonNull::new_unchecked(buffer.add(inner)) }
  }

  /// Returns a reference to the refcount cell at `(outer, inner)`.
  ///
  /// # Safety
  ///
  /// The buffer pair for `outer` must have been published, and `inner` must
  /// be below the buffer length.
  #[inline]
  pub(crate) unsafe fn count_cell(&self, outer: usize, inner: usize) -> &R::Cell {
    let buffer: *mut R::Cell = self.counts.load(outer);

    debug_assert!(!buffer.is_null(), "refcount cell in unpublished buffer");
    debug_assert!(inner < self.buffer_len, "buffer index out of bounds");

    // SAFETY: This is guaranteed to be safe by the caller.
    unsafe { &*buffer.add(inner) }
  }
}

impl<T, R: RefCount> Drop for Tables<T, R> {
  fn drop(&mut self) {
    for outer in 0..self.data.len().get() {
      let data: *mut T = self.data.load(outer);

      if data.is_null() {
        continue;
      }

      let counts: *mut R::Cell = self.counts.load(outer);

      debug_assert!(!counts.is_null());

      // Data cells may hold stale or uninitialized bytes, so the buffer is
      // released without dropping any `T`. Refcount cells were all
      // initialized at publication and are dropped in place.
      unsafe {
        let layout: Layout = buffer_layout::<T>(self.buffer_len);

        if layout.size() != 0 {
          dealloc(data.cast(), layout);
        }

        ptr::drop_in_place(ptr::slice_from_raw_parts_mut(counts, self.buffer_len));
        dealloc(counts.cast(), buffer_layout::<R::Cell>(self.buffer_len));
      }
    }
  }
}

#[inline]
fn alloc_data_buffer<T>(len: usize) -> NonNull<T> {
  let layout: Layout = buffer_layout::<T>(len);

  if layout.size() == 0 {
    return NonNull::dangling();
  }

  // SAFETY: The layout has a non-zero size. Cells are constructed later by
  //         placement into the exact addresses handed out by the allocator.
  let target: *mut u8 = unsafe { alloc(layout) };

  let Some(buffer) = NonNull::new(target) else {
    handle_alloc_error(layout);
  };

  buffer.cast()
}

#[inline]
fn alloc_count_buffer<R: RefCount>(len: usize) -> NonNull<R::Cell> {
  let layout: Layout = buffer_layout::<R::Cell>(len);

  // SAFETY: The layout has a non-zero size; every cell is initialized below
  //         before the pointer escapes this function.
  let target: *mut u8 = unsafe { alloc(layout) };

  let Some(buffer) = NonNull::new(target) else {
    handle_alloc_error(layout);
  };

  let buffer: NonNull<R::Cell> = buffer.cast();

  for offset in 0..len {
    // SAFETY: `offset` is within the allocation we just made.
    unsafe {
      buffer.add(offset).write(R::new_cell());
    }
  }

  buffer
}

#[inline]
fn buffer_layout<P>(len: usize) -> Layout {
  match Layout::array::<P>(len) {
    Ok(layout) => layout,
    Err(error) => fatal!(error),
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
