use crossbeam_utils::CachePadded;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::panic::RefUnwindSafe;
use std::panic::UnwindSafe;
use std::ptr::NonNull;
use triomphe::Arc;

use crate::error::fatal;
use crate::loom::sync::atomic::Ordering::Acquire;
use crate::loom::sync::atomic::Ordering::Relaxed;
use crate::loom::sync::atomic::Ordering::Release;
use crate::loom::thread;
use crate::num::RefCount;
use crate::num::SlotIndex;
use crate::store::Handle;
use crate::store::pool;
use crate::store::pool::GlobalPool;
use crate::store::state::Tables;
use crate::store::state::Volatile;
use crate::store::utils::Geometry;
use crate::store::utils::Reclaim;

/// Default buffer order: 1024 slots per buffer.
pub const DEFAULT_BUFFER_ORDER: u32 = 10;

// -----------------------------------------------------------------------------
// Storage
// -----------------------------------------------------------------------------

/// Reference-counted slab storage for small immutable entities.
///
/// Entities of type `T` live in stable slots inside heap-allocated buffers of
/// `2^B` slots each. A fixed superbuffer table covers the whole index range
/// of the index width `I`; buffers are allocated lazily as the index space is
/// consumed and are never freed or relocated for the life of the storage, so
/// a slot's address is stable from the moment it is first reserved.
///
/// Allocation hands out a [`Handle`], a compact refcounted name for the slot.
/// When the last handle to a slot drops, the slot's index joins the dropping
/// thread's free pool and is reused by that thread's later allocations, or by
/// other threads after a [spill][Self::spill_free_pool].
///
/// # Entities are plain values
///
/// A recycled slot is overwritten in place; the previous occupant is **not**
/// dropped. Entities should therefore be plain data plus handles to other
/// entities. Handles stored inside an entity keep their targets allocated
/// until the storage itself is dropped; graphs with cycles simply leak.
///
/// # Concurrency
///
/// All operations take `&self` and are safe to call from any thread. Two
/// concurrent allocations may observe their indices in either order; the
/// counters reported by [`reserved`][Self::reserved] and
/// [`capacity`][Self::capacity] are exact only when all threads quiesce.
pub struct Storage<T, I = u32, R = i16, const B: u32 = DEFAULT_BUFFER_ORDER>
where
  I: SlotIndex,
  R: RefCount,
{
  volatile: CachePadded<Volatile>,
  tables: Tables<T, R>,
  geometry: Geometry,
  global: Arc<GlobalPool>,
  marker: PhantomData<I>,
}

impl<T, I, R, const B: u32> Storage<T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
  /// Number of slots in each buffer.
  pub const SLOTS_PER_BUFFER: u64 = 1 << B;

  /// Total number of slots addressable at index width `I`.
  pub const MAX_SLOTS: u64 = I::MAX_FLAT + 1;

  /// Creates a new, empty storage.
  ///
  /// The superbuffer tables for the whole index range are allocated up
  /// front; entity buffers are not. Pick `I` to bound the table footprint
  /// and `B` to amortise buffer allocation over `2^B` entities.
  pub fn new() -> Self {
    const {
      assert!(B < u64::BITS, "buffer order out of range");
    }

    const {
      assert!(1_u64 << B <= I::MAX_FLAT + 1, "buffer order exceeds index space");
    }

    let geometry: Geometry = Geometry::new(B, I::MAX_FLAT);
    let tables: Tables<T, R> = Tables::new(geometry.table_len(), geometry.buffer_len() as usize);

    Self {
      volatile: CachePadded::new(Volatile::new()),
      tables,
      geometry,
      global: Arc::new(GlobalPool::new()),
      marker: PhantomData,
    }
  }

  /// Allocates a slot and moves `value` into it.
  #[inline]
  pub fn make_entity(&self, value: T) -> Handle<'_, T, I, R, B> {
    self.make_entity_with(|slot| {
      slot.write(value);
    })
  }

  /// Allocates a slot and default-constructs the entity in place.
  #[inline]
  pub fn make_entity_default(&self) -> Handle<'_, T, I, R, B>
  where
    T: Default,
  {
    self.make_entity_with(|slot| {
      slot.write(T::default());
    })
  }

  /// Allocates a slot and constructs the entity in place.
  ///
  /// The `init` function receives the uninitialized slot and **must** fully
  /// initialize it before returning. If `init` unwinds, the slot returns to
  /// the calling thread's free pool and the panic propagates; no handle is
  /// produced.
  ///
  /// # Implementation
  ///
  /// 1. Pop an index from the thread-local free pool, or adopt a spilled
  ///    pool from the global queue, or reserve a fresh index from the bump
  ///    allocator (growing capacity by one buffer when needed).
  /// 2. Construct the entity by placement into the slot's stable address.
  /// 3. Bind a handle, raising the slot's refcount from zero to one.
  pub fn make_entity_with<F>(&self, init: F) -> Handle<'_, T, I, R, B>
  where
    F: FnOnce(&mut MaybeUninit<T>),
  {
    let flat: u64 = match pool::pop(&self.global) {
      Some(flat) => flat,
      None => self.acquire(),
    };

    let guard: Reclaim<'_> = Reclaim::new(&self.global, flat);
    let slot: NonNull<T> = self.slot_ptr(flat);

    // SAFETY: The slot is FREE: it is backed by a published buffer, its
    //         refcount is zero, and no handle names it, so this is the only
    //         live pointer to the cell.
    init(unsafe { &mut *slot.as_ptr().cast::<MaybeUninit<T>>() });

    guard.disarm();

    Handle::bind(self, slot, I::from_flat(flat))
  }

  /// Current value of the bump counter: how many flat indices have ever been
  /// handed out.
  ///
  /// Monotonically non-decreasing; freed indices are tracked in free pools
  /// and never rewind it. Not ordered with concurrent allocation.
  #[inline]
  pub fn reserved(&self) -> I {
    I::from_flat(self.volatile.reserved.load(Relaxed).min(I::MAX_FLAT))
  }

  /// Current number of slots backed by published buffers.
  ///
  /// Always a multiple of `2^B`; trails [`reserved`][Self::reserved] by at
  /// most one buffer once all in-flight allocations settle. Not ordered with
  /// concurrent allocation.
  #[inline]
  pub fn capacity(&self) -> I {
    I::from_flat(self.volatile.capacity.load(Relaxed).min(I::MAX_FLAT))
  }

  /// Moves the calling thread's free pool for this storage into the global
  /// pool, making its slots available to other threads.
  ///
  /// Returns the number of indices spilled, zero if the pool was empty. The
  /// same happens automatically for every storage when a thread exits.
  pub fn spill_free_pool(&self) -> usize {
    let spilled: usize = pool::spill(&self.global);

    if spilled > 0 {
      tracing::trace!(target: "keid::store", spilled, "free pool spilled");
    }

    spilled
  }

  /// Reserves a fresh flat index from the bump allocator, growing capacity
  /// when the index lands past the published buffers.
  ///
  /// # Ordering
  ///
  /// The capacity advance is a `Release` RMW sequenced after both table
  /// publications; any thread that observes `flat < capacity` with `Acquire`
  /// therefore observes the published buffer pair as well.
  fn acquire(&self) -> u64 {
    let flat: u64 = self.volatile.reserved.fetch_add(1, Relaxed);

    if flat >= Self::MAX_SLOTS {
      fatal!("flat index space exhausted");
    }

    let (outer, _) = self.geometry.split(flat);

    'publish: loop {
      let capacity: u64 = self.volatile.capacity.load(Acquire);

      if flat < capacity {
        break 'publish;
      }

      if flat == capacity {
        // This caller owns the pending buffer; every other thread waiting on
        // this buffer observes `flat > capacity` until the advance below.
        self.tables.publish(outer);

        let prev: u64 = self.volatile.capacity.fetch_add(self.geometry.buffer_len(), Release);

        debug_assert_eq!(prev, capacity);

        tracing::trace!(
          target: "keid::store",
          outer,
          capacity = prev + self.geometry.buffer_len(),
          "buffer published",
        );

        break 'publish;
      }

      thread::yield_now();
    }

    flat
  }

  /// Returns the address of the data cell for `flat`.
  #[inline]
  fn slot_ptr(&self, flat: u64) -> NonNull<T> {
    let (outer, inner) = self.geometry.split(flat);

    // SAFETY: `flat` was below `capacity` when it was reserved or recycled,
    //         so its buffer pair is published.
    unsafe { self.tables.data_cell(outer, inner) }
  }

  /// Returns the refcount cell for `index`.
  #[inline]
  pub(crate) fn count_cell(&self, index: I) -> &R::Cell {
    let (outer, inner) = self.geometry.split(index.into_flat());

    // SAFETY: Handles only ever name slots in published buffers.
    unsafe { self.tables.count_cell(outer, inner) }
  }

  /// Tracks `index` in the calling thread's free pool.
  #[inline]
  pub(crate) fn recycle(&self, index: I) {
    pool::push(&self.global, index.into_flat());
  }
}

impl<T, I, R, const B: u32> Default for Storage<T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl<T, I, R, const B: u32> Debug for Storage<T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("Storage")
      .field("reserved", &self.volatile.reserved)
      .field("capacity", &self.volatile.capacity)
      .field("buffer_len", &self.geometry.buffer_len())
      .field("table_len", &self.geometry.table_len())
      .finish_non_exhaustive()
  }
}

// SAFETY: `Storage<T>` owns its entities; moving the storage to another
//         thread moves them along, which is safe when `T` is `Send`.
unsafe impl<T, I, R, const B: u32> Send for Storage<T, I, R, B>
where
  T: Send,
  I: SlotIndex,
  R: RefCount,
{
}

// SAFETY: Shared access mutates only atomics and slot cells that no other
//         thread can reach yet. Entities are stored from and read on
//         arbitrary threads, so `T` must be both `Send` and `Sync`.
unsafe impl<T, I, R, const B: u32> Sync for Storage<T, I, R, B>
where
  T: Send + Sync,
  I: SlotIndex,
  R: RefCount,
{
}

impl<T, I, R, const B: u32> RefUnwindSafe for Storage<T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
}

impl<T, I, R, const B: u32> UnwindSafe for Storage<T, I, R, B>
where
  I: SlotIndex,
  R: RefCount,
{
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
