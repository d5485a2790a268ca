use std::fmt::Debug;

use crate::loom::sync::atomic::AtomicI8;
use crate::loom::sync::atomic::AtomicI16;
use crate::loom::sync::atomic::AtomicI32;
use crate::loom::sync::atomic::AtomicU8;
use crate::loom::sync::atomic::AtomicU16;
use crate::loom::sync::atomic::AtomicU32;
use crate::loom::sync::atomic::Ordering;

mod sealed {
  pub trait Sealed {}

  impl Sealed for i8 {}
  impl Sealed for i16 {}
  impl Sealed for i32 {}
  impl Sealed for u8 {}
  impl Sealed for u16 {}
  impl Sealed for u32 {}
}

/// Integer width used for per-slot reference counts.
///
/// Each slot carries one atomic cell of this width; the width must cover the
/// application's worst-case sharing factor for a single entity. Overflow is
/// not checked in release builds.
///
/// This trait is sealed and implemented for `i8`, `i16`, `i32`, `u8`, `u16`
/// and `u32`.
///
/// # Ordering
///
/// The count follows the shared-pointer discipline:
///
/// - [`incr`][Self::incr] is `Relaxed`: a new reference is only ever created
///   from an existing one, which already keeps the slot alive.
/// - [`decr`][Self::decr] is `Release`: every access through the dropped
///   reference is published before the count can reach zero.
/// - The caller that observes the drop to zero issues an `Acquire` fence
///   before recycling the slot.
pub trait RefCount: sealed::Sealed + Copy + Eq + Debug + Send + Sync + 'static {
  /// The atomic cell storing one slot's count.
  type Cell: Send + Sync;

  /// The largest share count representable at this width.
  const MAX_COUNT: i64;

  /// Creates a cell with a count of zero.
  fn new_cell() -> Self::Cell;

  /// Increments the count with `Relaxed` ordering, returning the previous value.
  fn incr(cell: &Self::Cell) -> Self;

  /// Decrements the count with `Release` ordering, returning the previous value.
  fn decr(cell: &Self::Cell) -> Self;

  /// Reads the current count with `Relaxed` ordering.
  fn load(cell: &Self::Cell) -> Self;

  /// Widens this count for comparisons in assertions and tests.
  fn count(self) -> i64;
}

macro_rules! impl_refcount {
  ($($int:ty => $cell:ident),+ $(,)?) => {$(
    impl RefCount for $int {
      type Cell = $cell;

      const MAX_COUNT: i64 = <$int>::MAX as i64;

      #[inline]
      fn new_cell() -> Self::Cell {
        $cell::new(0)
      }

      #[inline]
      fn incr(cell: &Self::Cell) -> Self {
        cell.fetch_add(1, Ordering::Relaxed)
      }

      #[inline]
      fn decr(cell: &Self::Cell) -> Self {
        cell.fetch_sub(1, Ordering::Release)
      }

      #[inline]
      fn load(cell: &Self::Cell) -> Self {
        cell.load(Ordering::Relaxed)
      }

      #[inline]
      fn count(self) -> i64 {
        self as i64
      }
    }
  )+};
}

impl_refcount! {
  i8 => AtomicI8,
  i16 => AtomicI16,
  i32 => AtomicI32,
  u8 => AtomicU8,
  u16 => AtomicU16,
  u32 => AtomicU32,
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
