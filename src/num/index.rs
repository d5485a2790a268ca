use std::fmt::Debug;
use std::hash::Hash;

mod sealed {
  pub trait Sealed {}

  impl Sealed for u8 {}
  impl Sealed for u16 {}
  impl Sealed for u32 {}
}

/// Unsigned integer width used for flat slot indices.
///
/// The index width bounds the total number of addressable slots in a storage:
/// a storage parameterised over `I` can hold at most `I::MAX_FLAT + 1`
/// entities over its whole lifetime of reservations.
///
/// This trait is sealed and implemented for `u8`, `u16` and `u32`. Wider
/// index types are deliberately not offered: the superbuffer tables cover the
/// entire index range up front, which is only reasonable for spaces that fit
/// in 32 bits.
pub trait SlotIndex:
  sealed::Sealed + Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static
{
  /// The largest flat index representable at this width.
  const MAX_FLAT: u64;

  /// Narrows a flat index into this width.
  fn from_flat(flat: u64) -> Self;

  /// Widens this index into a flat `u64`.
  fn into_flat(self) -> u64;
}

macro_rules! impl_slot_index {
  ($($int:ty),+ $(,)?) => {$(
    impl SlotIndex for $int {
      const MAX_FLAT: u64 = <$int>::MAX as u64;

      #[inline]
      fn from_flat(flat: u64) -> Self {
        debug_assert!(flat <= Self::MAX_FLAT, "flat index out of range");
        flat as $int
      }

      #[inline]
      fn into_flat(self) -> u64 {
        self as u64
      }
    }
  )+};
}

impl_slot_index!(u8, u16, u32);

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_max_flat() {
    assert_eq!(<u8 as SlotIndex>::MAX_FLAT, 255);
    assert_eq!(<u16 as SlotIndex>::MAX_FLAT, 65_535);
    assert_eq!(<u32 as SlotIndex>::MAX_FLAT, 4_294_967_295);
  }

  #[test]
  fn test_roundtrip() {
    for flat in [0_u64, 1, 2, 254, 255] {
      let narrow: u8 = SlotIndex::from_flat(flat);
      assert_eq!(narrow.into_flat(), flat);
    }

    for flat in [0_u64, 256, 65_535] {
      let narrow: u16 = SlotIndex::from_flat(flat);
      assert_eq!(narrow.into_flat(), flat);
    }

    for flat in [0_u64, 65_536, 4_294_967_295] {
      let narrow: u32 = SlotIndex::from_flat(flat);
      assert_eq!(narrow.into_flat(), flat);
    }
  }
}
