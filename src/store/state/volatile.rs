use crate::loom::sync::atomic::AtomicU64;

/// Frequently modified allocator state stored in a cache-padded section.
///
/// Both counters cover the flat index space and only ever grow:
///
/// - `reserved` is the bump counter; a freed index is tracked in a free pool
///   and never rewinds it.
/// - `capacity` trails `reserved` by at most one buffer and is advanced only
///   by the thread that published the corresponding buffer pair.
#[repr(C)]
pub(crate) struct Volatile {
  /// The next flat index to hand out.
  pub(crate) reserved: AtomicU64,
  /// The number of slots backed by published buffers.
  pub(crate) capacity: AtomicU64,
}

impl Volatile {
  #[inline]
  pub(crate) fn new() -> Self {
    Self {
      reserved: AtomicU64::new(0),
      capacity: AtomicU64::new(0),
    }
  }
}
