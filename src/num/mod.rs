//! Integer width selection for slot indices and reference counts.

mod index;
mod refcount;

pub use self::index::SlotIndex;
pub use self::refcount::RefCount;
