//! Keid - reference-counted slab storage for small immutable entities
//!
//! Entities live in stable slots inside lazily-grown buffers and are named by
//! compact integer handles instead of machine pointers. Dropping the last
//! handle to an entity recycles its slot through a per-thread free pool.

mod error;
mod loom;

pub mod num;
pub mod queue;
pub mod store;

pub mod types {
  //! Core types of the Keid storage engine.

  pub use crate::num::RefCount;
  pub use crate::num::SlotIndex;

  pub use crate::queue::SharedQueue;

  pub use crate::store::DEFAULT_BUFFER_ORDER;
  pub use crate::store::Handle;
  pub use crate::store::Storage;
}

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
