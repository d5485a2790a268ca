//! The slab storage engine.
//!
//! [`Storage`] owns the two-level slab (superbuffer tables over lazily
//! allocated buffers), the concurrent bump allocator over the flat index
//! space, and the free-slot pools. [`Handle`] is the refcounted name clients
//! hold for a stored entity.

mod handle;
mod pool;
mod state;
mod storage;
mod utils;

pub use self::handle::Handle;
pub use self::storage::DEFAULT_BUFFER_ORDER;
pub use self::storage::Storage;
