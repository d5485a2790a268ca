//! Thread-safe FIFO used to stage spilled free pools.

mod shared;

pub use self::shared::SharedQueue;
