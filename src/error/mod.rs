//! Error handling utilities for storage-engine failures.

mod macros;

pub(crate) use self::macros::fatal;
