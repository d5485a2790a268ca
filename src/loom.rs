#[cfg(not(loom))]
pub(crate) mod export {
  pub(crate) mod alloc {
    pub(crate) use std::alloc::Layout;
    pub(crate) use std::alloc::alloc;
    pub(crate) use std::alloc::dealloc;
    pub(crate) use std::alloc::handle_alloc_error;
  }

  pub(crate) mod thread {
    pub(crate) use std::thread::yield_now;
  }

  pub(crate) mod sync {
    pub(crate) mod atomic {
      pub(crate) use std::sync::atomic::AtomicI8;
      pub(crate) use std::sync::atomic::AtomicI16;
      pub(crate) use std::sync::atomic::AtomicI32;
      pub(crate) use std::sync::atomic::AtomicPtr;
      pub(crate) use std::sync::atomic::AtomicU8;
      pub(crate) use std::sync::atomic::AtomicU16;
      pub(crate) use std::sync::atomic::AtomicU32;
      pub(crate) use std::sync::atomic::AtomicU64;
      pub(crate) use std::sync::atomic::Ordering;
      pub(crate) use std::sync::atomic::fence;
    }
  }
}

#[cfg(loom)]
pub(crate) mod export {
  pub(crate) mod alloc {
    pub(crate) use ::loom::alloc::Layout;
    pub(crate) use ::loom::alloc::alloc;
    pub(crate) use ::loom::alloc::dealloc;
    pub(crate) use std::alloc::handle_alloc_error;
  }

  pub(crate) mod thread {
    pub(crate) use ::loom::thread::yield_now;
  }

  pub(crate) mod sync {
    pub(crate) mod atomic {
      pub(crate) use ::loom::sync::atomic::AtomicI8;
      pub(crate) use ::loom::sync::atomic::AtomicI16;
      pub(crate) use ::loom::sync::atomic::AtomicI32;
      pub(crate) use ::loom::sync::atomic::AtomicPtr;
      pub(crate) use ::loom::sync::atomic::AtomicU8;
      pub(crate) use ::loom::sync::atomic::AtomicU16;
      pub(crate) use ::loom::sync::atomic::AtomicU32;
      pub(crate) use ::loom::sync::atomic::AtomicU64;
      pub(crate) use ::loom::sync::atomic::Ordering;
      pub(crate) use ::loom::sync::atomic::fence;
    }
  }
}

#[doc(inline)]
pub(crate) use self::export::*;
