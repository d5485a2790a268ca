use parking_lot::Condvar;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

// -----------------------------------------------------------------------------
// Shared Queue
// -----------------------------------------------------------------------------

/// A mutex-guarded FIFO of opaque values.
///
/// Every operation takes the internal lock for its full duration, making all
/// operations linearisable under concurrent use. The queue is unbounded;
/// [`push`][Self::push] never blocks, [`wait_and_pop`][Self::wait_and_pop]
/// blocks until a value is available.
///
/// The storage engine uses this queue for exactly one purpose: staging whole
/// per-thread free pools spilled into the global pool. Spilling batches of
/// indices rather than individual indices keeps the allocation hot path away
/// from this lock.
pub struct SharedQueue<T> {
  state: Mutex<VecDeque<T>>,
  signal: Condvar,
}

impl<T> SharedQueue<T> {
  /// Creates a new, empty queue.
  #[inline]
  pub fn new() -> Self {
    Self {
      state: Mutex::new(VecDeque::new()),
      signal: Condvar::new(),
    }
  }

  /// Appends a value to the back of the queue and wakes one waiter.
  pub fn push(&self, value: T) {
    let mut state = self.state.lock();

    state.push_back(value);
    drop(state);

    self.signal.notify_one();
  }

  /// Removes the value at the front of the queue, or returns `None` if the
  /// queue is currently empty.
  pub fn try_pop(&self) -> Option<T> {
    self.state.lock().pop_front()
  }

  /// Removes the value at the front of the queue, blocking until one is
  /// available.
  pub fn wait_and_pop(&self) -> T {
    let mut state = self.state.lock();

    loop {
      if let Some(value) = state.pop_front() {
        return value;
      }

      self.signal.wait(&mut state);
    }
  }

  /// Returns the number of values currently in the queue.
  pub fn len(&self) -> usize {
    self.state.lock().len()
  }

  /// Returns `true` if the queue currently contains no values.
  pub fn is_empty(&self) -> bool {
    self.state.lock().is_empty()
  }

  /// Removes all values from the queue.
  pub fn clear(&self) {
    self.state.lock().clear();
  }
}

impl<T> Default for SharedQueue<T> {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl<T> Debug for SharedQueue<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    f.debug_struct("SharedQueue").field("len", &self.len()).finish_non_exhaustive()
  }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::sync::Barrier;
  use std::thread;

  use super::*;

  #[test]
  fn test_push_try_pop_fifo() {
    let queue: SharedQueue<u32> = SharedQueue::new();

    queue.push(1);
    queue.push(2);
    queue.push(3);

    assert_eq!(queue.try_pop(), Some(1));
    assert_eq!(queue.try_pop(), Some(2));
    assert_eq!(queue.try_pop(), Some(3));
    assert_eq!(queue.try_pop(), None);
  }

  #[test]
  fn test_len_and_is_empty() {
    let queue: SharedQueue<u32> = SharedQueue::new();

    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);

    queue.push(7);

    assert!(!queue.is_empty());
    assert_eq!(queue.len(), 1);
  }

  #[test]
  fn test_clear() {
    let queue: SharedQueue<u32> = SharedQueue::new();

    queue.push(1);
    queue.push(2);
    queue.clear();

    assert!(queue.is_empty());
    assert_eq!(queue.try_pop(), None);
  }

  #[test]
  fn test_wait_and_pop_blocks_until_push() {
    let queue: Arc<SharedQueue<u32>> = Arc::new(SharedQueue::new());
    let barrier: Arc<Barrier> = Arc::new(Barrier::new(2));

    let waiter = {
      let queue: Arc<SharedQueue<u32>> = Arc::clone(&queue);
      let barrier: Arc<Barrier> = Arc::clone(&barrier);

      thread::spawn(move || {
        barrier.wait();
        queue.wait_and_pop()
      })
    };

    barrier.wait();
    queue.push(42);

    assert_eq!(waiter.join().unwrap(), 42);
  }

  #[test]
  fn test_concurrent_push_pop_preserves_values() {
    const PER_THREAD: usize = 1000;

    let queue: Arc<SharedQueue<usize>> = Arc::new(SharedQueue::new());

    let producers: Vec<_> = (0..4)
      .map(|thread| {
        let queue: Arc<SharedQueue<usize>> = Arc::clone(&queue);

        thread::spawn(move || {
          for index in 0..PER_THREAD {
            queue.push(thread * PER_THREAD + index);
          }
        })
      })
      .collect();

    for producer in producers {
      producer.join().unwrap();
    }

    let mut seen: Vec<usize> = Vec::with_capacity(4 * PER_THREAD);

    while let Some(value) = queue.try_pop() {
      seen.push(value);
    }

    seen.sort_unstable();

    assert_eq!(seen.len(), 4 * PER_THREAD);
    assert!(seen.iter().enumerate().all(|(index, value)| index == *value));
  }
}
