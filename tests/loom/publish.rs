use keid::types::Storage;
use loom::thread;
use triomphe::Arc;

type SmallStorage = Storage<u64, u8, i8, 1>;

#[test]
fn concurrent_first_allocations_grow_one_buffer() {
  loom::model(|| {
    let storage: Arc<SmallStorage> = Arc::new(Storage::new());

    let t1 = {
      let storage: Arc<SmallStorage> = Arc::clone(&storage);

      thread::spawn(move || {
        let handle = storage.make_entity(1);
        assert_eq!(*handle, 1);
        handle.index()
      })
    };

    let t2 = {
      let storage: Arc<SmallStorage> = Arc::clone(&storage);

      thread::spawn(move || {
        let handle = storage.make_entity(2);
        assert_eq!(*handle, 2);
        handle.index()
      })
    };

    let i1: u8 = t1.join().unwrap();
    let i2: u8 = t2.join().unwrap();

    assert_ne!(i1, i2, "concurrent allocations shared a slot");

    // Both indices land in the first buffer; exactly one thread published it.
    assert_eq!(storage.reserved(), 2);
    assert_eq!(storage.capacity(), 2);
  });
}

#[test]
fn waiting_allocation_observes_published_buffer() {
  loom::model(|| {
    let storage: Arc<SmallStorage> = Arc::new(Storage::new());

    // Fill the first buffer so the workers race across a buffer boundary:
    // one of them must publish the second buffer while the other waits.
    let h0 = storage.make_entity(0);
    let h1 = storage.make_entity(1);

    let t1 = {
      let storage: Arc<SmallStorage> = Arc::clone(&storage);

      thread::spawn(move || {
        let handle = storage.make_entity(10);
        assert_eq!(*handle, 10);
        handle.index()
      })
    };

    let t2 = {
      let storage: Arc<SmallStorage> = Arc::clone(&storage);

      thread::spawn(move || {
        let handle = storage.make_entity(20);
        assert_eq!(*handle, 20);
        handle.index()
      })
    };

    let i1: u8 = t1.join().unwrap();
    let i2: u8 = t2.join().unwrap();

    assert_ne!(i1, i2);
    assert_eq!(storage.reserved(), 4);
    assert_eq!(storage.capacity(), 4);

    drop(h0);
    drop(h1);
  });
}
