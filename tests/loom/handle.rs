use keid::types::Storage;
use loom::thread;

type SmallStorage = Storage<u64, u8, i8, 1>;

#[test]
fn concurrent_clone_drop_frees_slot_exactly_once() {
  loom::model(|| {
    // Handles borrow their storage, and loom threads need `'static`
    // captures, so the storage is leaked for the duration of the model and
    // reclaimed at the end once every handle is gone.
    let raw: *mut SmallStorage = Box::into_raw(Box::new(Storage::new()));

    // SAFETY: The box outlives every use below.
    let storage: &'static SmallStorage = unsafe { &*raw };

    let h1 = storage.make_entity(7);
    let h2 = h1.clone();

    let t1 = thread::spawn(move || {
      assert_eq!(*h2, 7);
      drop(h2);
    });

    drop(h1);

    t1.join().unwrap();

    // Whichever thread dropped last pushed the slot to its own pool; after
    // both drops the slot is reachable again, through the local pool or the
    // worker's exit spill, and no second copy of the index exists.
    let h3 = storage.make_entity(9);

    assert_eq!(h3.index(), 0);
    assert_eq!(*h3, 9);
    assert_eq!(h3.strong_count(), 1);
    assert_eq!(storage.reserved(), 1);

    drop(h3);

    // SAFETY: All handles are dropped; reclaim the leaked storage.
    unsafe {
      drop(Box::from_raw(raw));
    }
  });
}

#[test]
fn reader_observes_initialized_entity() {
  loom::model(|| {
    let raw: *mut SmallStorage = Box::into_raw(Box::new(Storage::new()));

    // SAFETY: The box outlives every use below.
    let storage: &'static SmallStorage = unsafe { &*raw };

    let handle = storage.make_entity(0xAB);
    let clone = handle.clone();

    let t1 = thread::spawn(move || {
      // The clone travelled to this thread; the entity bytes written before
      // the handle was bound must be visible here.
      assert_eq!(*clone, 0xAB);
    });

    t1.join().unwrap();

    drop(handle);

    // SAFETY: All handles are dropped; reclaim the leaked storage.
    unsafe {
      drop(Box::from_raw(raw));
    }
  });
}
