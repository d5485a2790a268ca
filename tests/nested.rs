//! Entities holding handles into other storages form directed graphs that
//! release level by level as the naming handles drop.

use keid::types::Handle;
use keid::types::Storage;

struct Leaf {
  a: f64,
  b: f64,
  c: i32,
  d: i32,
}

struct Branch<'leaf> {
  e: f64,
  leaf: Handle<'leaf, Leaf, u16, i16, 2>,
}

struct Root<'leaf, 'branch> {
  f: f64,
  branch: Handle<'branch, Branch<'leaf>, u16, i16, 2>,
}

#[test]
fn field_list_construction_is_fieldwise() {
  let leaves: Storage<Leaf, u16, i16, 2> = Storage::new();
  let leaf = leaves.make_entity(Leaf {
    a: 1.0,
    b: 2.0,
    c: 3,
    d: 4,
  });

  assert_eq!(leaf.a, 1.0);
  assert_eq!(leaf.b, 2.0);
  assert_eq!(leaf.c, 3);
  assert_eq!(leaf.d, 4);
}

#[test]
fn deep_graph_dereferences_through_levels() {
  let leaves: Storage<Leaf, u16, i16, 2> = Storage::new();
  let branches: Storage<Branch<'_>, u16, i16, 2> = Storage::new();
  let roots: Storage<Root<'_, '_>, u16, i16, 2> = Storage::new();

  let r1 = leaves.make_entity(Leaf {
    a: 1.0,
    b: 2.0,
    c: 3,
    d: 4,
  });

  let r2 = branches.make_entity(Branch {
    e: 5.0,
    leaf: r1.clone(),
  });

  let r3 = roots.make_entity(Root {
    f: 6.0,
    branch: r2.clone(),
  });

  assert_eq!(r1.d, 4);
  assert_eq!(r2.leaf.d, 4);
  assert_eq!(r3.branch.leaf.d, 4);

  // Copy the root once, drop everything else; each level keeps exactly the
  // share held by the entity that names it.
  let copy = r3.clone();

  drop(r3);
  drop(r2);
  drop(r1);

  assert_eq!(copy.branch.leaf.d, 4);
  assert_eq!(copy.strong_count(), 1);
  assert_eq!(copy.branch.strong_count(), 1);
  assert_eq!(copy.branch.leaf.strong_count(), 1);
}

#[test]
fn graphs_build_inline_without_local_bindings() {
  let leaves: Storage<Leaf, u16, i16, 2> = Storage::new();
  let branches: Storage<Branch<'_>, u16, i16, 2> = Storage::new();
  let roots: Storage<Root<'_, '_>, u16, i16, 2> = Storage::new();

  let root = roots.make_entity(Root {
    f: 6.0,
    branch: branches.make_entity(Branch {
      e: 5.0,
      leaf: leaves.make_entity(Leaf {
        a: 1.0,
        b: 2.0,
        c: 3,
        d: 4,
      }),
    }),
  });

  assert_eq!(root.branch.leaf.d, 4);

  // Moves into the graph transfer ownership without extra shares.
  assert_eq!(root.strong_count(), 1);
  assert_eq!(root.branch.strong_count(), 1);
  assert_eq!(root.branch.leaf.strong_count(), 1);
}
