use super::{assert_structural_invariants, key, new_tree};

#[test]
fn delete_missing_key_returns_false() {
    let (_dir, tree) = new_tree();
    tree.insert(key(1), 1).unwrap();
    assert!(!tree.delete(&key(2)).unwrap());
}

#[test]
fn delete_removes_the_key_from_search() {
    let (_dir, tree) = new_tree();
    tree.insert(key(1), 10).unwrap();
    tree.insert(key(2), 20).unwrap();

    assert!(tree.delete(&key(1)).unwrap());
    assert_eq!(tree.search(&key(1)).unwrap(), None);
    assert_eq!(tree.search(&key(2)).unwrap(), Some(20));
}

#[test]
fn deleting_every_key_leaves_an_empty_tree() {
    let (_dir, tree) = new_tree();
    for i in 0..50u64 {
        tree.insert(key(i), i as i64).unwrap();
    }
    for i in 0..50u64 {
        assert!(tree.delete(&key(i)).unwrap(), "failed to delete {}", i);
    }
    assert_eq!(tree.range_search(&key(0), &key(49)).unwrap(), vec![]);
    assert_structural_invariants(&tree);
}

#[test]
fn heavy_insert_then_delete_preserves_remaining_keys() {
    let (_dir, tree) = new_tree();
    let n = 3_000u64;
    for i in 0..n {
        tree.insert(key(i), i as i64).unwrap();
    }
    // delete every third key, forcing repeated borrow/merge rebalancing
    for i in (0..n).step_by(3) {
        assert!(tree.delete(&key(i)).unwrap());
    }
    for i in 0..n {
        let expected = if i % 3 == 0 { None } else { Some(i as i64) };
        assert_eq!(tree.search(&key(i)).unwrap(), expected, "key {}", i);
    }
    assert_structural_invariants(&tree);
}

#[test]
fn deleting_one_of_a_duplicate_key_leaves_the_others() {
    let (_dir, tree) = new_tree();
    tree.insert(key(7), 1).unwrap();
    tree.insert(key(7), 2).unwrap();
    tree.insert(key(7), 3).unwrap();

    assert!(tree.delete(&key(7)).unwrap());
    let remaining = tree.range_search(&key(7), &key(7)).unwrap();
    assert_eq!(remaining.len(), 2);
}

#[test]
fn rebuild_from_data_replaces_all_existing_entries() {
    let (_dir, tree) = new_tree();
    tree.insert(key(1), 1).unwrap();
    tree.insert(key(2), 2).unwrap();

    let fresh = vec![(key(10), 10), (key(20), 20), (key(30), 30)];
    tree.build_from_data(fresh.into_iter()).unwrap();

    assert_eq!(tree.search(&key(1)).unwrap(), None);
    assert_eq!(tree.search(&key(10)).unwrap(), Some(10));
    assert_eq!(tree.search(&key(30)).unwrap(), Some(30));
    assert_structural_invariants(&tree);
}
