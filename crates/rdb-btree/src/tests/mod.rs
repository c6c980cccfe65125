mod delete;

use crate::tree::MIN_KEYS;
use crate::{BPlusTree, Key};
use std::collections::HashMap;
use tempfile::tempdir;

pub fn new_tree() -> (tempfile::TempDir, BPlusTree) {
    let dir = tempdir().unwrap();
    let tree = BPlusTree::open(dir.path().join("index.idx")).unwrap();
    (dir, tree)
}

pub fn key(n: u64) -> Key {
    n.to_be_bytes()
}

/// Walks every page reachable from the root and asserts:
/// - every non-root page holds at least `MIN_KEYS - 1` entries. A bare
///   split leaves the smaller half one below `MIN_KEYS`; that floor, not
///   `MIN_KEYS` itself, is what survives at command boundaries.
/// - every child's `parent_id` (routed to by an internal page's entries or
///   its trailing pointer) matches that internal page's own id.
pub fn assert_structural_invariants(tree: &BPlusTree) {
    let (root_id, pages) = tree.debug_snapshot().unwrap();
    let by_id: HashMap<i64, _> = pages.iter().map(|p| (p.page_id, p)).collect();
    let floor = MIN_KEYS - 1;

    for page in &pages {
        if page.page_id != root_id {
            assert!(
                page.entries.len() >= floor,
                "page {} underflowed: {} entries, floor is {}",
                page.page_id,
                page.entries.len(),
                floor
            );
        }

        if !page.is_leaf {
            for (_, child_id) in &page.entries {
                let child = by_id.get(child_id).expect("child page reachable from parent");
                assert_eq!(child.parent_id, page.page_id, "child {} has the wrong parent_id", child_id);
            }
            let trailing = by_id.get(&page.trailing).expect("trailing child reachable from parent");
            assert_eq!(
                trailing.parent_id, page.page_id,
                "trailing child {} has the wrong parent_id",
                page.trailing
            );
        }
    }
}

#[test]
fn fresh_tree_has_an_empty_root_leaf() {
    let (_dir, tree) = new_tree();
    assert_eq!(tree.search(&key(0)).unwrap(), None);
    assert_eq!(tree.range_search(&key(0), &key(u64::MAX)).unwrap(), vec![]);
}
