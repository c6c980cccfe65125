use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use rdb_storage::BlockCursor;
use std::collections::HashSet;
use std::path::Path;

use crate::page::{pointer_at, upper_bound, Page, CAPACITY};
use crate::{BTreeError, Key};

/// Minimum number of entries a non-root page must hold after rebalancing.
pub(crate) const MIN_KEYS: usize = (CAPACITY + 2) / 2;

const NO_CHILD: i64 = -1;

/// A disk-resident B+ tree index file: block 0 is the super-header (the
/// root page id), blocks 1.. are [`Page`]s.
pub struct BPlusTree {
    cursor: BlockCursor,
}

impl BPlusTree {
    /// Opens an existing index file, or initializes a fresh empty tree if
    /// the file does not yet exist (super-header at block 0, `root_block =
    /// 1`, a single empty leaf at block 1 with `parent_id = -1`).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BTreeError> {
        let cursor = BlockCursor::open(path)?;
        let tree = Self { cursor };
        let total = tree.cursor.total_blocks()?;
        if total == 0 {
            tree.init_empty()?;
        } else {
            tree.validate_super_header(total)?;
        }
        Ok(tree)
    }

    fn validate_super_header(&self, total_blocks: u64) -> Result<(), BTreeError> {
        let root = self.root_block()?;
        if root < 1 || root as u64 >= total_blocks {
            return Err(BTreeError::CorruptSuperHeader {
                reason: format!("root_block {} out of range (file has {} blocks)", root, total_blocks),
            });
        }
        Ok(())
    }

    fn init_empty(&self) -> Result<(), BTreeError> {
        let root_leaf = Page::new_leaf(1, NO_CHILD, Vec::new(), NO_CHILD);
        self.write_super_header(1)?; // block 0
        let assigned = self.append_page(&root_leaf)?; // block 1
        debug_assert_eq!(assigned, 1);
        Ok(())
    }

    // ---- super-header -------------------------------------------------

    fn root_block(&self) -> Result<i64, BTreeError> {
        let block = self.cursor.read_block(0)?;
        let mut slice = &block[0..8];
        Ok(slice.read_i64::<LittleEndian>()?)
    }

    fn write_super_header(&self, root: i64) -> Result<(), BTreeError> {
        let mut block = vec![0u8; rdb_storage::PAGE_SIZE];
        (&mut block[0..8]).write_i64::<LittleEndian>(root)?;
        if self.cursor.total_blocks()? == 0 {
            let assigned = self.cursor.append_block(&block)?;
            debug_assert_eq!(assigned, 0);
        } else {
            self.cursor.write_block(0, &block)?;
        }
        Ok(())
    }

    // ---- page I/O -------------------------------------------------------

    fn read_page(&self, id: i64) -> Result<Page, BTreeError> {
        let block = self.cursor.read_block(id as u64)?;
        Page::unpack(&block)
    }

    fn write_page(&self, page: &Page) -> Result<(), BTreeError> {
        self.cursor.write_block(page.page_id as u64, &page.pack())?;
        Ok(())
    }

    /// Appends `page` at the next free block, asserting the block it lands
    /// on matches `page.page_id` (callers must reserve the id first via
    /// [`Self::reserve_page_id`]).
    fn append_page(&self, page: &Page) -> Result<i64, BTreeError> {
        let assigned = self.cursor.append_block(&page.pack())?;
        debug_assert_eq!(assigned as i64, page.page_id);
        Ok(assigned as i64)
    }

    fn reserve_page_id(&self) -> Result<i64, BTreeError> {
        Ok(self.cursor.total_blocks()? as i64)
    }

    fn set_parent(&self, child_id: i64, new_parent: i64) -> Result<(), BTreeError> {
        let mut child = self.read_page(child_id)?;
        child.parent_id = new_parent;
        self.write_page(&child)
    }

    // ---- search ---------------------------------------------------------

    /// Descends from the root, returning the leaf page that may contain
    /// `key`. Routing choices are not recorded.
    fn find_leaf(&self, key: &Key) -> Result<Page, BTreeError> {
        let mut current = self.read_page(self.root_block()?)?;
        while !current.is_leaf {
            let idx = upper_bound(&current.entries, key);
            let child = pointer_at(&current, idx);
            current = self.read_page(child)?;
        }
        Ok(current)
    }

    /// Returns the first record offset stored under `key`, if any. The tree
    /// tolerates duplicate keys; this returns the first one found.
    pub fn search(&self, key: &Key) -> Result<Option<i64>, BTreeError> {
        let leaf = self.find_leaf(key)?;
        Ok(leaf
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, ptr)| *ptr))
    }

    /// Returns every offset whose key lies in `[begin, end]`, in ascending
    /// key order. Guards against a corrupted `next_leaf` cycle with a
    /// visited-page set.
    pub fn range_search(&self, begin: &Key, end: &Key) -> Result<Vec<i64>, BTreeError> {
        let mut out = Vec::new();
        let mut leaf = self.find_leaf(begin)?;
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(leaf.page_id) {
                break; // cycle in next_leaf chain
            }
            for (k, ptr) in &leaf.entries {
                if k < begin {
                    continue;
                }
                if k > end {
                    return Ok(out);
                }
                out.push(*ptr);
            }
            let next = leaf.next_leaf();
            if next == NO_CHILD {
                break;
            }
            leaf = self.read_page(next)?;
        }
        Ok(out)
    }

    // ---- insert -----------------------------------------------------------

    /// Inserts `(key, offset)`. Duplicate keys are permitted and placed
    /// after all existing equal entries (stable insertion).
    pub fn insert(&self, key: Key, offset: i64) -> Result<(), BTreeError> {
        let mut stack = Vec::new();
        let mut current = self.read_page(self.root_block()?)?;
        while !current.is_leaf {
            let idx = upper_bound(&current.entries, &key);
            stack.push(current.page_id);
            current = self.read_page(pointer_at(&current, idx))?;
        }

        let mut leaf = current;
        let idx = upper_bound(&leaf.entries, &key);
        leaf.entries.insert(idx, (key, offset));

        if leaf.entries.len() <= CAPACITY {
            self.write_page(&leaf)?;
            return Ok(());
        }

        let (right_id, promoted_key) = self.split_leaf(&mut leaf)?;
        self.write_page(&leaf)?;

        self.propagate_split(stack, leaf.page_id, right_id, promoted_key)
    }

    fn split_leaf(&self, leaf: &mut Page) -> Result<(i64, Key), BTreeError> {
        let mid = leaf.entries.len() / 2;
        let right_entries = leaf.entries.split_off(mid);
        let promoted_key = right_entries[0].0;
        let old_next = leaf.next_leaf();

        let right_id = self.reserve_page_id()?;
        let right_page = Page::new_leaf(right_id, leaf.parent_id, right_entries, old_next);
        self.append_page(&right_page)?;

        leaf.trailing = right_id; // next_leaf rewired to the new sibling
        Ok((right_id, promoted_key))
    }

    /// Inserts `(sep_key, left_id)` into each ancestor in `stack` (innermost
    /// last), splitting further as needed, and creates a new root if the
    /// stack is exhausted while still overflowing.
    fn propagate_split(
        &self,
        mut stack: Vec<i64>,
        mut left_id: i64,
        mut right_id: i64,
        mut sep_key: Key,
    ) -> Result<(), BTreeError> {
        while let Some(parent_id) = stack.pop() {
            let mut parent = self.read_page(parent_id)?;
            let idx = upper_bound(&parent.entries, &sep_key);

            if idx < parent.entries.len() {
                parent.entries.insert(idx, (sep_key, left_id));
                parent.entries[idx + 1].1 = right_id;
            } else {
                parent.entries.push((sep_key, left_id));
                parent.trailing = right_id;
            }
            self.set_parent(right_id, parent_id)?;

            if parent.entries.len() <= CAPACITY {
                self.write_page(&parent)?;
                return Ok(());
            }

            let (new_right_id, promoted) = self.split_internal(&mut parent)?;
            self.write_page(&parent)?;

            left_id = parent.page_id;
            right_id = new_right_id;
            sep_key = promoted;
        }

        // Stack exhausted: still overflowing at the root. Create a new root.
        let new_root_id = self.reserve_page_id()?;
        let new_root = Page::new_internal(new_root_id, NO_CHILD, vec![(sep_key, left_id)], right_id);
        self.append_page(&new_root)?;
        self.set_parent(left_id, new_root_id)?;
        self.set_parent(right_id, new_root_id)?;
        self.write_super_header(new_root_id)
    }

    fn split_internal(&self, node: &mut Page) -> Result<(i64, Key), BTreeError> {
        let mid = node.entries.len() / 2;
        let mid_entry = node.entries[mid];
        let right_entries: Vec<_> = node.entries.split_off(mid + 1);
        node.entries.truncate(mid);

        let right_id = self.reserve_page_id()?;
        let right_trailing = node.trailing;
        let right_page = Page::new_internal(right_id, node.parent_id, right_entries.clone(), right_trailing);
        self.append_page(&right_page)?;

        for (_, ptr) in &right_entries {
            self.set_parent(*ptr, right_id)?;
        }
        self.set_parent(right_trailing, right_id)?;

        node.trailing = mid_entry.1; // left keeps the middle pointer as its new rightmost child
        Ok((right_id, mid_entry.0))
    }

    // ---- delete -----------------------------------------------------------

    /// Removes the first entry matching `key`. Returns `false` if no such
    /// entry exists. On underflow, attempts to borrow from a sibling and
    /// falls back to merging, propagating rebalances up to the root.
    pub fn delete(&self, key: &Key) -> Result<bool, BTreeError> {
        let mut stack = Vec::new(); // (parent_id, child_index)
        let mut current = self.read_page(self.root_block()?)?;
        while !current.is_leaf {
            let idx = upper_bound(&current.entries, key);
            stack.push((current.page_id, idx));
            current = self.read_page(pointer_at(&current, idx))?;
        }

        let pos = match current.entries.iter().position(|(k, _)| k == key) {
            Some(p) => p,
            None => return Ok(false),
        };
        current.entries.remove(pos);

        self.rebalance(current, stack)?;
        Ok(true)
    }

    /// Writes `node` back, borrowing or merging with a sibling if it has
    /// underflowed, propagating further up `stack` as needed.
    fn rebalance(&self, mut node: Page, mut stack: Vec<(i64, usize)>) -> Result<(), BTreeError> {
        loop {
            let Some((parent_id, child_idx)) = stack.pop() else {
                // `node` is the root.
                if !node.is_leaf && node.entries.is_empty() {
                    let new_root_id = node.trailing;
                    let mut new_root = self.read_page(new_root_id)?;
                    new_root.parent_id = NO_CHILD;
                    self.write_page(&new_root)?;
                    self.write_super_header(new_root_id)?;
                } else {
                    self.write_page(&node)?;
                }
                return Ok(());
            };

            if node.entries.len() >= MIN_KEYS {
                self.write_page(&node)?;
                return Ok(());
            }

            let mut parent = self.read_page(parent_id)?;
            let has_left = child_idx > 0;
            let has_right = child_idx < parent.entries.len();

            if has_left {
                let left_id = pointer_at(&parent, child_idx - 1);
                let mut left = self.read_page(left_id)?;
                if left.entries.len() > MIN_KEYS {
                    self.borrow_from_left(&mut node, &mut left, &mut parent, child_idx - 1)?;
                    self.write_page(&left)?;
                    self.write_page(&node)?;
                    self.write_page(&parent)?;
                    return Ok(());
                }
            }

            if has_right {
                let right_id = pointer_at(&parent, child_idx + 1);
                let mut right = self.read_page(right_id)?;
                if right.entries.len() > MIN_KEYS {
                    self.borrow_from_right(&mut node, &mut right, &mut parent, child_idx)?;
                    self.write_page(&right)?;
                    self.write_page(&node)?;
                    self.write_page(&parent)?;
                    return Ok(());
                }
            }

            if has_left {
                let left_id = pointer_at(&parent, child_idx - 1);
                let mut left = self.read_page(left_id)?;
                self.merge_into_left(&mut left, &mut node, &mut parent, child_idx - 1)?;
                self.write_page(&left)?;
            } else {
                let right_id = pointer_at(&parent, child_idx + 1);
                let mut right = self.read_page(right_id)?;
                self.merge_into_left(&mut node, &mut right, &mut parent, child_idx)?;
                self.write_page(&node)?;
            }

            node = parent;
        }
    }

    fn borrow_from_left(
        &self,
        node: &mut Page,
        left: &mut Page,
        parent: &mut Page,
        sep_idx: usize,
    ) -> Result<(), BTreeError> {
        if node.is_leaf {
            let borrowed = left.entries.pop().unwrap();
            node.entries.insert(0, borrowed);
            parent.entries[sep_idx].0 = node.entries[0].0;
        } else {
            let last = left.entries.pop().unwrap();
            let moved_ptr = left.trailing;
            left.trailing = last.1;
            let separator = parent.entries[sep_idx].0;
            node.entries.insert(0, (separator, moved_ptr));
            self.set_parent(moved_ptr, node.page_id)?;
            parent.entries[sep_idx].0 = last.0;
        }
        Ok(())
    }

    fn borrow_from_right(
        &self,
        node: &mut Page,
        right: &mut Page,
        parent: &mut Page,
        sep_idx: usize,
    ) -> Result<(), BTreeError> {
        if node.is_leaf {
            let borrowed = right.entries.remove(0);
            node.entries.push(borrowed);
            parent.entries[sep_idx].0 = right.entries[0].0;
        } else {
            let first = right.entries.remove(0);
            let moved_ptr = first.1;
            let separator = parent.entries[sep_idx].0;
            let old_trailing = node.trailing;
            node.entries.push((separator, old_trailing));
            node.trailing = moved_ptr;
            self.set_parent(moved_ptr, node.page_id)?;
            parent.entries[sep_idx].0 = first.0;
        }
        Ok(())
    }

    /// Merges `right` into `left` (the survivor), then removes the now-dead
    /// pointer slot from `parent` at pointer-index `left_idx`.
    fn merge_into_left(
        &self,
        left: &mut Page,
        right: &mut Page,
        parent: &mut Page,
        left_idx: usize,
    ) -> Result<(), BTreeError> {
        if left.is_leaf {
            left.entries.extend(right.entries.drain(..));
            left.trailing = right.trailing; // inherit next_leaf
        } else {
            let separator = parent.entries[left_idx].0;
            left.entries.push((separator, left.trailing));
            left.entries.extend(right.entries.drain(..));
            left.trailing = right.trailing;
            // Re-stamp every child's parent_id; cheap relative to the
            // structural change and avoids tracking which entries are new.
            let reparent_ids: Vec<i64> = left
                .entries
                .iter()
                .map(|(_, p)| *p)
                .chain(std::iter::once(left.trailing))
                .collect();
            for id in reparent_ids {
                self.set_parent(id, left.page_id)?;
            }
        }

        parent.entries.remove(left_idx);
        if left_idx < parent.entries.len() {
            parent.entries[left_idx].1 = left.page_id;
        } else {
            parent.trailing = left.page_id;
        }
        Ok(())
    }

    // ---- bulk load ----------------------------------------------------

    /// Rebuilds the tree from scratch: discards the current contents and
    /// inserts every `(key, offset)` pair from `entries` in order. Callers
    /// decide what to feed in (e.g. skipping tombstoned heap records).
    pub fn build_from_data(&self, entries: impl Iterator<Item = (Key, i64)>) -> Result<(), BTreeError> {
        self.cursor.truncate()?;
        self.init_empty()?;
        for (key, offset) in entries {
            self.insert(key, offset)?;
        }
        Ok(())
    }

    // ---- test support ---------------------------------------------------

    /// Returns the root page id and every page reachable from it, for
    /// structural invariant checks (parent pointers, minimum occupancy).
    #[cfg(test)]
    pub(crate) fn debug_snapshot(&self) -> Result<(i64, Vec<Page>), BTreeError> {
        let root_id = self.root_block()?;
        let mut pages = Vec::new();
        let mut stack = vec![root_id];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let page = self.read_page(id)?;
            if !page.is_leaf {
                for (_, ptr) in &page.entries {
                    stack.push(*ptr);
                }
                stack.push(page.trailing);
            }
            pages.push(page);
        }
        Ok((root_id, pages))
    }
}
