use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

use crate::BTreeError;

pub type Key = [u8; 8];

/// Fixed page header: `is_leaf`(1) + `num_keys`(2) + `page_id`(4 signed) +
/// `parent_id`(8 signed) = 15 bytes. All multi-byte fields little-endian.
pub const HEADER_LEN: usize = 1 + 2 + 4 + 8;
const ENTRY_LEN: usize = 16; // 8-byte key + 8-byte signed pointer
const TRAILING_LEN: usize = 8;

/// Maximum number of (key, pointer) entries a page can hold before it must
/// split: `(PAGE_SIZE - HEADER_LEN - TRAILING_LEN) / ENTRY_LEN`.
pub const CAPACITY: usize = (rdb_storage::PAGE_SIZE - HEADER_LEN - TRAILING_LEN) / ENTRY_LEN;

/// A decoded B+ tree page: either an internal routing node or a leaf.
///
/// Both variants share one physical layout: a header, `num_keys` sorted
/// `(key, pointer)` entries, and one trailing pointer. For an internal page
/// the trailing pointer is the rightmost child; for a leaf it is the
/// `next_leaf` sibling link (`-1` if none).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub is_leaf: bool,
    pub page_id: i64,
    pub parent_id: i64,
    pub entries: Vec<(Key, i64)>,
    pub trailing: i64,
}

impl Page {
    pub fn new_leaf(page_id: i64, parent_id: i64, entries: Vec<(Key, i64)>, next_leaf: i64) -> Self {
        Self {
            is_leaf: true,
            page_id,
            parent_id,
            entries,
            trailing: next_leaf,
        }
    }

    pub fn new_internal(page_id: i64, parent_id: i64, entries: Vec<(Key, i64)>, rightmost: i64) -> Self {
        Self {
            is_leaf: false,
            page_id,
            parent_id,
            entries,
            trailing: rightmost,
        }
    }

    pub fn next_leaf(&self) -> i64 {
        debug_assert!(self.is_leaf);
        self.trailing
    }

    /// Serializes this page to exactly [`rdb_storage::PAGE_SIZE`] bytes.
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(rdb_storage::PAGE_SIZE);
        buf.push(if self.is_leaf { 1 } else { 0 });
        buf.write_u16::<LittleEndian>(self.entries.len() as u16).unwrap();
        buf.write_i32::<LittleEndian>(self.page_id as i32).unwrap();
        buf.write_i64::<LittleEndian>(self.parent_id).unwrap();

        for (key, ptr) in &self.entries {
            buf.extend_from_slice(key);
            buf.write_i64::<LittleEndian>(*ptr).unwrap();
        }
        buf.write_i64::<LittleEndian>(self.trailing).unwrap();

        buf.resize(rdb_storage::PAGE_SIZE, 0);
        buf
    }

    /// Parses a raw page previously produced by [`Page::pack`].
    pub fn unpack(bytes: &[u8]) -> Result<Self, BTreeError> {
        if bytes.len() != rdb_storage::PAGE_SIZE {
            return Err(BTreeError::BadPage {
                reason: format!("page is {} bytes, expected {}", bytes.len(), rdb_storage::PAGE_SIZE),
            });
        }
        let mut cursor = Cursor::new(bytes);

        let mut is_leaf_byte = [0u8; 1];
        cursor.read_exact(&mut is_leaf_byte)?;
        let is_leaf = match is_leaf_byte[0] {
            0 => false,
            1 => true,
            other => {
                return Err(BTreeError::BadPage {
                    reason: format!("invalid is_leaf byte: {}", other),
                })
            }
        };

        let num_keys = cursor.read_u16::<LittleEndian>()? as usize;
        if num_keys > CAPACITY {
            return Err(BTreeError::BadPage {
                reason: format!("num_keys {} exceeds capacity {}", num_keys, CAPACITY),
            });
        }
        let page_id = cursor.read_i32::<LittleEndian>()? as i64;
        let parent_id = cursor.read_i64::<LittleEndian>()?;

        let mut entries = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            let mut key = [0u8; 8];
            cursor.read_exact(&mut key)?;
            let ptr = cursor.read_i64::<LittleEndian>()?;
            entries.push((key, ptr));
        }
        let trailing = cursor.read_i64::<LittleEndian>()?;

        Ok(Page {
            is_leaf,
            page_id,
            parent_id,
            entries,
            trailing,
        })
    }
}

/// Index of the first entry whose key is strictly greater than `key`
/// (the standard "upper bound" used both for routing and for stable
/// duplicate-tolerant insertion).
pub fn upper_bound(entries: &[(Key, i64)], key: &Key) -> usize {
    entries.partition_point(|(k, _)| k <= key)
}

/// The child pointer an internal page routes to for `idx = upper_bound(...)`.
pub fn pointer_at(page: &Page, idx: usize) -> i64 {
    if idx < page.entries.len() {
        page.entries[idx].1
    } else {
        page.trailing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> Key {
        [0, 0, 0, 0, 0, 0, 0, n]
    }

    #[test]
    fn leaf_round_trips_through_pack_unpack() {
        let page = Page::new_leaf(1, -1, vec![(key(1), 100), (key(2), 200)], -1);
        let bytes = page.pack();
        assert_eq!(bytes.len(), rdb_storage::PAGE_SIZE);
        let back = Page::unpack(&bytes).unwrap();
        assert_eq!(back, page);
    }

    #[test]
    fn internal_round_trips_through_pack_unpack() {
        let page = Page::new_internal(3, 0, vec![(key(5), 10)], 11);
        let bytes = page.pack();
        let back = Page::unpack(&bytes).unwrap();
        assert_eq!(back, page);
    }

    #[test]
    fn upper_bound_finds_first_strictly_greater() {
        let entries = vec![(key(1), 0), (key(3), 0), (key(5), 0)];
        assert_eq!(upper_bound(&entries, &key(0)), 0);
        assert_eq!(upper_bound(&entries, &key(1)), 1);
        assert_eq!(upper_bound(&entries, &key(4)), 2);
        assert_eq!(upper_bound(&entries, &key(5)), 3);
        assert_eq!(upper_bound(&entries, &key(9)), 3);
    }

    #[test]
    fn pointer_at_routes_through_trailing_past_last_entry() {
        let page = Page::new_internal(0, -1, vec![(key(5), 10)], 20);
        assert_eq!(pointer_at(&page, 0), 10);
        assert_eq!(pointer_at(&page, 1), 20);
    }
}
