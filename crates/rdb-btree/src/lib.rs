//! # B+ tree: the on-disk ordered index
//!
//! A paged, disk-resident B+ tree mapping an opaque 8-byte [key][rdb_storage]
//! to a signed 64-bit pointer (a heap record offset, for every index this
//! engine builds). The tree is generic over "8 ordered bytes": it never
//! looks at column types, so all type-specific ordering logic stays in
//! `rdb-codec`.
//!
//! Block 0 of every index file is a super-header holding the current root
//! page id. Blocks 1.. are [`Page`]s, each exactly 4096 bytes.

mod page;
mod tree;

pub use page::{pointer_at, upper_bound, Key, Page, CAPACITY, HEADER_LEN};
pub use tree::BPlusTree;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BTreeError {
    #[error(transparent)]
    Storage(#[from] rdb_storage::StorageError),

    #[error("bad page: {reason}")]
    BadPage { reason: String },

    #[error("malformed super-header: {reason}")]
    CorruptSuperHeader { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests;
