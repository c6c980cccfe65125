//! # Storage: fixed-width file access
//!
//! Every on-disk structure in this engine is a sequence of fixed-size
//! elements: 4096-byte pages for the B+ tree index, fixed-size records for
//! the heap file. [`BlockCursor`] and [`RecordCursor`] give both a uniform
//! `read_at` / `write_at` / `append` interface over a plain [`std::fs::File`],
//! so the index and heap crates never deal with `Seek` or byte offsets
//! directly.

mod block;
mod record;

pub use block::{BlockCursor, PAGE_SIZE};
pub use record::RecordCursor;

use thiserror::Error;

/// Errors raised while reading or writing fixed-width elements.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("element index {index} out of bounds (file holds {total})")]
    OutOfBounds { index: u64, total: u64 },

    #[error("expected element of {expected} bytes, got {got}")]
    SizeMismatch { expected: usize, got: usize },
}
