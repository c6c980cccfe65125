//! # Heap: the append-only table data file
//!
//! Despite the name, this is not a tree: it's the flat, fixed-record file a
//! table's rows live in. Records are never moved or shrunk in place; a
//! `DELETE` only flips the leading tombstone byte, and physical removal
//! happens only when the Compactor rewrites the whole file.

use rdb_storage::{RecordCursor, StorageError};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HeapError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("record is {len} bytes, heap record size is {record_size}")]
    WrongRecordSize { len: usize, record_size: usize },
}

/// The fixed-record data file for one table.
///
/// Every record is `record_size` bytes: a leading tombstone byte (`0` live,
/// `1` deleted) followed by the table's packed column values, laid out by
/// `rdb_codec`. The heap itself knows nothing about columns, it only
/// enforces that every record is the same width.
pub struct Heap {
    cursor: RecordCursor,
}

impl Heap {
    /// Opens (or creates) the heap file at `path` for a table whose records
    /// are `record_size` bytes wide.
    pub fn open<P: AsRef<Path>>(path: P, record_size: usize) -> Result<Self, HeapError> {
        Ok(Self {
            cursor: RecordCursor::open(path, record_size)?,
        })
    }

    pub fn record_size(&self) -> usize {
        self.cursor.record_size()
    }

    /// Number of records physically present (live and tombstoned).
    pub fn total_records(&self) -> Result<u64, HeapError> {
        Ok(self.cursor.total_records()?)
    }

    /// Appends `record` (already encoded, tombstone byte included) and
    /// returns its 0-based record index.
    pub fn append(&self, record: &[u8]) -> Result<u64, HeapError> {
        self.check_size(record)?;
        Ok(self.cursor.append(record)?)
    }

    /// Sets the tombstone byte of the record at `offset`. Idempotent: marking
    /// an already-tombstoned record succeeds without changing anything.
    pub fn tombstone(&self, offset: u64) -> Result<(), HeapError> {
        let mut record = self.cursor.read_at(offset)?;
        record[0] = 1;
        self.cursor.write_at(offset, &record)?;
        Ok(())
    }

    /// Reads the raw record at `offset`, tombstone byte included. Returns
    /// `None` if `offset` is past the end of the heap.
    pub fn read(&self, offset: u64) -> Result<Option<Vec<u8>>, HeapError> {
        match self.cursor.read_at(offset) {
            Ok(record) => Ok(Some(record)),
            Err(StorageError::OutOfBounds { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// `true` if the record at `offset` exists and its tombstone byte is 0.
    pub fn is_live(&self, offset: u64) -> Result<bool, HeapError> {
        Ok(matches!(self.read(offset)?, Some(record) if record[0] == 0))
    }

    /// Iterates every physically present record as `(offset, record)`,
    /// tombstoned ones included. Callers that want only live rows filter on
    /// `record[0] == 0`.
    pub fn scan(&self) -> Result<Vec<(u64, Vec<u8>)>, HeapError> {
        let total = self.total_records()?;
        let mut out = Vec::with_capacity(total as usize);
        for offset in 0..total {
            let record = self.cursor.read_at(offset)?;
            out.push((offset, record));
        }
        Ok(out)
    }

    fn check_size(&self, record: &[u8]) -> Result<(), HeapError> {
        let record_size = self.cursor.record_size();
        if record.len() != record_size {
            return Err(HeapError::WrongRecordSize {
                len: record.len(),
                record_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(tombstone: u8, payload: u8) -> Vec<u8> {
        vec![tombstone, payload, payload, payload, payload]
    }

    #[test]
    fn append_returns_sequential_offsets() {
        let dir = tempdir().unwrap();
        let heap = Heap::open(dir.path().join("data.bin"), 5).unwrap();
        assert_eq!(heap.append(&record(0, 1)).unwrap(), 0);
        assert_eq!(heap.append(&record(0, 2)).unwrap(), 1);
        assert_eq!(heap.total_records().unwrap(), 2);
    }

    #[test]
    fn tombstone_flips_only_the_first_byte() {
        let dir = tempdir().unwrap();
        let heap = Heap::open(dir.path().join("data.bin"), 5).unwrap();
        let offset = heap.append(&record(0, 9)).unwrap();
        heap.tombstone(offset).unwrap();
        let row = heap.read(offset).unwrap().unwrap();
        assert_eq!(row, vec![1, 9, 9, 9, 9]);
    }

    #[test]
    fn tombstone_is_idempotent() {
        let dir = tempdir().unwrap();
        let heap = Heap::open(dir.path().join("data.bin"), 5).unwrap();
        let offset = heap.append(&record(0, 3)).unwrap();
        heap.tombstone(offset).unwrap();
        heap.tombstone(offset).unwrap();
        assert_eq!(heap.read(offset).unwrap().unwrap()[0], 1);
    }

    #[test]
    fn read_past_end_returns_none() {
        let dir = tempdir().unwrap();
        let heap = Heap::open(dir.path().join("data.bin"), 5).unwrap();
        assert!(heap.read(42).unwrap().is_none());
    }

    #[test]
    fn scan_returns_every_record_with_its_offset() {
        let dir = tempdir().unwrap();
        let heap = Heap::open(dir.path().join("data.bin"), 5).unwrap();
        heap.append(&record(0, 1)).unwrap();
        heap.append(&record(0, 2)).unwrap();
        heap.tombstone(1).unwrap();

        let rows = heap.scan().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (0, record(0, 1)));
        assert_eq!(rows[1].1[0], 1);
    }

    #[test]
    fn wrong_size_append_is_rejected() {
        let dir = tempdir().unwrap();
        let heap = Heap::open(dir.path().join("data.bin"), 5).unwrap();
        assert!(matches!(
            heap.append(&[0u8; 3]),
            Err(HeapError::WrongRecordSize { .. })
        ));
    }
}
