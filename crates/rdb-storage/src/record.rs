use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::StorageError;

/// Record-aligned access to a file of fixed-size elements.
///
/// Unlike [`crate::BlockCursor`], the element size is a runtime parameter,
/// every table has its own record width, fixed at table creation and stored
/// alongside the table's schema.
pub struct RecordCursor {
    file: Mutex<File>,
    record_size: usize,
}

impl RecordCursor {
    /// Opens `path`, creating it if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P, record_size: usize) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
            record_size,
        })
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Total number of whole records currently in the file.
    pub fn total_records(&self) -> Result<u64, StorageError> {
        let file = self.file.lock().unwrap();
        Ok(file.metadata()?.len() / self.record_size as u64)
    }

    /// Reads the record at `index`.
    pub fn read_at(&self, index: u64) -> Result<Vec<u8>, StorageError> {
        let mut file = self.file.lock().unwrap();
        let total = file.metadata()?.len() / self.record_size as u64;
        if index >= total {
            return Err(StorageError::OutOfBounds { index, total });
        }
        file.seek(SeekFrom::Start(index * self.record_size as u64))?;
        let mut buf = vec![0u8; self.record_size];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Overwrites the record at `index` in place.
    pub fn write_at(&self, index: u64, data: &[u8]) -> Result<(), StorageError> {
        if data.len() != self.record_size {
            return Err(StorageError::SizeMismatch {
                expected: self.record_size,
                got: data.len(),
            });
        }
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(index * self.record_size as u64))?;
        file.write_all(data)?;
        Ok(())
    }

    /// Appends a new record past the current end of file and returns its
    /// 0-based index.
    pub fn append(&self, data: &[u8]) -> Result<u64, StorageError> {
        if data.len() != self.record_size {
            return Err(StorageError::SizeMismatch {
                expected: self.record_size,
                got: data.len(),
            });
        }
        let mut file = self.file.lock().unwrap();
        let total = file.metadata()?.len() / self.record_size as u64;
        file.seek(SeekFrom::Start(total * self.record_size as u64))?;
        file.write_all(data)?;
        Ok(total)
    }

    pub fn sync(&self) -> Result<(), StorageError> {
        let file = self.file.lock().unwrap();
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_assigns_sequential_indices() {
        let dir = tempdir().unwrap();
        let cursor = RecordCursor::open(dir.path().join("heap.dat"), 8).unwrap();
        assert_eq!(cursor.append(&[1u8; 8]).unwrap(), 0);
        assert_eq!(cursor.append(&[2u8; 8]).unwrap(), 1);
        assert_eq!(cursor.total_records().unwrap(), 2);
    }

    #[test]
    fn write_at_updates_an_existing_record() {
        let dir = tempdir().unwrap();
        let cursor = RecordCursor::open(dir.path().join("heap.dat"), 4).unwrap();
        cursor.append(&[0u8; 4]).unwrap();
        cursor.write_at(0, &[0xffu8; 4]).unwrap();
        assert_eq!(cursor.read_at(0).unwrap(), vec![0xffu8; 4]);
    }

    #[test]
    fn reopening_preserves_previously_written_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("heap.dat");
        {
            let cursor = RecordCursor::open(&path, 4).unwrap();
            cursor.append(&[5u8; 4]).unwrap();
        }
        let cursor = RecordCursor::open(&path, 4).unwrap();
        assert_eq!(cursor.total_records().unwrap(), 1);
        assert_eq!(cursor.read_at(0).unwrap(), vec![5u8; 4]);
    }
}
