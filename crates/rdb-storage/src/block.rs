use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::StorageError;

/// Fixed size of one page on disk, shared by every index file.
pub const PAGE_SIZE: usize = 4096;

/// Page-aligned access to a file of [`PAGE_SIZE`]-byte blocks.
///
/// Wraps a single persistent file handle behind a `Mutex`, mirroring the
/// interior-mutable reader pattern used for point lookups elsewhere in this
/// engine: callers can `read_block`/`write_block` through a shared `&self`.
pub struct BlockCursor {
    file: Mutex<File>,
}

impl BlockCursor {
    /// Opens `path`, creating it if it does not exist. Does not truncate an
    /// existing file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Total number of whole blocks currently in the file.
    pub fn total_blocks(&self) -> Result<u64, StorageError> {
        let file = self.file.lock().unwrap();
        Ok(file.metadata()?.len() / PAGE_SIZE as u64)
    }

    /// Reads block `index`, returning exactly [`PAGE_SIZE`] bytes.
    pub fn read_block(&self, index: u64) -> Result<Vec<u8>, StorageError> {
        let mut file = self.file.lock().unwrap();
        let total = file.metadata()?.len() / PAGE_SIZE as u64;
        if index >= total {
            return Err(StorageError::OutOfBounds { index, total });
        }
        file.seek(SeekFrom::Start(index * PAGE_SIZE as u64))?;
        let mut buf = vec![0u8; PAGE_SIZE];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Overwrites an existing block in place. `data` must be exactly
    /// [`PAGE_SIZE`] bytes.
    pub fn write_block(&self, index: u64, data: &[u8]) -> Result<(), StorageError> {
        if data.len() != PAGE_SIZE {
            return Err(StorageError::SizeMismatch {
                expected: PAGE_SIZE,
                got: data.len(),
            });
        }
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(index * PAGE_SIZE as u64))?;
        file.write_all(data)?;
        Ok(())
    }

    /// Appends a new block past the current end of file and returns its
    /// index.
    pub fn append_block(&self, data: &[u8]) -> Result<u64, StorageError> {
        if data.len() != PAGE_SIZE {
            return Err(StorageError::SizeMismatch {
                expected: PAGE_SIZE,
                got: data.len(),
            });
        }
        let mut file = self.file.lock().unwrap();
        let total = file.metadata()?.len() / PAGE_SIZE as u64;
        file.seek(SeekFrom::Start(total * PAGE_SIZE as u64))?;
        file.write_all(data)?;
        Ok(total)
    }

    /// Flushes and fsyncs the underlying file.
    pub fn sync(&self) -> Result<(), StorageError> {
        let file = self.file.lock().unwrap();
        file.sync_all()?;
        Ok(())
    }

    /// Discards every block, resetting the file to empty. Used when an index
    /// is rebuilt from scratch (`build_from_data`).
    pub fn truncate(&self) -> Result<(), StorageError> {
        let file = self.file.lock().unwrap();
        file.set_len(0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let cursor = BlockCursor::open(dir.path().join("index.db")).unwrap();

        let mut page = vec![0u8; PAGE_SIZE];
        page[0] = 7;
        let idx = cursor.append_block(&page).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(cursor.total_blocks().unwrap(), 1);

        let back = cursor.read_block(0).unwrap();
        assert_eq!(back, page);
    }

    #[test]
    fn write_block_overwrites_in_place() {
        let dir = tempdir().unwrap();
        let cursor = BlockCursor::open(dir.path().join("index.db")).unwrap();
        cursor.append_block(&vec![1u8; PAGE_SIZE]).unwrap();
        cursor.append_block(&vec![2u8; PAGE_SIZE]).unwrap();

        cursor.write_block(0, &vec![9u8; PAGE_SIZE]).unwrap();
        assert_eq!(cursor.read_block(0).unwrap(), vec![9u8; PAGE_SIZE]);
        assert_eq!(cursor.read_block(1).unwrap(), vec![2u8; PAGE_SIZE]);
    }

    #[test]
    fn read_past_end_is_out_of_bounds() {
        let dir = tempdir().unwrap();
        let cursor = BlockCursor::open(dir.path().join("index.db")).unwrap();
        cursor.append_block(&vec![0u8; PAGE_SIZE]).unwrap();
        assert!(matches!(
            cursor.read_block(5),
            Err(StorageError::OutOfBounds { index: 5, total: 1 })
        ));
    }

    #[test]
    fn wrong_size_write_is_rejected() {
        let dir = tempdir().unwrap();
        let cursor = BlockCursor::open(dir.path().join("index.db")).unwrap();
        assert!(matches!(
            cursor.append_block(&vec![0u8; 10]),
            Err(StorageError::SizeMismatch { .. })
        ));
    }
}
