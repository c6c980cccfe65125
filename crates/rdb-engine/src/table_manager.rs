//! Owns per-table metadata: creates and drops table directories, persists
//! `meta.json`, and tracks the deletion ratio that decides when the
//! Compactor should run.

use crate::descriptor::TableDescriptor;
use crate::Error;
use rdb_heap::Heap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const META_FILENAME: &str = "meta.json";
const META_TMP_FILENAME: &str = "meta.json.tmp";

pub struct TableManager {
    data_root: PathBuf,
}

impl TableManager {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Canonicalizes a user-supplied table name to its on-disk form.
    pub fn canonical_name(name: &str) -> String {
        name.to_lowercase()
    }

    pub fn table_dir(&self, name: &str) -> PathBuf {
        self.data_root.join(Self::canonical_name(name))
    }

    pub fn table_exists(&self, name: &str) -> bool {
        self.table_dir(name).join(META_FILENAME).is_file()
    }

    /// Writes a fresh table directory and its descriptor. Fails with
    /// [`Error::TableExists`] if the table is already present.
    pub fn create_table(&self, descriptor: &TableDescriptor) -> Result<(), Error> {
        if self.table_exists(&descriptor.name) {
            return Err(Error::TableExists(descriptor.name.clone()));
        }
        let dir = self.table_dir(&descriptor.name);
        fs::create_dir_all(&dir)?;
        self.save_descriptor(descriptor)?;
        log::info!("created table '{}' at {}", descriptor.name, dir.display());
        Ok(())
    }

    pub fn get_table_info(&self, name: &str) -> Result<TableDescriptor, Error> {
        let path = self.table_dir(name).join(META_FILENAME);
        let bytes = fs::read(&path).map_err(|_| Error::NoSuchTable(name.to_string()))?;
        let descriptor: TableDescriptor = serde_json::from_slice(&bytes)?;
        Ok(descriptor)
    }

    /// Stages the descriptor to `meta.json.tmp`, fsyncs it, renames over
    /// `meta.json`, then fsyncs the containing directory so the rename
    /// itself is durable.
    pub fn save_descriptor(&self, descriptor: &TableDescriptor) -> Result<(), Error> {
        let dir = self.table_dir(&descriptor.name);
        let tmp_path = dir.join(META_TMP_FILENAME);
        let final_path = dir.join(META_FILENAME);

        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            serde_json::to_writer_pretty(&mut f, descriptor)?;
            f.flush()?;
            f.sync_all()?;
        }
        fs::rename(&tmp_path, &final_path)?;

        if let Ok(dir_handle) = File::open(&dir) {
            let _ = dir_handle.sync_all();
        }
        Ok(())
    }

    pub fn update_stats(&self, name: &str, total_delta: i64, deleted_delta: i64) -> Result<TableDescriptor, Error> {
        let mut descriptor = self.get_table_info(name)?;
        descriptor.stats.total_records = (descriptor.stats.total_records as i64 + total_delta).max(0) as u64;
        descriptor.stats.deleted_records = (descriptor.stats.deleted_records as i64 + deleted_delta).max(0) as u64;
        self.save_descriptor(&descriptor)?;
        Ok(descriptor)
    }

    pub fn should_compact(&self, name: &str, ratio: f64) -> Result<bool, Error> {
        let descriptor = self.get_table_info(name)?;
        Ok(descriptor.stats.should_compact(ratio))
    }

    /// Opens `descriptor`'s heap file and appends `record`, returning the
    /// new record's byte offset. Command handlers route every heap write
    /// through this rather than opening `rdb_heap::Heap` directly.
    pub fn append_record(&self, descriptor: &TableDescriptor, record: &[u8]) -> Result<u64, Error> {
        let heap_path = self.table_dir(&descriptor.name).join(&descriptor.heap_file);
        let heap = Heap::open(&heap_path, descriptor.schema.record_size())?;
        Ok(heap.append(record)?)
    }

    /// Fails with [`Error::TableInconsistent`] if `descriptor` was left
    /// half-compacted by a prior partial rename failure. Call after
    /// fetching a descriptor and before acting on it; [`crate::compactor::compact`]
    /// deliberately bypasses this so a flagged table can still be retried.
    pub fn ensure_consistent(&self, descriptor: &TableDescriptor) -> Result<(), Error> {
        if descriptor.stats.inconsistent {
            return Err(Error::TableInconsistent(descriptor.name.clone()));
        }
        Ok(())
    }

    /// Every table directory under the data root, in directory order.
    pub fn list_tables(&self) -> Result<Vec<String>, Error> {
        if !self.data_root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.data_root)? {
            let entry = entry?;
            if entry.path().join(META_FILENAME).is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Removes a table directory, guarding against a descriptor or caller
    /// pointing outside `data_root` (path-traversal guard).
    pub fn drop_table(&self, name: &str) -> Result<(), Error> {
        if !self.table_exists(name) {
            return Err(Error::NoSuchTable(name.to_string()));
        }
        let dir = self.table_dir(name);
        self.assert_contained(&dir)?;
        fs::remove_dir_all(&dir)?;
        log::info!("dropped table '{}'", name);
        Ok(())
    }

    fn assert_contained(&self, dir: &Path) -> Result<(), Error> {
        let root = fs::canonicalize(&self.data_root).unwrap_or_else(|_| self.data_root.clone());
        let target = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        if !target.starts_with(&root) {
            return Err(Error::CorruptMetadata(format!(
                "refusing to operate outside data root: {}",
                dir.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdb_codec::{Column, ColumnType, Schema};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn descriptor(name: &str) -> TableDescriptor {
        let schema = Schema::new(vec![Column::new("id", ColumnType::Int)]);
        TableDescriptor::new(name.to_string(), schema, Some("id".to_string()), BTreeMap::new())
    }

    #[test]
    fn create_then_read_back_round_trips() {
        let dir = tempdir().unwrap();
        let mgr = TableManager::new(dir.path());
        mgr.create_table(&descriptor("People")).unwrap();

        assert!(mgr.table_exists("people"));
        assert!(mgr.table_exists("PEOPLE")); // canonicalized lookup
        let info = mgr.get_table_info("people").unwrap();
        assert_eq!(info.name, "People");
    }

    #[test]
    fn create_table_twice_fails() {
        let dir = tempdir().unwrap();
        let mgr = TableManager::new(dir.path());
        mgr.create_table(&descriptor("t")).unwrap();
        assert!(matches!(mgr.create_table(&descriptor("t")), Err(Error::TableExists(_))));
    }

    #[test]
    fn update_stats_accumulates_and_persists() {
        let dir = tempdir().unwrap();
        let mgr = TableManager::new(dir.path());
        mgr.create_table(&descriptor("t")).unwrap();

        mgr.update_stats("t", 5, 0).unwrap();
        mgr.update_stats("t", 0, 2).unwrap();
        let info = mgr.get_table_info("t").unwrap();
        assert_eq!(info.stats.total_records, 5);
        assert_eq!(info.stats.deleted_records, 2);
    }

    #[test]
    fn should_compact_reflects_ratio() {
        let dir = tempdir().unwrap();
        let mgr = TableManager::new(dir.path());
        mgr.create_table(&descriptor("t")).unwrap();
        mgr.update_stats("t", 10, 3).unwrap();
        assert!(mgr.should_compact("t", 0.20).unwrap());
    }

    #[test]
    fn list_tables_returns_sorted_names() {
        let dir = tempdir().unwrap();
        let mgr = TableManager::new(dir.path());
        mgr.create_table(&descriptor("zebra")).unwrap();
        mgr.create_table(&descriptor("alpha")).unwrap();
        assert_eq!(mgr.list_tables().unwrap(), vec!["alpha", "zebra"]);
    }

    #[test]
    fn append_record_writes_to_the_table_heap() {
        let dir = tempdir().unwrap();
        let mgr = TableManager::new(dir.path());
        let desc = descriptor("t");
        mgr.create_table(&desc).unwrap();

        let record = vec![0u8; desc.schema.record_size()];
        let offset = mgr.append_record(&desc, &record).unwrap();
        assert_eq!(offset, 0);
        let second = mgr.append_record(&desc, &record).unwrap();
        assert_eq!(second, record.len() as u64);
    }

    #[test]
    fn ensure_consistent_rejects_a_flagged_descriptor() {
        let dir = tempdir().unwrap();
        let mgr = TableManager::new(dir.path());
        let mut desc = descriptor("t");
        mgr.create_table(&desc).unwrap();
        mgr.ensure_consistent(&desc).unwrap();

        desc.stats.inconsistent = true;
        assert!(matches!(mgr.ensure_consistent(&desc), Err(Error::TableInconsistent(_))));
    }

    #[test]
    fn drop_table_removes_the_directory() {
        let dir = tempdir().unwrap();
        let mgr = TableManager::new(dir.path());
        mgr.create_table(&descriptor("t")).unwrap();
        mgr.drop_table("t").unwrap();
        assert!(!mgr.table_exists("t"));
        assert!(matches!(mgr.drop_table("t"), Err(Error::NoSuchTable(_))));
    }
}
