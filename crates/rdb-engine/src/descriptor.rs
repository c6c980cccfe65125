use rdb_codec::Schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Only index kind this engine actually builds. Other kinds may be named in
/// a descriptor (carried over from a future frontend) but are never acted
/// on (reserved tags, per the data model).
pub const INDEX_KIND_BPLUS: &str = "bplus";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct TableStats {
    pub total_records: u64,
    pub deleted_records: u64,
    /// RFC 3339 timestamp of the last successful compaction, if any.
    pub last_compaction: Option<String>,
    /// Set when a compaction partially failed (some but not all of the
    /// heap/index renames went through), persisted so a later run can
    /// detect the half-compacted state instead of trusting stale stats.
    /// Cleared the next time a compaction on this table fully succeeds.
    pub inconsistent: bool,
}

impl TableStats {
    /// `true` iff `total > 0` and `deleted / total` exceeds `ratio`.
    pub fn should_compact(&self, ratio: f64) -> bool {
        self.total_records > 0 && (self.deleted_records as f64 / self.total_records as f64) > ratio
    }
}

/// The persisted, per-table descriptor: `<data_root>/<name>/meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDescriptor {
    /// Always lower-case.
    pub name: String,
    pub schema: Schema,
    pub primary_key: Option<String>,
    /// Column name -> index kind (`"bplus"` is the only one ever acted on).
    pub indexes: BTreeMap<String, String>,
    pub heap_file: String,
    /// Column name -> index file name.
    pub index_files: BTreeMap<String, String>,
    pub stats: TableStats,
}

impl TableDescriptor {
    pub fn new(name: String, schema: Schema, primary_key: Option<String>, indexes: BTreeMap<String, String>) -> Self {
        let index_files = indexes
            .iter()
            .map(|(col, kind)| (col.clone(), format!("{}_{}.idx", col, kind)))
            .collect();
        Self {
            name,
            schema,
            primary_key,
            indexes,
            heap_file: "data.bin".to_string(),
            index_files,
            stats: TableStats::default(),
        }
    }

    pub fn index_file_for(&self, column: &str) -> Option<&str> {
        self.index_files.get(column).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdb_codec::{Column, ColumnType};

    #[test]
    fn new_derives_index_file_names_from_kind() {
        let schema = Schema::new(vec![Column::new("id", ColumnType::Int)]);
        let mut indexes = BTreeMap::new();
        indexes.insert("id".to_string(), INDEX_KIND_BPLUS.to_string());
        let desc = TableDescriptor::new("people".to_string(), schema, Some("id".to_string()), indexes);

        assert_eq!(desc.index_file_for("id"), Some("id_bplus.idx"));
        assert_eq!(desc.heap_file, "data.bin");
    }

    #[test]
    fn should_compact_uses_strict_ratio_threshold() {
        let mut stats = TableStats {
            total_records: 10,
            deleted_records: 2,
            last_compaction: None,
            inconsistent: false,
        };
        assert!(!stats.should_compact(0.20)); // exactly 0.20, not over
        stats.deleted_records = 3;
        assert!(stats.should_compact(0.20));
    }
}
