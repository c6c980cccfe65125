use crate::ColumnType;
use serde::{Deserialize, Serialize};

/// One declared column: a name and its on-disk type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub col_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
        }
    }
}

/// The ordered column list for one table, used by every `encode_record` /
/// `decode_record` / `extract_key` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Fixed record size in bytes, including the leading tombstone byte.
    pub fn record_size(&self) -> usize {
        1 + self.columns.iter().map(|c| c.col_type.size()).sum::<usize>()
    }

    /// Returns the 0-based index of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Byte offset of column `idx`'s value within a record, *including* the
    /// leading tombstone byte (so offset 0 is always the tombstone).
    pub fn column_offset(&self, idx: usize) -> usize {
        1 + self.columns[..idx]
            .iter()
            .map(|c| c.col_type.size())
            .sum::<usize>()
    }
}
