//! The structured query object every command handler consumes, and the
//! structured result the [`crate::Runner`] produces. There is no SQL text
//! parser here; `rdb-cli` builds these directly from the literal grammar it
//! reads, and any other frontend can do the same.

use rdb_codec::{ColumnType, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One column of a `CREATE TABLE` schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub col_type: ColumnType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
        }
    }
}

/// A `SELECT`/`DELETE` predicate on a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: String, value: Value },
    Between { column: String, from: Value, to: Value },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } => column,
            Filter::Between { column, .. } => column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Create {
        table_name: String,
        columns: Vec<ColumnSpec>,
        indexes: BTreeMap<String, String>,
        primary_key: Option<String>,
    },
    CreateFromFile {
        table_name: String,
        file_path: PathBuf,
        indexes: BTreeMap<String, String>,
    },
    Insert {
        table_name: String,
        values: Vec<Value>,
    },
    Select {
        table_name: String,
        /// Empty means every column, in schema order.
        columns: Vec<String>,
        filters: Vec<Filter>,
    },
    Delete {
        table_name: String,
        filters: Vec<Filter>,
    },
    Drop {
        table_name: String,
    },
    /// Reserved; always answered with [`crate::Error::NotImplemented`].
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

/// The outward-facing `{status, message, records, columns, table_name}`
/// shape every command produces.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub status: Status,
    pub message: Option<String>,
    pub records: Option<Vec<Vec<Value>>>,
    pub columns: Option<Vec<String>>,
    pub table_name: Option<String>,
}

impl CommandResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: Some(message.into()),
            records: None,
            columns: None,
            table_name: None,
        }
    }

    pub fn rows(table_name: impl Into<String>, columns: Vec<String>, records: Vec<Vec<Value>>) -> Self {
        Self {
            status: Status::Success,
            message: None,
            records: Some(records),
            columns: Some(columns),
            table_name: Some(table_name.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            records: None,
            columns: None,
            table_name: None,
        }
    }
}
