use thiserror::Error;

/// The closed error taxonomy every command handler maps its failures into.
///
/// Unlike the internal crates (`rdb-btree`, `rdb-heap`, `rdb-storage`,
/// `rdb-codec`), which each define their own open-ended `thiserror` enum,
/// this is the stable, outward-facing boundary: [`crate::CommandResult`]
/// carries this error's [`Display`](std::fmt::Display) text as its
/// `message` field, so callers can match on `{status, message}` without
/// reaching into any internal crate's error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("no such table: {0}")]
    NoSuchTable(String),

    #[error("table already exists: {0}")]
    TableExists(String),

    #[error("no such column '{column}' on table '{table}'")]
    NoSuchColumn { table: String, column: String },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("duplicate key on column '{column}': {value}")]
    DuplicateKey { column: String, value: String },

    #[error("not found")]
    NotFound,

    #[error("table '{0}' is inconsistent after a partial compaction failure; re-run compaction or drop and recreate it")]
    TableInconsistent(String),

    #[error("DELETE requires an indexed column, '{column}' has no index")]
    RequiresIndex { column: String },

    #[error("bad page: {0}")]
    BadPage(String),

    #[error("corrupt metadata: {0}")]
    CorruptMetadata(String),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl From<rdb_codec::CodecError> for Error {
    fn from(e: rdb_codec::CodecError) -> Self {
        Error::TypeMismatch(e.to_string())
    }
}

impl From<rdb_btree::BTreeError> for Error {
    fn from(e: rdb_btree::BTreeError) -> Self {
        match e {
            rdb_btree::BTreeError::BadPage { reason } => Error::BadPage(reason),
            rdb_btree::BTreeError::CorruptSuperHeader { reason } => Error::CorruptMetadata(reason),
            other => Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, other.to_string())),
        }
    }
}

impl From<rdb_heap::HeapError> for Error {
    fn from(e: rdb_heap::HeapError) -> Self {
        Error::IoError(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::CorruptMetadata(e.to_string())
    }
}
