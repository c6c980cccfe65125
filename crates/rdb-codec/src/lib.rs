//! # Codec: typed values ↔ fixed-width records and ordered keys
//!
//! Maps the handful of SQL-visible value types onto two fixed-width wire
//! formats:
//!
//! - an 8-byte **key** whose lexicographic byte order matches the value's
//!   semantic order, so the B+ tree (`rdb-btree`) can stay generic over
//!   "8 ordered bytes" and never know about column types;
//! - a fixed-size **record**, one tombstone byte followed by the
//!   column-ordered packed values, so the heap (`rdb-heap`) can treat every
//!   row as `record_size` opaque bytes.
//!
//! ## Example
//!
//! ```rust
//! use rdb_codec::{ColumnType, Value};
//!
//! let a = rdb_codec::encode_key(&Value::Int(-5), &ColumnType::Int).unwrap();
//! let b = rdb_codec::encode_key(&Value::Int(5), &ColumnType::Int).unwrap();
//! assert!(a < b);
//! ```

mod date;
mod key;
mod record;
mod schema;
mod value;

pub use date::{days_to_ymd, format_date, parse_date, ymd_to_days};
pub use key::encode_key;
pub use record::{decode_record, encode_record, extract_key};
pub use schema::{Column, Schema};
pub use value::{ColumnType, Value};

use thiserror::Error;

/// An 8-byte ordered key, opaque to everything above this crate.
pub type Key = [u8; 8];

/// Errors raised while encoding, decoding, or comparing typed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A value could not be coerced into the column's declared type.
    #[error("type mismatch: column {column} expects {expected}, got {value}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        value: String,
    },

    /// `VARCHAR[N]` value exceeded the declared column width.
    #[error("value too long for VARCHAR[{max}]: {len} bytes")]
    VarcharTooLong { max: usize, len: usize },

    /// `ARRAY[FLOAT]` value was not a `"x,y"` pair.
    #[error("malformed ARRAY[FLOAT] value: {0}")]
    MalformedArray(String),

    /// `DATE` value was not `YYYY-MM-DD`.
    #[error("malformed DATE value: {0}")]
    MalformedDate(String),

    /// The number of values did not match the schema's column count.
    #[error("expected {expected} values, got {got}")]
    Arity { expected: usize, got: usize },
}

#[cfg(test)]
mod tests;
