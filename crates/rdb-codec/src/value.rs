use serde::{Deserialize, Serialize};
use std::fmt;

/// The column types the engine understands, per the data model.
///
/// `VARCHAR` carries its fixed width `N`; every other type has a constant
/// on-disk size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Int,
    Float,
    Date,
    Varchar(usize),
    ArrayFloat,
}

impl ColumnType {
    /// On-disk size in bytes of a value of this type (not including the
    /// record's leading tombstone byte).
    pub fn size(&self) -> usize {
        match self {
            ColumnType::Int => 4,
            ColumnType::Float => 4,
            ColumnType::Date => 4,
            ColumnType::Varchar(n) => *n,
            ColumnType::ArrayFloat => 8,
        }
    }

    /// Short name used in error messages and CSV type inference.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Int => "INT",
            ColumnType::Float => "FLOAT",
            ColumnType::Date => "DATE",
            ColumnType::Varchar(_) => "VARCHAR",
            ColumnType::ArrayFloat => "ARRAY[FLOAT]",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Varchar(n) => write!(f, "VARCHAR[{}]", n),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// A single SQL-visible value, tagged by the type it was produced for.
///
/// `Value` is the in-memory form used by the runner and commands; `encode_*`
/// and `decode_record` convert to and from the on-disk byte forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    /// Unix seconds, unsigned (matches the on-disk `DATE` encoding).
    Date(u32),
    Varchar(String),
    /// A 2D point.
    ArrayFloat(f32, f32),
}

impl Value {
    /// Returns the [`ColumnType`] this value was constructed as.
    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::Int(_) => ColumnType::Int,
            Value::Float(_) => ColumnType::Float,
            Value::Date(_) => ColumnType::Date,
            Value::Varchar(s) => ColumnType::Varchar(s.len()),
            Value::ArrayFloat(..) => ColumnType::ArrayFloat,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Varchar(v) => write!(f, "{}", v),
            Value::ArrayFloat(x, y) => write!(f, "{},{}", x, y),
        }
    }
}
