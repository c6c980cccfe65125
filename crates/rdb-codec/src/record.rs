use crate::{date, encode_key, CodecError, ColumnType, Key, Schema, Value};

/// Encodes a row of values into a fixed-size record: tombstone byte `0`
/// followed by each column's fixed-width encoding, in column order.
///
/// Fails with [`CodecError::TypeMismatch`] (or a more specific variant) if
/// `values` cannot be coerced to `schema`.
pub fn encode_record(values: &[Value], schema: &Schema) -> Result<Vec<u8>, CodecError> {
    if values.len() != schema.columns.len() {
        return Err(CodecError::Arity {
            expected: schema.columns.len(),
            got: values.len(),
        });
    }

    let mut out = Vec::with_capacity(schema.record_size());
    out.push(0); // tombstone: live

    for (value, column) in values.iter().zip(schema.columns.iter()) {
        encode_value_into(&mut out, value, &column.col_type, &column.name)?;
    }

    debug_assert_eq!(out.len(), schema.record_size());
    Ok(out)
}

fn encode_value_into(
    out: &mut Vec<u8>,
    value: &Value,
    col_type: &ColumnType,
    column: &str,
) -> Result<(), CodecError> {
    let mismatch = || CodecError::TypeMismatch {
        column: column.to_string(),
        expected: col_type.name(),
        value: value.to_string(),
    };

    match (value, col_type) {
        (Value::Int(v), ColumnType::Int) => out.extend_from_slice(&v.to_ne_bytes()),
        (Value::Float(v), ColumnType::Float) => out.extend_from_slice(&v.to_ne_bytes()),
        (Value::Date(v), ColumnType::Date) => out.extend_from_slice(&v.to_ne_bytes()),
        (Value::Varchar(s), ColumnType::Varchar(n)) => {
            let bytes = s.as_bytes();
            if bytes.len() > *n {
                return Err(CodecError::VarcharTooLong {
                    max: *n,
                    len: bytes.len(),
                });
            }
            out.extend_from_slice(bytes);
            out.resize(out.len() + (*n - bytes.len()), 0);
        }
        (Value::ArrayFloat(x, y), ColumnType::ArrayFloat) => {
            out.extend_from_slice(&x.to_ne_bytes());
            out.extend_from_slice(&y.to_ne_bytes());
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}

/// Decodes a raw record (tombstone byte included) back into typed values.
///
/// `VARCHAR` values come back trimmed of NUL padding. `DATE` values come
/// back rendered as `YYYY-MM-DD` text ([`Value::Varchar`], via [`render_date`]),
/// matching the contract that a record survives `encode_record` followed by
/// `decode_record` modulo that rendering. Callers that need the raw day
/// count for key encoding (`extract_key`) go through [`decode_value`] directly.
pub fn decode_record(record: &[u8], schema: &Schema) -> Result<Vec<Value>, CodecError> {
    if record.len() != schema.record_size() {
        return Err(CodecError::Arity {
            expected: schema.record_size(),
            got: record.len(),
        });
    }

    let mut values = Vec::with_capacity(schema.columns.len());
    let mut offset = 1; // skip tombstone

    for column in &schema.columns {
        let size = column.col_type.size();
        let slice = &record[offset..offset + size];
        let value = decode_value(slice, &column.col_type);
        values.push(match &column.col_type {
            ColumnType::Date => Value::Varchar(render_date(&value).expect("decode_value produced a Value::Date for a Date column")),
            _ => value,
        });
        offset += size;
    }

    Ok(values)
}

fn decode_value(slice: &[u8], col_type: &ColumnType) -> Value {
    match col_type {
        ColumnType::Int => Value::Int(i32::from_ne_bytes(slice.try_into().unwrap())),
        ColumnType::Float => Value::Float(f32::from_ne_bytes(slice.try_into().unwrap())),
        ColumnType::Date => Value::Date(u32::from_ne_bytes(slice.try_into().unwrap())),
        ColumnType::Varchar(_) => {
            let end = slice.iter().position(|&b| b == 0).unwrap_or(slice.len());
            Value::Varchar(String::from_utf8_lossy(&slice[..end]).into_owned())
        }
        ColumnType::ArrayFloat => {
            let x = f32::from_ne_bytes(slice[0..4].try_into().unwrap());
            let y = f32::from_ne_bytes(slice[4..8].try_into().unwrap());
            Value::ArrayFloat(x, y)
        }
    }
}

/// Renders a [`Value::Date`] as `YYYY-MM-DD`, the textual form expected of
/// decoded records at the SELECT boundary.
pub fn render_date(value: &Value) -> Option<String> {
    match value {
        Value::Date(secs) => Some(date::format_date(*secs)),
        _ => None,
    }
}

/// Reads the column at `key_position` out of a raw record and returns its
/// key encoding. `key_position` is the 0-based column index (the leading
/// tombstone byte is accounted for internally).
pub fn extract_key(record: &[u8], schema: &Schema, key_position: usize) -> Result<Key, CodecError> {
    let column = &schema.columns[key_position];
    let offset = schema.column_offset(key_position);
    let size = column.col_type.size();
    let slice = &record[offset..offset + size];
    let value = decode_value(slice, &column.col_type);
    encode_key(&value, &column.col_type)
}
