use super::{decode_row, open_heap, open_index, project};
use crate::query::{CommandResult, Filter};
use crate::table_manager::TableManager;
use crate::Error;
use rdb_codec::{ColumnType, Schema, Value};

/// `SELECT columns FROM name [WHERE col = v | col BETWEEN a AND b]`.
///
/// The first filter decides the scan strategy (index equality, index range,
/// or full scan); every filter (including the first) is then re-checked
/// in-memory against the decoded row, so a second or later filter on an
/// unindexed column is still honored.
pub fn select(
    manager: &TableManager,
    table_name: &str,
    columns: &[String],
    filters: &[Filter],
) -> Result<CommandResult, Error> {
    let descriptor = manager.get_table_info(table_name)?;
    manager.ensure_consistent(&descriptor)?;
    let table_dir = manager.table_dir(table_name);
    let heap = open_heap(&table_dir, &descriptor)?;

    let offsets: Option<Vec<u64>> = match filters.first() {
        None => None,
        Some(filter) => {
            let column = filter.column();
            if !descriptor.indexes.contains_key(column) {
                None
            } else {
                let col_idx = descriptor.schema.column_index(column).ok_or_else(|| Error::NoSuchColumn {
                    table: table_name.to_string(),
                    column: column.to_string(),
                })?;
                let col_type = &descriptor.schema.columns[col_idx].col_type;
                let tree = open_index(&table_dir, &descriptor, column)?.expect("index file declared in descriptor");
                match filter {
                    Filter::Eq { value, .. } => {
                        let key = rdb_codec::encode_key(value, col_type)?;
                        Some(tree.search(&key)?.into_iter().map(|o| o as u64).collect())
                    }
                    Filter::Between { from, to, .. } => {
                        let begin = rdb_codec::encode_key(from, col_type)?;
                        let end = rdb_codec::encode_key(to, col_type)?;
                        Some(tree.range_search(&begin, &end)?.into_iter().map(|o| o as u64).collect())
                    }
                }
            }
        }
    };

    let mut rows = Vec::new();
    match offsets {
        Some(offsets) => {
            for offset in offsets {
                if let Some(record) = heap.read(offset)? {
                    if record[0] != 0 {
                        continue;
                    }
                    let row = decode_row(&descriptor.schema, &record)?;
                    if matches_all(&descriptor.schema, &row, filters)? {
                        rows.push(row);
                    }
                }
            }
        }
        None => {
            for (_, record) in heap.scan()? {
                if record[0] != 0 {
                    continue;
                }
                let row = decode_row(&descriptor.schema, &record)?;
                if matches_all(&descriptor.schema, &row, filters)? {
                    rows.push(row);
                }
            }
        }
    }

    let requested_names: Vec<String> = if columns.is_empty() {
        descriptor.schema.columns.iter().map(|c| c.name.clone()).collect()
    } else {
        columns.to_vec()
    };
    let mut projected = Vec::with_capacity(rows.len());
    for row in rows {
        let (names, values) = project(&descriptor.schema, columns, &row)?;
        debug_assert_eq!(names, requested_names);
        projected.push(values);
    }

    Ok(CommandResult::rows(table_name, requested_names, projected))
}

fn matches_all(schema: &Schema, row: &[Value], filters: &[Filter]) -> Result<bool, Error> {
    for filter in filters {
        if !matches_one(schema, row, filter)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn matches_one(schema: &Schema, row: &[Value], filter: &Filter) -> Result<bool, Error> {
    let idx = schema.column_index(filter.column()).ok_or_else(|| Error::NoSuchColumn {
        table: String::new(),
        column: filter.column().to_string(),
    })?;
    let col_type = &schema.columns[idx].col_type;
    let actual = rdb_codec::encode_key(&decoded_key_value(&row[idx], col_type)?, col_type)?;
    match filter {
        Filter::Eq { value, .. } => Ok(actual == rdb_codec::encode_key(value, col_type)?),
        Filter::Between { from, to, .. } => {
            let begin = rdb_codec::encode_key(from, col_type)?;
            let end = rdb_codec::encode_key(to, col_type)?;
            Ok(actual >= begin && actual <= end)
        }
    }
}

/// `decode_row` renders `DATE` columns as `YYYY-MM-DD` text; filter
/// comparisons key-encode against the column's declared type, so a `DATE`
/// value must be parsed back to its raw form before `encode_key` sees it.
fn decoded_key_value(value: &Value, col_type: &ColumnType) -> Result<Value, Error> {
    match (value, col_type) {
        (Value::Varchar(s), ColumnType::Date) => rdb_codec::parse_date(s)
            .map(Value::Date)
            .ok_or_else(|| Error::ParseError(format!("invalid rendered date '{}'", s))),
        _ => Ok(value.clone()),
    }
}
