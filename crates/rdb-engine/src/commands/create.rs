use super::open_index;
use crate::descriptor::{TableDescriptor, INDEX_KIND_BPLUS};
use crate::query::{ColumnSpec, CommandResult};
use crate::table_manager::TableManager;
use crate::Error;
use rdb_codec::{Column, ColumnType, Schema, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// `CREATE TABLE name (col type [KEY] [INDEX kind], ...)`.
pub fn create_table(
    manager: &TableManager,
    table_name: &str,
    columns: Vec<ColumnSpec>,
    mut indexes: BTreeMap<String, String>,
    primary_key: Option<String>,
) -> Result<CommandResult, Error> {
    if let Some(pk) = &primary_key {
        if !columns.iter().any(|c| &c.name == pk) {
            return Err(Error::NoSuchColumn {
                table: table_name.to_string(),
                column: pk.clone(),
            });
        }
        indexes.insert(pk.clone(), INDEX_KIND_BPLUS.to_string());
    }

    let schema = Schema::new(columns.into_iter().map(|c| Column::new(c.name, c.col_type)).collect());
    let descriptor = TableDescriptor::new(table_name.to_lowercase(), schema, primary_key, indexes);
    build_table(manager, descriptor, table_name)
}

/// `CREATE TABLE name FROM FILE 'path' [USING INDEX kind(col)]`: two-pass CSV
/// load. Pass 1 infers a schema from value shapes; pass 2 encodes and
/// appends every row, maintaining every index as it goes.
pub fn create_from_file(
    manager: &TableManager,
    table_name: &str,
    file_path: &Path,
    index_info: BTreeMap<String, String>,
) -> Result<CommandResult, Error> {
    let headers = csv_headers(file_path)?;
    let profiles = profile_columns(file_path, &headers)?;

    let mut columns = Vec::with_capacity(headers.len());
    for (header, profile) in headers.iter().zip(profiles.iter()) {
        columns.push(Column::new(header.clone(), profile.resolve()));
    }
    let primary_key = headers.first().cloned();

    let mut indexes = index_info;
    if let Some(pk) = &primary_key {
        indexes.insert(pk.clone(), INDEX_KIND_BPLUS.to_string());
    }

    let schema = Schema::new(columns);
    let descriptor = TableDescriptor::new(table_name.to_lowercase(), schema, primary_key, indexes);
    let table_dir = manager.table_dir(table_name);
    build_table(manager, descriptor.clone(), table_name)?;

    let heap = super::open_heap(&table_dir, &descriptor)?;
    let mut indexed_columns: Vec<(usize, rdb_btree::BPlusTree)> = Vec::new();
    for column in descriptor.schema.columns.iter() {
        if let Some(tree) = open_index(&table_dir, &descriptor, &column.name)? {
            let idx = descriptor.schema.column_index(&column.name).unwrap();
            indexed_columns.push((idx, tree));
        }
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(file_path)
        .map_err(|e| Error::ParseError(e.to_string()))?;
    let mut rows_loaded = 0u64;
    for result in reader.records() {
        let record = result.map_err(|e| Error::ParseError(e.to_string()))?;
        let mut values = Vec::with_capacity(descriptor.schema.columns.len());
        for (col, raw) in descriptor.schema.columns.iter().zip(record.iter()) {
            values.push(parse_value(raw.trim(), &col.col_type)?);
        }
        let encoded = rdb_codec::encode_record(&values, &descriptor.schema)?;
        let offset = heap.append(&encoded)?;
        for (idx, tree) in indexed_columns.iter() {
            let key = rdb_codec::extract_key(&encoded, &descriptor.schema, *idx)?;
            tree.insert(key, offset as i64)?;
        }
        rows_loaded += 1;
    }
    manager.update_stats(table_name, rows_loaded as i64, 0)?;

    Ok(CommandResult::success(format!(
        "table {} created from {} with {} rows",
        table_name,
        file_path.display(),
        rows_loaded
    )))
}

fn build_table(manager: &TableManager, descriptor: TableDescriptor, table_name: &str) -> Result<CommandResult, Error> {
    manager.create_table(&descriptor)?;
    let table_dir = manager.table_dir(table_name);
    super::open_heap(&table_dir, &descriptor)?;
    for column in descriptor.indexes.keys() {
        open_index(&table_dir, &descriptor, column)?;
    }
    Ok(CommandResult::success(format!("table {} created", table_name)))
}

fn csv_headers(path: &Path) -> Result<Vec<String>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| Error::ParseError(e.to_string()))?;
    Ok(reader.headers().map_err(|e| Error::ParseError(e.to_string()))?.iter().map(|h| h.trim().to_string()).collect())
}

#[derive(Default)]
struct ColumnProfile {
    max_len: usize,
    saw_any: bool,
    all_int: bool,
    has_float: bool,
    all_array: bool,
    all_date: bool,
}

impl ColumnProfile {
    fn new() -> Self {
        Self {
            max_len: 0,
            saw_any: false,
            all_int: true,
            has_float: false,
            all_array: true,
            all_date: true,
        }
    }

    fn observe(&mut self, raw: &str) {
        self.saw_any = true;
        self.max_len = self.max_len.max(raw.len());

        let clean: String = raw.chars().filter(|c| *c != ',').collect();
        if let Ok(n) = clean.parse::<i64>() {
            let _ = n;
            return;
        }
        if clean.parse::<f64>().is_ok() {
            self.has_float = true;
            self.all_int = false;
            return;
        }
        self.all_int = false;
        if !is_array_pair(raw) {
            self.all_array = false;
        }
        if rdb_codec::parse_date(raw).is_none() {
            self.all_date = false;
        }
    }

    fn resolve(&self) -> ColumnType {
        if !self.saw_any {
            return ColumnType::Varchar(20);
        }
        if self.all_int {
            ColumnType::Int
        } else if self.has_float {
            ColumnType::Float
        } else if self.all_array {
            ColumnType::ArrayFloat
        } else if self.all_date {
            ColumnType::Date
        } else {
            let padded = ((self.max_len as f64) * 1.2 + 10.0) as usize;
            ColumnType::Varchar(padded.min(255).max(1))
        }
    }
}

fn is_array_pair(raw: &str) -> bool {
    let parts: Vec<&str> = raw.splitn(2, ',').collect();
    parts.len() == 2 && parts.iter().all(|p| p.trim().parse::<f64>().is_ok())
}

fn profile_columns(path: &Path, headers: &[String]) -> Result<Vec<ColumnProfile>, Error> {
    let mut profiles: Vec<ColumnProfile> = headers.iter().map(|_| ColumnProfile::new()).collect();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| Error::ParseError(e.to_string()))?;
    for result in reader.records() {
        let record = result.map_err(|e| Error::ParseError(e.to_string()))?;
        for (profile, raw) in profiles.iter_mut().zip(record.iter()) {
            profile.observe(raw.trim());
        }
    }
    Ok(profiles)
}

fn parse_value(raw: &str, col_type: &ColumnType) -> Result<Value, Error> {
    match col_type {
        ColumnType::Int => {
            let clean: String = raw.chars().filter(|c| *c != ',').collect();
            clean
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|_| Error::ParseError(format!("'{}' is not a valid INT", raw)))
        }
        ColumnType::Float => {
            let clean: String = raw.chars().filter(|c| *c != ',').collect();
            clean
                .parse::<f32>()
                .map(Value::Float)
                .map_err(|_| Error::ParseError(format!("'{}' is not a valid FLOAT", raw)))
        }
        ColumnType::Date => rdb_codec::parse_date(raw)
            .map(Value::Date)
            .ok_or_else(|| Error::ParseError(format!("'{}' is not a valid DATE", raw))),
        ColumnType::Varchar(_) => Ok(Value::Varchar(raw.to_string())),
        ColumnType::ArrayFloat => {
            let mut parts = raw.splitn(2, ',');
            let x: f32 = parts
                .next()
                .and_then(|p| p.trim().parse().ok())
                .ok_or_else(|| Error::ParseError(format!("'{}' is not a valid ARRAY[FLOAT]", raw)))?;
            let y: f32 = parts
                .next()
                .and_then(|p| p.trim().parse().ok())
                .ok_or_else(|| Error::ParseError(format!("'{}' is not a valid ARRAY[FLOAT]", raw)))?;
            Ok(Value::ArrayFloat(x, y))
        }
    }
}
