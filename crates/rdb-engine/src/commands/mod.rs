//! Command handlers: one module per structured query variant. Every handler
//! opens the files it needs on entry and lets them drop on exit, no cursor
//! outlives a single command, per the engine's resource model.

mod create;
mod delete;
mod drop_table;
mod insert;
mod select;

pub use create::{create_from_file, create_table};
pub use delete::delete;
pub use drop_table::drop_table;
pub use insert::insert;
pub use select::select;

use crate::descriptor::TableDescriptor;
use crate::Error;
use rdb_btree::BPlusTree;
use rdb_codec::{Schema, Value};
use rdb_heap::Heap;
use std::path::{Path, PathBuf};

pub(crate) fn heap_path(table_dir: &Path, descriptor: &TableDescriptor) -> PathBuf {
    table_dir.join(&descriptor.heap_file)
}

pub(crate) fn open_heap(table_dir: &Path, descriptor: &TableDescriptor) -> Result<Heap, Error> {
    Ok(Heap::open(heap_path(table_dir, descriptor), descriptor.schema.record_size())?)
}

pub(crate) fn open_index(
    table_dir: &Path,
    descriptor: &TableDescriptor,
    column: &str,
) -> Result<Option<BPlusTree>, Error> {
    match descriptor.index_file_for(column) {
        Some(file) => Ok(Some(BPlusTree::open(table_dir.join(file))?)),
        None => Ok(None),
    }
}

pub(crate) fn decode_row(schema: &Schema, record: &[u8]) -> Result<Vec<Value>, Error> {
    Ok(rdb_codec::decode_record(record, schema)?)
}

/// Reorders/subsets a fully-decoded row to the requested column list. An
/// empty request means every column, in schema order.
pub(crate) fn project(schema: &Schema, requested: &[String], row: &[Value]) -> Result<(Vec<String>, Vec<Value>), Error> {
    if requested.is_empty() {
        let names = schema.columns.iter().map(|c| c.name.clone()).collect();
        return Ok((names, row.to_vec()));
    }
    let mut names = Vec::with_capacity(requested.len());
    let mut values = Vec::with_capacity(requested.len());
    for col in requested {
        let idx = schema.column_index(col).ok_or_else(|| Error::NoSuchColumn {
            table: String::new(),
            column: col.clone(),
        })?;
        names.push(col.clone());
        values.push(row[idx].clone());
    }
    Ok((names, values))
}
