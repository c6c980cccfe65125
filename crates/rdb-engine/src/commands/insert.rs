use super::{open_heap, open_index};
use crate::query::CommandResult;
use crate::table_manager::TableManager;
use crate::Error;
use rdb_codec::Value;

/// `INSERT INTO name VALUES (v1, v2, ...)`.
pub fn insert(manager: &TableManager, table_name: &str, values: Vec<Value>) -> Result<CommandResult, Error> {
    let descriptor = manager.get_table_info(table_name)?;
    manager.ensure_consistent(&descriptor)?;
    let table_dir = manager.table_dir(table_name);
    let record = rdb_codec::encode_record(&values, &descriptor.schema)?;

    if let Some(pk) = descriptor.primary_key.clone() {
        let pk_idx = descriptor.schema.column_index(&pk).ok_or_else(|| Error::NoSuchColumn {
            table: table_name.to_string(),
            column: pk.clone(),
        })?;
        if let Some(tree) = open_index(&table_dir, &descriptor, &pk)? {
            let key = rdb_codec::extract_key(&record, &descriptor.schema, pk_idx)?;
            if let Some(offset) = tree.search(&key)? {
                let heap = open_heap(&table_dir, &descriptor)?;
                if heap.is_live(offset as u64)? {
                    return Err(Error::DuplicateKey {
                        column: pk,
                        value: values[pk_idx].to_string(),
                    });
                }
            }
        }
    }

    let offset = manager.append_record(&descriptor, &record)?;

    for column in descriptor.schema.columns.iter() {
        if let Some(tree) = open_index(&table_dir, &descriptor, &column.name)? {
            let col_idx = descriptor.schema.column_index(&column.name).unwrap();
            let key = rdb_codec::extract_key(&record, &descriptor.schema, col_idx)?;
            tree.insert(key, offset as i64)?;
        }
    }

    manager.update_stats(table_name, 1, 0)?;
    Ok(CommandResult::success(format!("1 row inserted into {}", table_name)))
}
