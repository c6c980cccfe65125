use super::{open_heap, open_index};
use crate::query::{CommandResult, Filter};
use crate::table_manager::TableManager;
use crate::Error;
use rdb_config::EngineConfig;

/// `DELETE FROM name WHERE col = v;` requires equality on an indexed column.
pub fn delete(manager: &TableManager, config: &EngineConfig, table_name: &str, filters: &[Filter]) -> Result<CommandResult, Error> {
    let filter = filters
        .first()
        .ok_or_else(|| Error::ParseError("DELETE requires a WHERE clause".to_string()))?;
    let (column, value) = match filter {
        Filter::Eq { column, value } => (column, value),
        Filter::Between { column, .. } => {
            return Err(Error::RequiresIndex { column: column.clone() });
        }
    };

    let descriptor = manager.get_table_info(table_name)?;
    manager.ensure_consistent(&descriptor)?;
    if !descriptor.indexes.contains_key(column) {
        return Err(Error::RequiresIndex { column: column.clone() });
    }
    let table_dir = manager.table_dir(table_name);
    let col_idx = descriptor.schema.column_index(column).ok_or_else(|| Error::NoSuchColumn {
        table: table_name.to_string(),
        column: column.clone(),
    })?;
    let key = rdb_codec::encode_key(value, &descriptor.schema.columns[col_idx].col_type)?;

    let tree = open_index(&table_dir, &descriptor, column)?.expect("index file declared in descriptor");
    let offset = match tree.search(&key)? {
        Some(o) => o as u64,
        None => return Err(Error::NotFound),
    };

    let heap = open_heap(&table_dir, &descriptor)?;
    let record = heap.read(offset)?.ok_or(Error::NotFound)?;
    if record[0] != 0 {
        return Ok(CommandResult::success("record already deleted"));
    }
    heap.tombstone(offset)?;
    drop(heap);
    drop(tree);

    manager.update_stats(table_name, 0, 1)?;

    if manager.should_compact(table_name, config.compaction_ratio)? {
        log::info!("deletion ratio exceeded threshold for '{}', compacting", table_name);
        crate::compactor::compact(manager, table_name)?;
    }

    Ok(CommandResult::success(format!("1 row deleted from {}", table_name)))
}
