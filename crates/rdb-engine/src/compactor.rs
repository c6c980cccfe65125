//! Rewrites a table's heap dropping tombstoned records, then rebuilds every
//! declared index against the new offsets. Uses the usual stage-to-tmp-
//! then-rename pattern for each replaced file; replacement order is heap
//! first, then every index, with a failed rename reported rather than
//! rolled back.

use crate::commands::open_heap;
use crate::table_manager::TableManager;
use crate::Error;
use rdb_btree::BPlusTree;
use rdb_heap::Heap;
use std::fs;
use std::path::PathBuf;

pub fn compact(manager: &TableManager, table_name: &str) -> Result<(), Error> {
    let mut descriptor = manager.get_table_info(table_name)?;
    let table_dir = manager.table_dir(table_name);
    let record_size = descriptor.schema.record_size();

    let heap_path = table_dir.join(&descriptor.heap_file);
    let tmp_heap_path = table_dir.join(format!("{}.tmp", descriptor.heap_file));
    if tmp_heap_path.exists() {
        fs::remove_file(&tmp_heap_path)?;
    }

    let n_live = {
        let old_heap = open_heap(&table_dir, &descriptor)?;
        let new_heap = Heap::open(&tmp_heap_path, record_size)?;
        let mut n_live = 0u64;
        for (_, record) in old_heap.scan()? {
            if record[0] == 0 {
                new_heap.append(&record)?;
                n_live += 1;
            }
        }
        n_live
    };

    let new_heap = Heap::open(&tmp_heap_path, record_size)?;
    let mut staged_indexes: Vec<(PathBuf, PathBuf)> = Vec::new();
    for (column, file) in descriptor.index_files.clone() {
        let tmp_file = format!("{}.tmp", file);
        let tmp_path = table_dir.join(&tmp_file);
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }
        let tree = BPlusTree::open(&tmp_path)?;
        let col_idx = descriptor.schema.column_index(&column).ok_or_else(|| Error::NoSuchColumn {
            table: table_name.to_string(),
            column: column.clone(),
        })?;
        for (offset, record) in new_heap.scan()? {
            let key = rdb_codec::extract_key(&record, &descriptor.schema, col_idx)?;
            tree.insert(key, offset as i64)?;
        }
        staged_indexes.push((table_dir.join(&file), tmp_path));
    }
    drop(new_heap);

    let mut failures = Vec::new();
    if let Err(e) = fs::rename(&tmp_heap_path, &heap_path) {
        log::warn!("compaction: failed to replace heap for '{}': {}", table_name, e);
        failures.push(format!("heap: {}", e));
    }
    for (final_path, tmp_path) in staged_indexes {
        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            log::warn!(
                "compaction: failed to replace index {} for '{}': {}",
                final_path.display(),
                table_name,
                e
            );
            failures.push(format!("{}: {}", final_path.display(), e));
        }
    }

    let now_secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    descriptor.stats.total_records = n_live;
    descriptor.stats.deleted_records = 0;
    descriptor.stats.last_compaction = Some(rdb_codec::format_date(now_secs as u32));
    descriptor.stats.inconsistent = !failures.is_empty();
    manager.save_descriptor(&descriptor)?;

    if !failures.is_empty() {
        log::warn!(
            "table '{}' left inconsistent after partial compaction failure: {}",
            table_name,
            failures.join(", ")
        );
        return Err(Error::CorruptMetadata(format!(
            "partial compaction failure on '{}': {}",
            table_name,
            failures.join(", ")
        )));
    }

    log::debug!("compacted table '{}': {} live records retained", table_name, n_live);
    Ok(())
}
