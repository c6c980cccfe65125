//! End-to-end scenarios, run against the public [`Runner`] API only.

use crate::query::ColumnSpec;
use crate::{Filter, Query, Runner, Status};
use rdb_codec::{ColumnType, Value};
use rdb_config::EngineConfig;
use std::collections::BTreeMap;
use tempfile::tempdir;

fn runner(data_root: impl Into<std::path::PathBuf>) -> Runner {
    Runner::new(EngineConfig {
        data_root: data_root.into(),
        compaction_ratio: 0.20,
        page_size: 4096,
    })
}

fn create_people_table(r: &Runner) {
    let result = r.execute_query(Query::Create {
        table_name: "r".to_string(),
        columns: vec![ColumnSpec::new("id", ColumnType::Int), ColumnSpec::new("name", ColumnType::Varchar(20))],
        indexes: BTreeMap::new(),
        primary_key: Some("id".to_string()),
    });
    assert_eq!(result.status, Status::Success, "{:?}", result.message);
}

fn insert_row(r: &Runner, id: i32, name: &str) {
    let result = r.execute_query(Query::Insert {
        table_name: "r".to_string(),
        values: vec![Value::Int(id), Value::Varchar(name.to_string())],
    });
    assert_eq!(result.status, Status::Success, "{:?}", result.message);
}

#[test]
fn s1_select_by_primary_key_returns_exactly_the_matching_row() {
    let dir = tempdir().unwrap();
    let r = runner(dir.path());
    create_people_table(&r);
    insert_row(&r, 1, "a");
    insert_row(&r, 2, "b");

    let result = r.execute_query(Query::Select {
        table_name: "r".to_string(),
        columns: vec![],
        filters: vec![Filter::Eq {
            column: "id".to_string(),
            value: Value::Int(2),
        }],
    });

    assert_eq!(result.status, Status::Success);
    let rows = result.records.unwrap();
    assert_eq!(rows, vec![vec![Value::Int(2), Value::Varchar("b".to_string())]]);
}

#[test]
fn s2_duplicate_primary_key_insert_is_rejected() {
    let dir = tempdir().unwrap();
    let r = runner(dir.path());
    create_people_table(&r);
    insert_row(&r, 1, "a");
    insert_row(&r, 2, "b");

    let result = r.execute_query(Query::Insert {
        table_name: "r".to_string(),
        values: vec![Value::Int(1), Value::Varchar("dup".to_string())],
    });
    assert_eq!(result.status, Status::Error);
    assert!(result.message.unwrap().contains("duplicate key"));
}

#[test]
fn s3_delete_tombstones_and_select_skips_it() {
    let dir = tempdir().unwrap();
    let r = runner(dir.path());
    create_people_table(&r);
    insert_row(&r, 1, "a");
    insert_row(&r, 2, "b");

    let delete_result = r.execute_query(Query::Delete {
        table_name: "r".to_string(),
        filters: vec![Filter::Eq {
            column: "id".to_string(),
            value: Value::Int(1),
        }],
    });
    assert_eq!(delete_result.status, Status::Success);

    let select_result = r.execute_query(Query::Select {
        table_name: "r".to_string(),
        columns: vec![],
        filters: vec![],
    });
    assert_eq!(select_result.records.unwrap(), vec![vec![Value::Int(2), Value::Varchar("b".to_string())]]);

    let info = r.table_manager().get_table_info("r").unwrap();
    assert_eq!(info.stats.deleted_records, 1);
    assert_eq!(info.stats.total_records, 2);
}

#[test]
fn s4_range_select_over_a_thousand_rows_returns_the_requested_window() {
    let dir = tempdir().unwrap();
    let r = runner(dir.path());
    create_people_table(&r);
    for id in 0..1000 {
        insert_row(&r, id, &format!("row{}", id));
    }

    let result = r.execute_query(Query::Select {
        table_name: "r".to_string(),
        columns: vec!["id".to_string()],
        filters: vec![Filter::Between {
            column: "id".to_string(),
            from: Value::Int(100),
            to: Value::Int(199),
        }],
    });
    assert_eq!(result.status, Status::Success);
    let rows = result.records.unwrap();
    assert_eq!(rows.len(), 100);
    let ids: Vec<i32> = rows
        .iter()
        .map(|row| match &row[0] {
            Value::Int(v) => *v,
            other => panic!("expected Int, got {:?}", other),
        })
        .collect();
    let expected: Vec<i32> = (100..200).collect();
    assert_eq!(ids, expected);
}

#[test]
fn s5_deletion_ratio_above_threshold_triggers_inline_compaction() {
    let dir = tempdir().unwrap();
    let r = runner(dir.path());
    create_people_table(&r);
    for id in 0..10 {
        insert_row(&r, id, &format!("row{}", id));
    }

    for id in [2, 4, 6] {
        let result = r.execute_query(Query::Delete {
            table_name: "r".to_string(),
            filters: vec![Filter::Eq {
                column: "id".to_string(),
                value: Value::Int(id),
            }],
        });
        assert_eq!(result.status, Status::Success);
    }

    let info = r.table_manager().get_table_info("r").unwrap();
    assert_eq!(info.stats.total_records, 7);
    assert_eq!(info.stats.deleted_records, 0);

    let result = r.execute_query(Query::Select {
        table_name: "r".to_string(),
        columns: vec![],
        filters: vec![Filter::Eq {
            column: "id".to_string(),
            value: Value::Int(5),
        }],
    });
    assert_eq!(result.records.unwrap().len(), 1);
}

#[test]
fn compaction_preserves_every_surviving_key_across_every_index() {
    let dir = tempdir().unwrap();
    let r = runner(dir.path());
    create_people_table(&r);
    for id in 0..20 {
        insert_row(&r, id, &format!("row{}", id));
    }

    // delete enough rows (8/20 = 0.4 > 0.2) to trigger inline compaction
    // on the last delete, then confirm every surviving id is still found
    // through the primary-key index and that every deleted id is gone.
    let deleted: Vec<i32> = vec![1, 3, 5, 7, 9, 11, 13, 15];
    for id in &deleted {
        let result = r.execute_query(Query::Delete {
            table_name: "r".to_string(),
            filters: vec![Filter::Eq {
                column: "id".to_string(),
                value: Value::Int(*id),
            }],
        });
        assert_eq!(result.status, Status::Success);
    }

    let info = r.table_manager().get_table_info("r").unwrap();
    assert_eq!(info.stats.total_records, 12);
    assert_eq!(info.stats.deleted_records, 0);

    for id in 0..20 {
        let result = r.execute_query(Query::Select {
            table_name: "r".to_string(),
            columns: vec!["id".to_string()],
            filters: vec![Filter::Eq {
                column: "id".to_string(),
                value: Value::Int(id),
            }],
        });
        let rows = result.records.unwrap();
        if deleted.contains(&id) {
            assert!(rows.is_empty(), "id {} should have been deleted", id);
        } else {
            assert_eq!(rows.len(), 1, "id {} should still be reachable", id);
        }
    }
}

#[test]
fn s6_drop_table_removes_it_from_disk_and_from_the_catalog() {
    let dir = tempdir().unwrap();
    let r = runner(dir.path());
    create_people_table(&r);
    insert_row(&r, 1, "a");

    let table_dir = r.table_manager().table_dir("r");
    assert!(table_dir.is_dir());

    let drop_result = r.execute_query(Query::Drop { table_name: "r".to_string() });
    assert_eq!(drop_result.status, Status::Success);
    assert!(!table_dir.exists());

    let select_result = r.execute_query(Query::Select {
        table_name: "r".to_string(),
        columns: vec![],
        filters: vec![],
    });
    assert_eq!(select_result.status, Status::Error);
    assert!(select_result.message.unwrap().contains("no such table"));
}
