use slotbase::catalog::catalog_manager::CatalogManager;
use slotbase::errors::query_error::QueryError;
use slotbase::errors::storage_error::StorageError;
use slotbase::executor::{Executor, NestedLoopJoin, Projection, SeqScan, Sort, Update};
use slotbase::storage::disk_manager::DiskManager;
use slotbase::storage::page_cache::PageCache;
use slotbase::transaction::{Context, LockManager, Transaction};
use slotbase::types::catalog_types::{ColDef, ColType};
use slotbase::types::filter_types::{CmpOp, ColumnRef, Condition, Operand, SetClause, Value};
use slotbase::types::record_types::{Record, Rid};
use std::sync::Arc;
use tempfile::TempDir;

fn setup() -> (TempDir, CatalogManager) {
    let dir = TempDir::new().unwrap();
    let disk = Arc::new(DiskManager::new());
    let cache = Arc::new(PageCache::new(Arc::clone(&disk)));
    let mut sm = CatalogManager::new(dir.path(), disk, cache);
    sm.create_db("testdb").unwrap();
    sm.open_db("testdb").unwrap();
    (dir, sm)
}

fn int_col(name: &str) -> ColDef {
    ColDef {
        name: name.to_string(),
        col_type: ColType::Int,
        len: 4,
    }
}

fn float_col(name: &str) -> ColDef {
    ColDef {
        name: name.to_string(),
        col_type: ColType::Float,
        len: 4,
    }
}

fn str_col(name: &str, len: usize) -> ColDef {
    ColDef {
        name: name.to_string(),
        col_type: ColType::Str,
        len,
    }
}

fn insert_rows(sm: &CatalogManager, table: &str, rows: &[Vec<Value>]) -> Vec<Rid> {
    let tab = sm.table_meta(table).unwrap().clone();
    let fh = sm.file_handle(table).unwrap();
    rows.iter()
        .map(|vals| {
            let buf = tab.build_record(vals).unwrap();
            fh.insert_record(&buf, None).unwrap()
        })
        .collect()
}

fn drain(exec: &mut dyn Executor) -> Vec<Record> {
    let mut out = Vec::new();
    exec.begin().unwrap();
    while !exec.is_end() {
        out.push(exec.next_record().unwrap().unwrap());
        exec.advance().unwrap();
    }
    out
}

fn read_i32(rec: &Record, offset: usize) -> i32 {
    i32::from_le_bytes(rec.data[offset..offset + 4].try_into().unwrap())
}

fn read_f32(rec: &Record, offset: usize) -> f32 {
    f32::from_le_bytes(rec.data[offset..offset + 4].try_into().unwrap())
}

#[test]
fn seq_scan_reproduces_inserted_payloads() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("a"), str_col("b", 4)]).unwrap();
    let rids = insert_rows(
        &sm,
        "t",
        &[
            vec![Value::Int(1), Value::Str("ab".to_string())],
            vec![Value::Int(2), Value::Str("cd".to_string())],
        ],
    );

    let mut scan = SeqScan::new(&sm, "t", vec![], None).unwrap();
    let rows = drain(&mut scan);
    assert_eq!(rows.len(), 2);
    assert_eq!(read_i32(&rows[0], 0), 1);
    assert_eq!(&rows[0].data[4..8], b"ab\0\0"); // padded to the declared width
    assert_eq!(read_i32(&rows[1], 0), 2);
    assert_eq!(&rows[1].data[4..8], b"cd\0\0");

    // get by rid reproduces the payloads byte for byte
    let fh = sm.file_handle("t").unwrap();
    assert_eq!(fh.get_record(rids[0], None).unwrap(), rows[0]);
    assert_eq!(fh.get_record(rids[1], None).unwrap(), rows[1]);
    sm.close_db().unwrap();
}

#[test]
fn seq_scan_filters_by_conjunction() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("a"), int_col("b")]).unwrap();
    insert_rows(
        &sm,
        "t",
        &[
            vec![Value::Int(1), Value::Int(10)],
            vec![Value::Int(2), Value::Int(20)],
            vec![Value::Int(3), Value::Int(20)],
        ],
    );

    let conds = vec![
        Condition::new(ColumnRef::bare("b"), CmpOp::Eq, Operand::Val(Value::Int(20))),
        Condition::new(ColumnRef::bare("a"), CmpOp::Gt, Operand::Val(Value::Int(2))),
    ];
    let mut scan = SeqScan::new(&sm, "t", conds, None).unwrap();
    let rows = drain(&mut scan);
    assert_eq!(rows.len(), 1);
    assert_eq!(read_i32(&rows[0], 0), 3);
    sm.close_db().unwrap();
}

#[test]
fn seq_scan_on_empty_table_ends_at_begin() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("a")]).unwrap();
    let mut scan = SeqScan::new(&sm, "t", vec![], None).unwrap();
    scan.begin().unwrap();
    assert!(scan.is_end());
    assert_eq!(scan.next_record().unwrap(), None);
    sm.close_db().unwrap();
}

#[test]
fn string_predicate_compares_prefix_then_length() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[str_col("s", 8)]).unwrap();
    insert_rows(
        &sm,
        "t",
        &[
            vec![Value::Str("ab".to_string())],
            vec![Value::Str("abc".to_string())],
        ],
    );

    // "ab" < "abc": common prefix ties break toward the shorter string
    let conds = vec![Condition::new(
        ColumnRef::bare("s"),
        CmpOp::Lt,
        Operand::Val(Value::Str("abc".to_string())),
    )];
    let mut scan = SeqScan::new(&sm, "t", conds, None).unwrap();
    let rows = drain(&mut scan);
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0].data[..2], b"ab");
    sm.close_db().unwrap();
}

#[test]
fn mismatched_types_in_predicate_fail() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("a")]).unwrap();
    insert_rows(&sm, "t", &[vec![Value::Int(1)]]);

    let conds = vec![Condition::new(
        ColumnRef::bare("a"),
        CmpOp::Eq,
        Operand::Val(Value::Str("x".to_string())),
    )];
    let mut scan = SeqScan::new(&sm, "t", conds, None).unwrap();
    assert!(matches!(
        scan.begin(),
        Err(QueryError::IncompatibleType { .. })
    ));
    sm.close_db().unwrap();
}

#[test]
fn int_and_float_columns_are_mutually_comparable() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("a"), float_col("f")]).unwrap();
    insert_rows(
        &sm,
        "t",
        &[
            vec![Value::Int(3), Value::Float(3.0)],
            vec![Value::Int(3), Value::Float(2.5)],
        ],
    );

    let conds = vec![Condition::new(
        ColumnRef::bare("a"),
        CmpOp::Eq,
        Operand::Col(ColumnRef::bare("f")),
    )];
    let mut scan = SeqScan::new(&sm, "t", conds, None).unwrap();
    let rows = drain(&mut scan);
    assert_eq!(rows.len(), 1);
    assert_eq!(read_f32(&rows[0], 4), 3.0);
    sm.close_db().unwrap();
}

#[test]
fn projection_gathers_columns_in_requested_order() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("a"), str_col("b", 2), float_col("c")])
        .unwrap();
    insert_rows(
        &sm,
        "t",
        &[
            vec![Value::Int(1), Value::Str("x".to_string()), Value::Float(3.5)],
            vec![Value::Int(2), Value::Str("y".to_string()), Value::Float(4.5)],
        ],
    );

    let scan = SeqScan::new(&sm, "t", vec![], None).unwrap();
    let mut proj = Projection::new(
        Box::new(scan),
        &[ColumnRef::bare("c"), ColumnRef::bare("a")],
    )
    .unwrap();

    // output layout: [float, int] tightly packed at offsets [0, 4]
    assert_eq!(proj.tuple_len(), 8);
    assert_eq!(proj.columns()[0].offset, 0);
    assert_eq!(proj.columns()[1].offset, 4);

    let rows = drain(&mut proj);
    assert_eq!(rows.len(), 2);
    assert_eq!(read_f32(&rows[0], 0), 3.5);
    assert_eq!(read_i32(&rows[0], 4), 1);
    assert_eq!(read_f32(&rows[1], 0), 4.5);
    assert_eq!(read_i32(&rows[1], 4), 2);
    drop(proj);
    sm.close_db().unwrap();
}

#[test]
fn nested_loop_join_pairs_in_outer_major_order() {
    let (_dir, mut sm) = setup();
    sm.create_table("l", &[int_col("x")]).unwrap();
    sm.create_table("r", &[int_col("y"), int_col("z")]).unwrap();
    insert_rows(&sm, "l", &[vec![Value::Int(1)], vec![Value::Int(2)]]);
    insert_rows(
        &sm,
        "r",
        &[
            vec![Value::Int(1), Value::Int(10)],
            vec![Value::Int(2), Value::Int(20)],
        ],
    );

    let left = SeqScan::new(&sm, "l", vec![], None).unwrap();
    let right = SeqScan::new(&sm, "r", vec![], None).unwrap();
    let conds = vec![Condition::new(
        ColumnRef::new("l", "x"),
        CmpOp::Eq,
        Operand::Col(ColumnRef::new("r", "y")),
    )];
    let mut join = NestedLoopJoin::new(Box::new(left), Box::new(right), conds);
    assert_eq!(join.tuple_len(), 12);

    let rows = drain(&mut join);
    assert_eq!(rows.len(), 2);
    // outer-major: (1, 10) before (2, 20); right offsets shifted past left
    assert_eq!((read_i32(&rows[0], 0), read_i32(&rows[0], 8)), (1, 10));
    assert_eq!((read_i32(&rows[1], 0), read_i32(&rows[1], 8)), (2, 20));
    drop(join);
    sm.close_db().unwrap();
}

#[test]
fn cross_join_without_conditions_sweeps_inner_per_outer() {
    let (_dir, mut sm) = setup();
    sm.create_table("l", &[int_col("x")]).unwrap();
    sm.create_table("r", &[int_col("y")]).unwrap();
    insert_rows(&sm, "l", &[vec![Value::Int(1)], vec![Value::Int(2)]]);
    insert_rows(&sm, "r", &[vec![Value::Int(7)], vec![Value::Int(8)]]);

    let left = SeqScan::new(&sm, "l", vec![], None).unwrap();
    let right = SeqScan::new(&sm, "r", vec![], None).unwrap();
    let mut join = NestedLoopJoin::new(Box::new(left), Box::new(right), vec![]);
    let rows = drain(&mut join);
    let pairs: Vec<(i32, i32)> = rows
        .iter()
        .map(|r| (read_i32(r, 0), read_i32(r, 4)))
        .collect();
    assert_eq!(pairs, vec![(1, 7), (1, 8), (2, 7), (2, 8)]);
    drop(join);
    sm.close_db().unwrap();
}

#[test]
fn sort_orders_ascending_and_descending() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("k")]).unwrap();
    insert_rows(
        &sm,
        "t",
        &[vec![Value::Int(3)], vec![Value::Int(1)], vec![Value::Int(2)]],
    );

    let scan = SeqScan::new(&sm, "t", vec![], None).unwrap();
    let mut sort = Sort::new(Box::new(scan), &ColumnRef::bare("k"), false).unwrap();
    let keys: Vec<i32> = drain(&mut sort).iter().map(|r| read_i32(r, 0)).collect();
    assert_eq!(keys, vec![1, 2, 3]);
    drop(sort);

    let scan = SeqScan::new(&sm, "t", vec![], None).unwrap();
    let mut sort = Sort::new(Box::new(scan), &ColumnRef::bare("k"), true).unwrap();
    let keys: Vec<i32> = drain(&mut sort).iter().map(|r| read_i32(r, 0)).collect();
    assert_eq!(keys, vec![3, 2, 1]);
    drop(sort);
    sm.close_db().unwrap();
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("k"), int_col("seq")]).unwrap();
    insert_rows(
        &sm,
        "t",
        &[
            vec![Value::Int(5), Value::Int(0)],
            vec![Value::Int(1), Value::Int(1)],
            vec![Value::Int(5), Value::Int(2)],
            vec![Value::Int(1), Value::Int(3)],
        ],
    );

    let scan = SeqScan::new(&sm, "t", vec![], None).unwrap();
    let mut sort = Sort::new(Box::new(scan), &ColumnRef::bare("k"), false).unwrap();
    let rows = drain(&mut sort);
    let pairs: Vec<(i32, i32)> = rows
        .iter()
        .map(|r| (read_i32(r, 0), read_i32(r, 4)))
        .collect();
    // equal keys keep their arrival order, ascending and descending alike
    assert_eq!(pairs, vec![(1, 1), (1, 3), (5, 0), (5, 2)]);
    drop(sort);

    let scan = SeqScan::new(&sm, "t", vec![], None).unwrap();
    let mut sort = Sort::new(Box::new(scan), &ColumnRef::bare("k"), true).unwrap();
    let rows = drain(&mut sort);
    let pairs: Vec<(i32, i32)> = rows
        .iter()
        .map(|r| (read_i32(r, 0), read_i32(r, 4)))
        .collect();
    assert_eq!(pairs, vec![(5, 0), (5, 2), (1, 1), (1, 3)]);
    drop(sort);
    sm.close_db().unwrap();
}

#[test]
fn update_rewrites_records_and_maintains_index() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("a"), str_col("b", 2)]).unwrap();
    let rids = insert_rows(&sm, "t", &[vec![Value::Int(5), Value::Str("p".to_string())]]);
    let rid = rids[0];
    sm.create_index("t", &["a".to_string()]).unwrap();

    // the index build at create_index picked up the existing row
    let index_name = sm.table_meta("t").unwrap().indexes[0].name();
    assert_eq!(
        sm.index_handle(&index_name).unwrap().lock().unwrap().get(&5i32.to_le_bytes()),
        Some(rid)
    );

    let mut update = Update::new(
        &sm,
        "t",
        vec![SetClause {
            col_name: "a".to_string(),
            value: Value::Int(7),
        }],
        vec![rid],
        None,
    )
    .unwrap();
    update.begin().unwrap();
    assert_eq!(update.next_record().unwrap(), None);
    assert!(update.is_end());

    let fh = sm.file_handle("t").unwrap();
    let rec = fh.get_record(rid, None).unwrap();
    assert_eq!(read_i32(&rec, 0), 7);
    assert_eq!(&rec.data[4..6], b"p\0");

    let ih = sm.index_handle(&index_name).unwrap().lock().unwrap();
    assert_eq!(ih.get(&5i32.to_le_bytes()), None);
    assert_eq!(ih.get(&7i32.to_le_bytes()), Some(rid));
    drop(ih);
    sm.close_db().unwrap();
}

#[test]
fn update_converts_numeric_values_and_rejects_string_coercion() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[float_col("f"), str_col("s", 4)]).unwrap();
    let rids = insert_rows(
        &sm,
        "t",
        &[vec![Value::Float(1.5), Value::Str("ab".to_string())]],
    );

    // INT assigned to FLOAT converts implicitly
    let mut update = Update::new(
        &sm,
        "t",
        vec![SetClause {
            col_name: "f".to_string(),
            value: Value::Int(3),
        }],
        rids.clone(),
        None,
    )
    .unwrap();
    update.next_record().unwrap();
    let fh = sm.file_handle("t").unwrap();
    assert_eq!(read_f32(&fh.get_record(rids[0], None).unwrap(), 0), 3.0);

    // INT assigned to STRING is an error
    let mut update = Update::new(
        &sm,
        "t",
        vec![SetClause {
            col_name: "s".to_string(),
            value: Value::Int(3),
        }],
        rids,
        None,
    )
    .unwrap();
    assert!(matches!(
        update.next_record(),
        Err(QueryError::IncompatibleType { .. })
    ));
    sm.close_db().unwrap();
}

#[test]
fn conflicting_row_locks_abort_the_second_transaction() {
    let (_dir, mut sm) = setup();
    sm.create_table("t", &[int_col("a")]).unwrap();
    let rids = insert_rows(&sm, "t", &[vec![Value::Int(1)]]);

    let lock_mgr = LockManager::new();
    let t1 = Transaction::new(1, 100);
    let t2 = Transaction::new(2, 101);
    let ctx1 = Context::new(&lock_mgr, &t1);
    let ctx2 = Context::new(&lock_mgr, &t2);

    let fh = sm.file_handle("t").unwrap();
    let rec = fh.get_record(rids[0], Some(&ctx1)).unwrap();
    fh.update_record(rids[0], &rec.data, Some(&ctx1)).unwrap();

    // t1 holds the exclusive row lock; t2's read aborts instead of waiting
    assert!(matches!(
        fh.get_record(rids[0], Some(&ctx2)),
        Err(StorageError::TransactionAborted)
    ));

    lock_mgr.release_all(&t1);
    assert!(fh.get_record(rids[0], Some(&ctx2)).is_ok());
    sm.close_db().unwrap();
}
