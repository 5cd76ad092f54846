use crate::errors::query_error::QueryResult;
use crate::transaction::Transaction;
use crate::types::catalog_types::TabMeta;
use crate::types::record_types::{Record, TupleMeta, UndoLog};

/// Rebuild the version of a tuple visible before the given undo chain.
///
/// The base tuple's tombstone short-circuits to `None`. Undo entries are
/// applied walking the slice from its back: a deleting entry yields `None`,
/// a full before-image replaces the whole buffer, and a partial entry
/// patches exactly the columns its `modified` flags select.
pub fn reconstruct_record(
    schema: &TabMeta,
    base: &Record,
    base_meta: &TupleMeta,
    undo_logs: &[UndoLog],
) -> QueryResult<Option<Record>> {
    if base_meta.is_deleted {
        return Ok(None);
    }

    let mut result = base.clone();
    for log in undo_logs.iter().rev() {
        if log.is_deleted {
            return Ok(None);
        }
        if let Some(image) = &log.full_image {
            result.data.copy_from_slice(&image.data);
            continue;
        }
        for (i, col) in schema.cols.iter().enumerate() {
            if !log.modified.get(i).copied().unwrap_or(false) {
                continue;
            }
            if let Some(val) = log.values.get(i) {
                val.write_to(col, &mut result.data[col.offset..col.offset + col.len])?;
            }
        }
    }
    Ok(Some(result))
}

/// A tuple written after the transaction's snapshot began conflicts with
/// any write from that transaction.
pub fn is_write_write_conflict(tuple_ts: u64, txn: &Transaction) -> bool {
    tuple_ts > txn.start_ts()
}
