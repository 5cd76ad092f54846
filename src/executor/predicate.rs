use crate::errors::query_error::{QueryError, QueryResult};
use crate::types::catalog_types::{ColMeta, ColType};
use crate::types::filter_types::{CmpOp, ColumnRef, Condition, Operand, Value};
use crate::types::record_types::Record;
use std::cmp::Ordering;

/// Resolve a column reference in an operand schema. An empty table name
/// matches on the column name alone.
pub fn find_col<'a>(cols: &'a [ColMeta], target: &ColumnRef) -> QueryResult<&'a ColMeta> {
    Ok(&cols[find_col_idx(cols, target)?])
}

pub fn find_col_idx(cols: &[ColMeta], target: &ColumnRef) -> QueryResult<usize> {
    cols.iter()
        .position(|c| {
            (target.tab_name.is_empty() || c.tab_name == target.tab_name)
                && c.name == target.col_name
        })
        .ok_or_else(|| QueryError::ColumnNotFound(target.to_string()))
}

fn numeric(ty: ColType) -> bool {
    matches!(ty, ColType::Int | ColType::Float)
}

fn read_f32(ty: ColType, bytes: &[u8]) -> f32 {
    match ty {
        ColType::Int => i32::from_le_bytes(bytes[..4].try_into().unwrap()) as f32,
        _ => f32::from_le_bytes(bytes[..4].try_into().unwrap()),
    }
}

/// Length of a string column's payload: up to the first NUL, capped at the
/// declared width.
fn effective_len(bytes: &[u8]) -> usize {
    bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len())
}

/// Compare two typed byte slices.
///
/// INT and FLOAT are mutually comparable (the INT side is promoted);
/// everything else requires matching types. Strings compare as byte
/// sequences over their effective lengths, shorter-is-smaller on a tie.
/// Float comparison falls back to `Equal` for NaN operands.
pub fn compare_bytes(
    lhs_type: ColType,
    lhs: &[u8],
    rhs_type: ColType,
    rhs: &[u8],
) -> QueryResult<Ordering> {
    match (lhs_type, rhs_type) {
        (ColType::Int, ColType::Int) => {
            let a = i32::from_le_bytes(lhs[..4].try_into().unwrap());
            let b = i32::from_le_bytes(rhs[..4].try_into().unwrap());
            Ok(a.cmp(&b))
        }
        _ if numeric(lhs_type) && numeric(rhs_type) => {
            let a = read_f32(lhs_type, lhs);
            let b = read_f32(rhs_type, rhs);
            Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
        }
        (ColType::Str, ColType::Str) => {
            let a = &lhs[..effective_len(lhs)];
            let b = &rhs[..effective_len(rhs)];
            Ok(a.cmp(b))
        }
        _ => Err(QueryError::IncompatibleType {
            lhs: lhs_type,
            rhs: rhs_type,
        }),
    }
}

fn op_matches(op: CmpOp, ord: Ordering) -> bool {
    match op {
        CmpOp::Eq => ord == Ordering::Equal,
        CmpOp::Ne => ord != Ordering::Equal,
        CmpOp::Lt => ord == Ordering::Less,
        CmpOp::Gt => ord == Ordering::Greater,
        CmpOp::Le => ord != Ordering::Greater,
        CmpOp::Ge => ord != Ordering::Less,
    }
}

fn value_bytes(val: &Value) -> Vec<u8> {
    match val {
        Value::Int(v) => v.to_le_bytes().to_vec(),
        Value::Float(v) => v.to_le_bytes().to_vec(),
        Value::Str(s) => s.as_bytes().to_vec(),
    }
}

/// Evaluate one condition against a record laid out by `cols`.
pub fn eval_cond(cols: &[ColMeta], cond: &Condition, rec: &Record) -> QueryResult<bool> {
    let lhs_col = find_col(cols, &cond.lhs)?;
    let lhs = &rec.data[lhs_col.offset..lhs_col.offset + lhs_col.len];

    let ord = match &cond.rhs {
        Operand::Col(rhs_ref) => {
            let rhs_col = find_col(cols, rhs_ref)?;
            let rhs = &rec.data[rhs_col.offset..rhs_col.offset + rhs_col.len];
            compare_bytes(lhs_col.col_type, lhs, rhs_col.col_type, rhs)?
        }
        Operand::Val(val) => {
            let rhs = value_bytes(val);
            compare_bytes(lhs_col.col_type, lhs, val.col_type(), &rhs)?
        }
    };
    Ok(op_matches(cond.op, ord))
}

/// A predicate is the conjunction of its conditions.
pub fn eval_conds(cols: &[ColMeta], conds: &[Condition], rec: &Record) -> QueryResult<bool> {
    for cond in conds {
        if !eval_cond(cols, cond, rec)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Ordering of two same-schema records on one key column. Infallible: both
/// sides carry the column's own type.
pub fn compare_on_col(col: &ColMeta, a: &Record, b: &Record) -> Ordering {
    let lhs = &a.data[col.offset..col.offset + col.len];
    let rhs = &b.data[col.offset..col.offset + col.len];
    match col.col_type {
        ColType::Int => {
            let a = i32::from_le_bytes(lhs[..4].try_into().unwrap());
            let b = i32::from_le_bytes(rhs[..4].try_into().unwrap());
            a.cmp(&b)
        }
        ColType::Float => {
            let a = f32::from_le_bytes(lhs[..4].try_into().unwrap());
            let b = f32::from_le_bytes(rhs[..4].try_into().unwrap());
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        ColType::Str => lhs[..effective_len(lhs)].cmp(&rhs[..effective_len(rhs)]),
    }
}
