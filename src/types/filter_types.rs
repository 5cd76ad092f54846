use crate::errors::query_error::QueryError;
use crate::types::catalog_types::{ColMeta, ColType};
use std::fmt;

/// A typed constant appearing in a condition or a set clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Str(String),
}

impl Value {
    pub fn col_type(&self) -> ColType {
        match self {
            Value::Int(_) => ColType::Int,
            Value::Float(_) => ColType::Float,
            Value::Str(_) => ColType::Str,
        }
    }

    /// Serialize into exactly `col.len` bytes at `out`.
    ///
    /// INT and FLOAT convert into each other implicitly; STRING conversions
    /// are errors, as is a string longer than the declared column width.
    /// Strings are null-padded to the full width.
    pub fn write_to(&self, col: &ColMeta, out: &mut [u8]) -> Result<(), QueryError> {
        debug_assert_eq!(out.len(), col.len);
        match (col.col_type, self) {
            (ColType::Int, Value::Int(v)) => out.copy_from_slice(&v.to_le_bytes()),
            (ColType::Int, Value::Float(v)) => out.copy_from_slice(&(*v as i32).to_le_bytes()),
            (ColType::Float, Value::Float(v)) => out.copy_from_slice(&v.to_le_bytes()),
            (ColType::Float, Value::Int(v)) => out.copy_from_slice(&(*v as f32).to_le_bytes()),
            (ColType::Str, Value::Str(s)) => {
                let bytes = s.as_bytes();
                if bytes.len() > col.len {
                    return Err(QueryError::IncompatibleType {
                        lhs: ColType::Str,
                        rhs: ColType::Str,
                    });
                }
                out[..bytes.len()].copy_from_slice(bytes);
                out[bytes.len()..].fill(0);
            }
            _ => {
                return Err(QueryError::IncompatibleType {
                    lhs: col.col_type,
                    rhs: self.col_type(),
                })
            }
        }
        Ok(())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Comparison operators usable in a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// A (possibly table-qualified) column reference. An empty table name
/// matches the first column with the given name in the operand schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub tab_name: String,
    pub col_name: String,
}

impl ColumnRef {
    pub fn new(tab_name: &str, col_name: &str) -> Self {
        Self {
            tab_name: tab_name.to_string(),
            col_name: col_name.to_string(),
        }
    }

    pub fn bare(col_name: &str) -> Self {
        Self::new("", col_name)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tab_name.is_empty() {
            f.write_str(&self.col_name)
        } else {
            write!(f, "{}.{}", self.tab_name, self.col_name)
        }
    }
}

/// Right-hand side of a condition: another column or a constant.
#[derive(Debug, Clone)]
pub enum Operand {
    Col(ColumnRef),
    Val(Value),
}

/// One comparison; a predicate is a conjunction of these.
#[derive(Debug, Clone)]
pub struct Condition {
    pub lhs: ColumnRef,
    pub op: CmpOp,
    pub rhs: Operand,
}

impl Condition {
    pub fn new(lhs: ColumnRef, op: CmpOp, rhs: Operand) -> Self {
        Self { lhs, op, rhs }
    }
}

/// `SET col = value` assignment of an update.
#[derive(Debug, Clone)]
pub struct SetClause {
    pub col_name: String,
    pub value: Value,
}
