use crate::errors::query_error::QueryError;
use crate::types::filter_types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Column type tag. Strings are fixed-width, null-padded to the declared
/// length kept in `ColMeta::len`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColType {
    Int,
    Float,
    Str,
}

impl fmt::Display for ColType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColType::Int => "INT",
            ColType::Float => "FLOAT",
            ColType::Str => "STRING",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColMeta {
    pub tab_name: String,  // owning table
    pub name: String,      // column name
    pub col_type: ColType, // type tag
    pub len: usize,        // byte length inside a record
    pub offset: usize,     // byte offset inside a record
    pub indexed: bool,     // whether a secondary index covers this column
}

/// Column definition as handed to `create_table`; offsets are assigned by
/// the catalog in declaration order.
#[derive(Debug, Clone)]
pub struct ColDef {
    pub name: String,
    pub col_type: ColType,
    pub len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub tab_name: String,
    pub col_names: Vec<String>,
}

impl IndexMeta {
    /// Naming convention for index handles: `<table>_<col>_<col>.idx`.
    pub fn name(&self) -> String {
        format!("{}_{}.idx", self.tab_name, self.col_names.join("_"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabMeta {
    pub name: String,
    pub cols: Vec<ColMeta>,
    pub indexes: Vec<IndexMeta>,
}

impl TabMeta {
    /// Total record width: columns are tightly packed in declaration order.
    pub fn record_size(&self) -> usize {
        self.cols.iter().map(|c| c.len).sum()
    }

    pub fn get_col(&self, name: &str) -> Option<&ColMeta> {
        self.cols.iter().find(|c| c.name == name)
    }

    /// Serialize one value per column into a fresh record buffer.
    pub fn build_record(&self, values: &[Value]) -> Result<Vec<u8>, QueryError> {
        if values.len() != self.cols.len() {
            return Err(QueryError::Internal(format!(
                "expected {} values for table '{}', got {}",
                self.cols.len(),
                self.name,
                values.len()
            )));
        }
        let mut buf = vec![0u8; self.record_size()];
        for (col, val) in self.cols.iter().zip(values) {
            val.write_to(col, &mut buf[col.offset..col.offset + col.len])?;
        }
        Ok(buf)
    }
}

/// On-disk catalog snapshot: the content of the DB_META file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbMeta {
    pub name: String,
    pub tables: BTreeMap<String, TabMeta>,
}

impl DbMeta {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tables: BTreeMap::new(),
        }
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}
