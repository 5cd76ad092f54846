use crate::transaction::Transaction;
use crate::types::catalog_types::{ColMeta, TabMeta};
use crate::types::record_types::{Record, Rid};
use std::collections::BTreeMap;

/// In-memory secondary index handle over concatenated column bytes.
///
/// The executor maintains entries around updates; the catalog rebuilds the
/// map from a table scan at database open. On-disk persistence is not this
/// handle's concern.
#[derive(Debug, Clone)]
pub struct BTreeIndex {
    pub tab_name: String,
    pub col_names: Vec<String>,
    map: BTreeMap<Vec<u8>, Rid>,
}

impl BTreeIndex {
    pub fn new(tab_name: &str, col_names: &[String]) -> Self {
        Self {
            tab_name: tab_name.to_string(),
            col_names: col_names.to_vec(),
            map: BTreeMap::new(),
        }
    }

    pub fn insert_entry(&mut self, key: &[u8], rid: Rid, _txn: Option<&Transaction>) {
        self.map.insert(key.to_vec(), rid);
    }

    pub fn delete_entry(&mut self, key: &[u8], _txn: Option<&Transaction>) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn get(&self, key: &[u8]) -> Option<Rid> {
        self.map.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Extract this index's key bytes from a record of the owning table.
    pub fn key_from_record(&self, tab: &TabMeta, rec: &Record) -> Vec<u8> {
        let cols: Vec<&ColMeta> = self
            .col_names
            .iter()
            .filter_map(|name| tab.get_col(name))
            .collect();
        let mut key = Vec::with_capacity(cols.iter().map(|c| c.len).sum());
        for col in cols {
            key.extend_from_slice(&rec.data[col.offset..col.offset + col.len]);
        }
        key
    }
}
