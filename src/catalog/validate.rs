use crate::errors::catalog_error::CatalogError;
use crate::record::slotted_page::FileHeader;
use crate::types::catalog_types::{DbMeta, TabMeta};
use std::collections::HashSet;

/// Structural checks applied to metadata on load and before table creation.
pub fn validate_meta(meta: &DbMeta) -> Result<(), CatalogError> {
    for (name, tab) in &meta.tables {
        if name != &tab.name {
            return Err(CatalogError::Invalid(format!(
                "table registered as '{}' but named '{}'",
                name, tab.name
            )));
        }
        validate_table(tab)?;
    }
    Ok(())
}

pub fn validate_table(tab: &TabMeta) -> Result<(), CatalogError> {
    if tab.cols.is_empty() {
        return Err(CatalogError::Invalid(format!(
            "table '{}' has no columns",
            tab.name
        )));
    }

    let mut seen = HashSet::new();
    let mut expected_offset = 0usize;
    for col in &tab.cols {
        if !seen.insert(col.name.as_str()) {
            return Err(CatalogError::Invalid(format!(
                "duplicate column '{}' in table '{}'",
                col.name, tab.name
            )));
        }
        if col.len == 0 {
            return Err(CatalogError::Invalid(format!(
                "zero-width column '{}' in table '{}'",
                col.name, tab.name
            )));
        }
        if col.offset != expected_offset {
            return Err(CatalogError::Invalid(format!(
                "column '{}' of table '{}' at offset {}, expected {}",
                col.name, tab.name, col.offset, expected_offset
            )));
        }
        expected_offset += col.len;
    }

    if FileHeader::for_record_size(tab.record_size()).is_none() {
        return Err(CatalogError::Invalid(format!(
            "record of table '{}' ({} bytes) does not fit a page",
            tab.name,
            tab.record_size()
        )));
    }
    Ok(())
}
