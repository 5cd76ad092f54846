use crate::consts::catalog_consts::DB_META_FILE;
use crate::errors::catalog_error::CatalogError;
use crate::types::catalog_types::DbMeta;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub fn load_meta(db_dir: &Path) -> Result<DbMeta, CatalogError> {
    let path = db_dir.join(DB_META_FILE);
    let f = File::open(&path)?;
    let reader = BufReader::new(f);
    let meta: DbMeta = serde_json::from_reader(reader)?;
    super::validate::validate_meta(&meta)?;
    Ok(meta)
}

/// Rewrite the metadata file atomically: serialize into a temp file in the
/// same directory, sync, then rename over the final path. A failure at any
/// point leaves the previous snapshot untouched.
pub fn save_meta_atomic(db_dir: &Path, meta: &DbMeta) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(meta)?;

    let tmp = NamedTempFile::new_in(db_dir)?;
    {
        let mut f = tmp.as_file();
        f.write_all(json.as_bytes())?;
        f.sync_all()?;
    }

    let final_path = db_dir.join(DB_META_FILE);
    tmp.persist(&final_path)
        .map_err(|e| CatalogError::Invalid(format!("persist failed: {}", e)))?;

    // on unix: also sync directory metadata
    #[cfg(unix)]
    {
        let dirfd = File::open(db_dir)?;
        dirfd.sync_all()?;
    }

    Ok(())
}
