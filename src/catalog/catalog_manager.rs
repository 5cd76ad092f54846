use crate::catalog::io::{load_meta, save_meta_atomic};
use crate::catalog::validate::validate_table;
use crate::consts::catalog_consts::LOG_FILE;
use crate::errors::catalog_error::CatalogError;
use crate::index::BTreeIndex;
use crate::printer::render_table;
use crate::record::heap_file::HeapFile;
use crate::storage::disk_manager::DiskManager;
use crate::storage::page_cache::PageCache;
use crate::transaction::Context;
use crate::types::catalog_types::{ColDef, ColMeta, DbMeta, IndexMeta, TabMeta};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

struct OpenDb {
    meta: DbMeta,
    dir: PathBuf,
    // table name -> record file handle
    fhs: HashMap<String, HeapFile>,
    // index name -> index handle
    ihs: HashMap<String, Mutex<BTreeIndex>>,
}

/// Owns the current database: its metadata, its record-file handles, and
/// its index handles. All paths are absolute under `base_dir`; the process
/// working directory is never touched.
pub struct CatalogManager {
    base_dir: PathBuf,
    disk: Arc<DiskManager>,
    cache: Arc<PageCache>,
    db: Option<OpenDb>,
}

impl CatalogManager {
    pub fn new(base_dir: &Path, disk: Arc<DiskManager>, cache: Arc<PageCache>) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            disk,
            cache,
            db: None,
        }
    }

    fn db_dir(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn open_db_ref(&self) -> Result<&OpenDb, CatalogError> {
        self.db
            .as_ref()
            .ok_or_else(|| CatalogError::Invalid("no database is open".to_string()))
    }

    fn open_db_mut(&mut self) -> Result<&mut OpenDb, CatalogError> {
        self.db
            .as_mut()
            .ok_or_else(|| CatalogError::Invalid("no database is open".to_string()))
    }

    /// Create a database directory with a fresh metadata file and an empty
    /// log file inside it.
    pub fn create_db(&self, name: &str) -> Result<(), CatalogError> {
        let dir = self.db_dir(name);
        if DiskManager::is_dir(&dir) {
            return Err(CatalogError::DatabaseExists(name.to_string()));
        }
        fs::create_dir_all(&dir)?;
        save_meta_atomic(&dir, &DbMeta::new(name))?;
        self.disk.create_file(&dir.join(LOG_FILE))?;
        info!(db = name, "created database");
        Ok(())
    }

    /// Recursively remove a database directory.
    pub fn drop_db(&self, name: &str) -> Result<(), CatalogError> {
        let dir = self.db_dir(name);
        if !DiskManager::is_dir(&dir) {
            return Err(CatalogError::DatabaseNotFound(name.to_string()));
        }
        if let Some(db) = &self.db {
            if db.meta.name == name {
                return Err(CatalogError::Invalid(format!(
                    "database '{}' is currently open",
                    name
                )));
            }
        }
        fs::remove_dir_all(&dir)?;
        info!(db = name, "dropped database");
        Ok(())
    }

    /// Load the metadata file, open every table's record file, rebuild
    /// every declared index, and bind the shared log file.
    pub fn open_db(&mut self, name: &str) -> Result<(), CatalogError> {
        if self.db.is_some() {
            return Err(CatalogError::Invalid(
                "a database is already open".to_string(),
            ));
        }
        let dir = self.db_dir(name);
        if !DiskManager::is_dir(&dir) {
            return Err(CatalogError::DatabaseNotFound(name.to_string()));
        }
        let meta = load_meta(&dir)?;

        let mut fhs = HashMap::new();
        let mut ihs = HashMap::new();
        for (tab_name, tab) in &meta.tables {
            let fh = HeapFile::open(Arc::clone(&self.cache), &dir.join(tab_name))?;
            for imeta in &tab.indexes {
                let index = build_index(tab, &fh, imeta)?;
                ihs.insert(imeta.name(), Mutex::new(index));
            }
            fhs.insert(tab_name.clone(), fh);
        }

        self.disk.open_log(&dir.join(LOG_FILE))?;
        info!(db = name, tables = meta.tables.len(), "opened database");
        self.db = Some(OpenDb {
            meta,
            dir,
            fhs,
            ihs,
        });
        Ok(())
    }

    /// Flush metadata, close every record-file and index handle, and clear
    /// the in-memory state.
    pub fn close_db(&mut self) -> Result<(), CatalogError> {
        let db = self
            .db
            .take()
            .ok_or_else(|| CatalogError::Invalid("no database is open".to_string()))?;
        save_meta_atomic(&db.dir, &db.meta)?;
        let name = db.meta.name.clone();
        for (_, fh) in db.fhs {
            fh.close()?;
        }
        // index handles are in-memory only; dropping them is the close
        drop(db.ihs);
        self.disk.close_log()?;
        info!(db = %name, "closed database");
        Ok(())
    }

    /// Flush the catalog of the open database to disk.
    pub fn flush_meta(&self) -> Result<(), CatalogError> {
        let db = self.open_db_ref()?;
        save_meta_atomic(&db.dir, &db.meta)
    }

    /// Create a table: assign contiguous column offsets, create its record
    /// file, open the handle, and flush the metadata.
    pub fn create_table(&mut self, name: &str, col_defs: &[ColDef]) -> Result<(), CatalogError> {
        let disk = Arc::clone(&self.disk);
        let cache = Arc::clone(&self.cache);
        let db = self.open_db_mut()?;
        if db.meta.has_table(name) {
            return Err(CatalogError::TableExists(name.to_string()));
        }

        let mut cols = Vec::with_capacity(col_defs.len());
        let mut offset = 0usize;
        for def in col_defs {
            cols.push(ColMeta {
                tab_name: name.to_string(),
                name: def.name.clone(),
                col_type: def.col_type,
                len: def.len,
                offset,
                indexed: false,
            });
            offset += def.len;
        }
        let tab = TabMeta {
            name: name.to_string(),
            cols,
            indexes: Vec::new(),
        };
        validate_table(&tab)?;

        let path = db.dir.join(name);
        HeapFile::create(&disk, &path, tab.record_size())?;
        let fh = HeapFile::open(cache, &path)?;
        db.fhs.insert(name.to_string(), fh);
        db.meta.tables.insert(name.to_string(), tab);
        save_meta_atomic(&db.dir, &db.meta)?;
        info!(table = name, "created table");
        Ok(())
    }

    /// Drop a table: take an exclusive table lock when a context is given,
    /// drop its indexes, close and destroy its record file, and flush the
    /// metadata.
    pub fn drop_table(&mut self, name: &str, ctx: Option<&Context>) -> Result<(), CatalogError> {
        let disk = Arc::clone(&self.disk);
        let db = self.open_db_mut()?;
        if !db.meta.has_table(name) {
            return Err(CatalogError::TableNotFound(name.to_string()));
        }
        if let (Some(ctx), Some(fh)) = (ctx, db.fhs.get(name)) {
            ctx.lock_mgr.lock_exclusive_on_table(ctx.txn, fh.fd())?;
        }

        let tab = match db.meta.tables.remove(name) {
            Some(tab) => tab,
            None => return Err(CatalogError::TableNotFound(name.to_string())),
        };
        for imeta in &tab.indexes {
            db.ihs.remove(&imeta.name());
        }
        if let Some(fh) = db.fhs.remove(name) {
            fh.close()?;
        }
        HeapFile::destroy(&disk, &db.dir.join(name))?;
        save_meta_atomic(&db.dir, &db.meta)?;
        info!(table = name, "dropped table");
        Ok(())
    }

    /// Register a secondary index over `col_names` and build it from a full
    /// table scan.
    pub fn create_index(&mut self, tab_name: &str, col_names: &[String]) -> Result<(), CatalogError> {
        let db = self.open_db_mut()?;
        let tab = db
            .meta
            .tables
            .get_mut(tab_name)
            .ok_or_else(|| CatalogError::TableNotFound(tab_name.to_string()))?;
        let imeta = IndexMeta {
            tab_name: tab_name.to_string(),
            col_names: col_names.to_vec(),
        };
        if db.ihs.contains_key(&imeta.name()) {
            return Err(CatalogError::IndexExists(imeta.name()));
        }
        for col_name in col_names {
            if tab.get_col(col_name).is_none() {
                return Err(CatalogError::Invalid(format!(
                    "no column '{}' in table '{}'",
                    col_name, tab_name
                )));
            }
        }

        for col in tab.cols.iter_mut() {
            if col_names.contains(&col.name) {
                col.indexed = true;
            }
        }
        tab.indexes.push(imeta.clone());

        let fh = db
            .fhs
            .get(tab_name)
            .ok_or_else(|| CatalogError::TableNotFound(tab_name.to_string()))?;
        let index = build_index(tab, fh, &imeta)?;
        db.ihs.insert(imeta.name(), Mutex::new(index));
        save_meta_atomic(&db.dir, &db.meta)?;
        Ok(())
    }

    /// Unregister a secondary index and drop its handle.
    pub fn drop_index(&mut self, tab_name: &str, col_names: &[String]) -> Result<(), CatalogError> {
        let db = self.open_db_mut()?;
        let tab = db
            .meta
            .tables
            .get_mut(tab_name)
            .ok_or_else(|| CatalogError::TableNotFound(tab_name.to_string()))?;
        let name = IndexMeta {
            tab_name: tab_name.to_string(),
            col_names: col_names.to_vec(),
        }
        .name();
        if db.ihs.remove(&name).is_none() {
            return Err(CatalogError::IndexNotFound(name));
        }
        tab.indexes
            .retain(|imeta| imeta.name() != name);
        let still_indexed: Vec<String> = tab
            .indexes
            .iter()
            .flat_map(|imeta| imeta.col_names.iter().cloned())
            .collect();
        for col in tab.cols.iter_mut() {
            col.indexed = still_indexed.contains(&col.name);
        }
        save_meta_atomic(&db.dir, &db.meta)?;
        Ok(())
    }

    /// Render the list of tables of the open database.
    pub fn show_tables(&self) -> Result<String, CatalogError> {
        let db = self.open_db_ref()?;
        let rows: Vec<Vec<String>> = db.meta.tables.keys().map(|t| vec![t.clone()]).collect();
        Ok(render_table(&["Tables"], &rows))
    }

    /// Render the schema of one table: field, type, indexed.
    pub fn desc_table(&self, name: &str) -> Result<String, CatalogError> {
        let tab = self.table_meta(name)?;
        let rows: Vec<Vec<String>> = tab
            .cols
            .iter()
            .map(|col| {
                vec![
                    col.name.clone(),
                    col.col_type.to_string(),
                    if col.indexed { "YES" } else { "NO" }.to_string(),
                ]
            })
            .collect();
        Ok(render_table(&["Field", "Type", "Index"], &rows))
    }

    pub fn db_meta(&self) -> Result<&DbMeta, CatalogError> {
        Ok(&self.open_db_ref()?.meta)
    }

    pub fn table_meta(&self, name: &str) -> Result<&TabMeta, CatalogError> {
        self.open_db_ref()?
            .meta
            .tables
            .get(name)
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))
    }

    pub fn file_handle(&self, name: &str) -> Result<&HeapFile, CatalogError> {
        self.open_db_ref()?
            .fhs
            .get(name)
            .ok_or_else(|| CatalogError::TableNotFound(name.to_string()))
    }

    pub fn index_handle(&self, name: &str) -> Result<&Mutex<BTreeIndex>, CatalogError> {
        self.open_db_ref()?
            .ihs
            .get(name)
            .ok_or_else(|| CatalogError::IndexNotFound(name.to_string()))
    }
}

/// Populate an index handle from a full scan of the table's heap file.
fn build_index(
    tab: &TabMeta,
    fh: &HeapFile,
    imeta: &IndexMeta,
) -> Result<BTreeIndex, CatalogError> {
    let mut index = BTreeIndex::new(&imeta.tab_name, &imeta.col_names);
    let mut scan = fh.scan()?;
    while !scan.is_end() {
        let rid = scan.rid();
        let rec = fh.get_record(rid, None)?;
        let key = index.key_from_record(tab, &rec);
        index.insert_entry(&key, rid, None);
        scan.next()?;
    }
    Ok(index)
}
