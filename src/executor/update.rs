use crate::catalog::catalog_manager::CatalogManager;
use crate::executor::Executor;
use crate::errors::query_error::{QueryError, QueryResult};
use crate::record::heap_file::HeapFile;
use crate::transaction::Context;
use crate::types::catalog_types::{ColMeta, TabMeta};
use crate::types::filter_types::SetClause;
use crate::types::record_types::{Record, Rid};

/// Update operator: applies the set clauses to every target rid, keeping
/// the table's secondary indexes in step. Yields no tuples; `next_record`
/// drives the side effects to completion.
pub struct Update<'a> {
    sm: &'a CatalogManager,
    tab: TabMeta,
    fh: &'a HeapFile,
    set_clauses: Vec<SetClause>,
    rids: Vec<Rid>,
    ctx: Option<&'a Context<'a>>,
    done: bool,
}

impl<'a> Update<'a> {
    pub fn new(
        sm: &'a CatalogManager,
        tab_name: &str,
        set_clauses: Vec<SetClause>,
        rids: Vec<Rid>,
        ctx: Option<&'a Context<'a>>,
    ) -> QueryResult<Self> {
        let tab = sm.table_meta(tab_name)?.clone();
        let fh = sm.file_handle(tab_name)?;
        Ok(Self {
            sm,
            tab,
            fh,
            set_clauses,
            rids,
            ctx,
            done: false,
        })
    }

    /// Remove a record's keys from every secondary index of the table.
    fn delete_index_entries(&self, rec: &Record) -> QueryResult<()> {
        for imeta in &self.tab.indexes {
            let ih = self.sm.index_handle(&imeta.name())?;
            let mut ih = ih.lock().unwrap();
            let key = ih.key_from_record(&self.tab, rec);
            ih.delete_entry(&key, self.ctx.map(|c| c.txn));
        }
        Ok(())
    }

    /// Insert a record's keys into every secondary index of the table.
    fn insert_index_entries(&self, rec: &Record, rid: Rid) -> QueryResult<()> {
        for imeta in &self.tab.indexes {
            let ih = self.sm.index_handle(&imeta.name())?;
            let mut ih = ih.lock().unwrap();
            let key = ih.key_from_record(&self.tab, rec);
            ih.insert_entry(&key, rid, self.ctx.map(|c| c.txn));
        }
        Ok(())
    }

    fn apply_set_clauses(&self, rec: &mut Record) -> QueryResult<()> {
        for clause in &self.set_clauses {
            let col = self
                .tab
                .get_col(&clause.col_name)
                .ok_or_else(|| QueryError::ColumnNotFound(clause.col_name.clone()))?;
            clause
                .value
                .write_to(col, &mut rec.data[col.offset..col.offset + col.len])?;
        }
        Ok(())
    }
}

impl Executor for Update<'_> {
    fn begin(&mut self) -> QueryResult<()> {
        Ok(())
    }

    fn advance(&mut self) -> QueryResult<()> {
        Ok(())
    }

    fn is_end(&self) -> bool {
        self.done
    }

    fn next_record(&mut self) -> QueryResult<Option<Record>> {
        for rid in self.rids.clone() {
            let old_rec = self.fh.get_record(rid, self.ctx)?;
            let mut new_rec = old_rec.clone();

            // Old keys leave the indexes before the record changes.
            self.delete_index_entries(&old_rec)?;
            self.apply_set_clauses(&mut new_rec)?;
            self.insert_index_entries(&new_rec, rid)?;

            self.fh.update_record(rid, &new_rec.data, self.ctx)?;
        }
        self.done = true;
        Ok(None)
    }

    fn columns(&self) -> &[ColMeta] {
        &[]
    }

    fn tuple_len(&self) -> usize {
        0
    }
}
