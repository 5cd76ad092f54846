use crate::catalog::catalog_manager::CatalogManager;
use crate::executor::predicate::eval_conds;
use crate::executor::Executor;
use crate::errors::query_error::{QueryError, QueryResult};
use crate::record::heap_file::HeapFile;
use crate::record::scan::RecordScan;
use crate::transaction::Context;
use crate::types::catalog_types::ColMeta;
use crate::types::filter_types::Condition;
use crate::types::record_types::{Record, Rid};

/// Sequential scan over one table, filtered by a conjunction of conditions.
pub struct SeqScan<'a> {
    fh: &'a HeapFile,
    conds: Vec<Condition>,
    cols: Vec<ColMeta>,
    len: usize,
    rid: Rid,
    scan: Option<RecordScan<'a>>,
    ctx: Option<&'a Context<'a>>,
}

impl<'a> SeqScan<'a> {
    pub fn new(
        sm: &'a CatalogManager,
        tab_name: &str,
        conds: Vec<Condition>,
        ctx: Option<&'a Context<'a>>,
    ) -> QueryResult<Self> {
        let tab = sm.table_meta(tab_name)?;
        let fh = sm.file_handle(tab_name)?;
        Ok(Self {
            fh,
            conds,
            cols: tab.cols.clone(),
            len: tab.record_size(),
            rid: Rid::INVALID,
            scan: None,
            ctx,
        })
    }

    /// Walk the cursor forward until it rests on a record satisfying the
    /// conjunction, or the scan ends.
    fn seek_match(&mut self) -> QueryResult<()> {
        let scan = match self.scan.as_mut() {
            Some(scan) => scan,
            None => return Err(QueryError::Internal("scan not initialized".to_string())),
        };
        while !scan.is_end() {
            let rid = scan.rid();
            let rec = self.fh.get_record(rid, self.ctx)?;
            if eval_conds(&self.cols, &self.conds, &rec)? {
                self.rid = rid;
                return Ok(());
            }
            scan.next()?;
        }
        Ok(())
    }
}

impl Executor for SeqScan<'_> {
    fn begin(&mut self) -> QueryResult<()> {
        self.scan = Some(self.fh.scan()?);
        self.seek_match()
    }

    fn advance(&mut self) -> QueryResult<()> {
        match self.scan.as_mut() {
            Some(scan) => scan.next()?,
            None => return Err(QueryError::Internal("scan not initialized".to_string())),
        }
        self.seek_match()
    }

    fn is_end(&self) -> bool {
        self.scan.as_ref().map_or(true, |s| s.is_end())
    }

    fn next_record(&mut self) -> QueryResult<Option<Record>> {
        if self.is_end() {
            return Ok(None);
        }
        Ok(Some(self.fh.get_record(self.rid, self.ctx)?))
    }

    fn columns(&self) -> &[ColMeta] {
        &self.cols
    }

    fn tuple_len(&self) -> usize {
        self.len
    }

    fn rid(&self) -> Rid {
        self.rid
    }
}
