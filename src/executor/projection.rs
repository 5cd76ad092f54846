use crate::executor::predicate::find_col_idx;
use crate::executor::Executor;
use crate::errors::query_error::QueryResult;
use crate::types::catalog_types::ColMeta;
use crate::types::filter_types::ColumnRef;
use crate::types::record_types::{Record, Rid};

/// Projection: gather-copy of the selected child columns, in the requested
/// order, with tightly packed output offsets.
pub struct Projection<'a> {
    child: Box<dyn Executor + 'a>,
    cols: Vec<ColMeta>,
    len: usize,
    sel_idxs: Vec<usize>,
}

impl<'a> Projection<'a> {
    pub fn new(child: Box<dyn Executor + 'a>, sel_cols: &[ColumnRef]) -> QueryResult<Self> {
        let mut cols = Vec::with_capacity(sel_cols.len());
        let mut sel_idxs = Vec::with_capacity(sel_cols.len());
        let mut offset = 0usize;
        for sel in sel_cols {
            let idx = find_col_idx(child.columns(), sel)?;
            let mut col = child.columns()[idx].clone();
            col.offset = offset;
            offset += col.len;
            sel_idxs.push(idx);
            cols.push(col);
        }
        Ok(Self {
            child,
            cols,
            len: offset,
            sel_idxs,
        })
    }
}

impl Executor for Projection<'_> {
    fn begin(&mut self) -> QueryResult<()> {
        self.child.begin()
    }

    fn advance(&mut self) -> QueryResult<()> {
        self.child.advance()
    }

    fn is_end(&self) -> bool {
        self.child.is_end()
    }

    fn next_record(&mut self) -> QueryResult<Option<Record>> {
        let src = match self.child.next_record()? {
            Some(rec) => rec,
            None => return Ok(None),
        };
        let mut out = Record::new(self.len);
        let child_cols = self.child.columns();
        for (out_col, &idx) in self.cols.iter().zip(&self.sel_idxs) {
            let src_col = &child_cols[idx];
            out.data[out_col.offset..out_col.offset + out_col.len]
                .copy_from_slice(&src.data[src_col.offset..src_col.offset + src_col.len]);
        }
        Ok(Some(out))
    }

    fn columns(&self) -> &[ColMeta] {
        &self.cols
    }

    fn tuple_len(&self) -> usize {
        self.len
    }

    fn rid(&self) -> Rid {
        self.child.rid()
    }
}
