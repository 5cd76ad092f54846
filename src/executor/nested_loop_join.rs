use crate::executor::predicate::eval_conds;
use crate::executor::Executor;
use crate::errors::query_error::{QueryError, QueryResult};
use crate::types::catalog_types::ColMeta;
use crate::types::filter_types::Condition;
use crate::types::record_types::Record;

/// Nested-loop join: for every outer tuple, sweep the inner child, keeping
/// the pairs whose concatenation satisfies the conjunction. The inner child
/// must be restartable via `begin`.
pub struct NestedLoopJoin<'a> {
    left: Box<dyn Executor + 'a>,
    right: Box<dyn Executor + 'a>,
    cols: Vec<ColMeta>,
    len: usize,
    conds: Vec<Condition>,
    ended: bool,
}

impl<'a> NestedLoopJoin<'a> {
    pub fn new(
        left: Box<dyn Executor + 'a>,
        right: Box<dyn Executor + 'a>,
        conds: Vec<Condition>,
    ) -> Self {
        let len = left.tuple_len() + right.tuple_len();
        // Output schema: left columns, then right columns shifted past them.
        let mut cols = left.columns().to_vec();
        for col in right.columns() {
            let mut col = col.clone();
            col.offset += left.tuple_len();
            cols.push(col);
        }
        Self {
            left,
            right,
            cols,
            len,
            conds,
            ended: false,
        }
    }

    fn concat(&self, l: &Record, r: &Record) -> Record {
        let mut data = Vec::with_capacity(self.len);
        data.extend_from_slice(&l.data);
        data.extend_from_slice(&r.data);
        Record { data }
    }

    /// Step until the children rest on a qualifying pair, or the outer side
    /// exhausts.
    fn seek_match(&mut self) -> QueryResult<()> {
        while !self.ended {
            if self.right.is_end() {
                // Inner exhausted: step the outer, rewind the inner.
                self.left.advance()?;
                if self.left.is_end() {
                    self.ended = true;
                    return Ok(());
                }
                self.right.begin()?;
                continue;
            }
            let lrec = self.left.next_record()?;
            let rrec = self.right.next_record()?;
            if let (Some(l), Some(r)) = (lrec, rrec) {
                let joined = self.concat(&l, &r);
                if eval_conds(&self.cols, &self.conds, &joined)? {
                    return Ok(());
                }
            }
            self.right.advance()?;
        }
        Ok(())
    }
}

impl Executor for NestedLoopJoin<'_> {
    fn begin(&mut self) -> QueryResult<()> {
        self.left.begin()?;
        if self.left.is_end() {
            self.ended = true;
            return Ok(());
        }
        self.right.begin()?;
        self.ended = false;
        self.seek_match()
    }

    fn advance(&mut self) -> QueryResult<()> {
        if self.ended {
            return Ok(());
        }
        self.right.advance()?;
        self.seek_match()
    }

    fn is_end(&self) -> bool {
        self.ended
    }

    fn next_record(&mut self) -> QueryResult<Option<Record>> {
        if self.ended {
            return Ok(None);
        }
        let lrec = self.left.next_record()?;
        let rrec = self.right.next_record()?;
        match (lrec, rrec) {
            (Some(l), Some(r)) => Ok(Some(self.concat(&l, &r))),
            _ => Err(QueryError::Internal(
                "join children out of position".to_string(),
            )),
        }
    }

    fn columns(&self) -> &[ColMeta] {
        &self.cols
    }

    fn tuple_len(&self) -> usize {
        self.len
    }
}
