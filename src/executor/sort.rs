use crate::executor::predicate::{compare_on_col, find_col};
use crate::executor::Executor;
use crate::errors::query_error::QueryResult;
use crate::types::catalog_types::ColMeta;
use crate::types::filter_types::ColumnRef;
use crate::types::record_types::Record;

/// Sort on a single key column: materialize the child's output, stable-sort
/// it, then serve records from the buffer.
pub struct Sort<'a> {
    child: Box<dyn Executor + 'a>,
    key: ColMeta,
    descending: bool,
    buf: Vec<Record>,
    cursor: usize,
}

impl<'a> Sort<'a> {
    pub fn new(
        child: Box<dyn Executor + 'a>,
        key_col: &ColumnRef,
        descending: bool,
    ) -> QueryResult<Self> {
        let key = find_col(child.columns(), key_col)?.clone();
        Ok(Self {
            child,
            key,
            descending,
            buf: Vec::new(),
            cursor: 0,
        })
    }
}

impl Executor for Sort<'_> {
    fn begin(&mut self) -> QueryResult<()> {
        self.buf.clear();
        self.child.begin()?;
        while !self.child.is_end() {
            if let Some(rec) = self.child.next_record()? {
                self.buf.push(rec);
            }
            self.child.advance()?;
        }
        let key = self.key.clone();
        let descending = self.descending;
        // sort_by is stable: equal keys keep their arrival order.
        self.buf.sort_by(|a, b| {
            let ord = compare_on_col(&key, a, b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        self.cursor = 0;
        Ok(())
    }

    fn advance(&mut self) -> QueryResult<()> {
        if self.cursor < self.buf.len() {
            self.cursor += 1;
        }
        Ok(())
    }

    fn is_end(&self) -> bool {
        self.cursor >= self.buf.len()
    }

    fn next_record(&mut self) -> QueryResult<Option<Record>> {
        Ok(self.buf.get(self.cursor).cloned())
    }

    fn columns(&self) -> &[ColMeta] {
        self.child.columns()
    }

    fn tuple_len(&self) -> usize {
        self.child.tuple_len()
    }
}
