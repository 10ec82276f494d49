use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{Tuple, TupleDesc};

/// The pull contract every operator implements: `open`, a stream of
/// `read_next` calls yielding `Ok(None)` at exhaustion, `rewind` back to a
/// fresh post-open state, and `close`.
pub trait DbIterator {
    fn open(&mut self) -> Result<()>;

    /// Returns the next tuple, or None when the stream is exhausted.
    fn read_next(&mut self) -> Result<Option<Tuple>>;

    fn rewind(&mut self) -> Result<()>;

    fn close(&mut self);

    /// The schema of the tuples this operator yields.
    fn tuple_desc(&self) -> Arc<TupleDesc>;
}

impl DbIterator for Box<dyn DbIterator> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn read_next(&mut self) -> Result<Option<Tuple>> {
        (**self).read_next()
    }

    fn rewind(&mut self) -> Result<()> {
        (**self).rewind()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        (**self).tuple_desc()
    }
}

/// Look-ahead adapter over a `DbIterator`: memoizes one buffered tuple so
/// callers get `has_next`/`next` semantics, with `next` past the end
/// surfacing `NoSuchElement`.
pub struct Peek<I> {
    inner: I,
    buffered: Option<Tuple>,
}

impl<I: DbIterator> Peek<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            buffered: None,
        }
    }

    pub fn open(&mut self) -> Result<()> {
        self.buffered = None;
        self.inner.open()
    }

    pub fn has_next(&mut self) -> Result<bool> {
        if self.buffered.is_none() {
            self.buffered = self.inner.read_next()?;
        }
        Ok(self.buffered.is_some())
    }

    pub fn next(&mut self) -> Result<Tuple> {
        self.has_next()?;
        self.buffered.take().ok_or(DbError::NoSuchElement)
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.buffered = None;
        self.inner.rewind()
    }

    pub fn close(&mut self) {
        self.buffered = None;
        self.inner.close()
    }

    pub fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.inner.tuple_desc()
    }

    /// Unwraps the adapter, discarding any buffered look-ahead.
    pub fn into_inner(self) -> I {
        self.inner
    }
}

/// An operator backed by an in-memory list of tuples. Used as a leaf for
/// query trees built from materialized rows, and by tests.
pub struct TupleIterator {
    desc: Arc<TupleDesc>,
    tuples: Vec<Tuple>,
    cursor: Option<usize>,
}

impl TupleIterator {
    pub fn new(desc: Arc<TupleDesc>, tuples: Vec<Tuple>) -> Self {
        Self {
            desc,
            tuples,
            cursor: None,
        }
    }
}

impl DbIterator for TupleIterator {
    fn open(&mut self) -> Result<()> {
        self.cursor = Some(0);
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Tuple>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        match self.tuples.get(*cursor) {
            Some(t) => {
                *cursor += 1;
                Ok(Some(t.clone()))
            }
            None => Ok(None),
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.cursor = Some(0);
        Ok(())
    }

    fn close(&mut self) {
        self.cursor = None;
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }
}
