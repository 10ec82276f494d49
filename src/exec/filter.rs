use std::sync::Arc;

use crate::common::Result;
use crate::tuple::{Tuple, TupleDesc};

use super::{DbIterator, Predicate};

/// Relational select: yields the child's tuples that satisfy the predicate.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn DbIterator>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn DbIterator>) -> Self {
        Self { predicate, child }
    }
}

impl DbIterator for Filter {
    fn open(&mut self) -> Result<()> {
        self.child.open()
    }

    fn read_next(&mut self) -> Result<Option<Tuple>> {
        while let Some(t) = self.child.read_next()? {
            if self.predicate.eval(&t) {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }

    fn rewind(&mut self) -> Result<()> {
        self.child.rewind()
    }

    fn close(&mut self) {
        self.child.close()
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.child.tuple_desc()
    }
}
