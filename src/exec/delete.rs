use std::sync::Arc;

use crate::common::{Result, TransactionId};
use crate::database::Database;
use crate::tuple::{Field, FieldType, Tuple, TupleDesc};

use super::DbIterator;

/// Single-shot delete: the first `read_next` drains the child and removes
/// each tuple from the table it belongs to, yielding a one-field count
/// tuple. The child's tuples must carry record ids, i.e. come from a scan.
pub struct Delete {
    tid: TransactionId,
    child: Box<dyn DbIterator>,
    db: Arc<Database>,
    desc: Arc<TupleDesc>,
    done: bool,
}

impl Delete {
    pub fn new(db: Arc<Database>, tid: TransactionId, child: Box<dyn DbIterator>) -> Self {
        Self {
            tid,
            child,
            db,
            desc: TupleDesc::unnamed(vec![FieldType::Int]).into_arc(),
            done: false,
        }
    }
}

impl DbIterator for Delete {
    fn open(&mut self) -> Result<()> {
        self.done = false;
        self.child.open()
    }

    fn read_next(&mut self) -> Result<Option<Tuple>> {
        if self.done {
            return Ok(None);
        }

        let mut count = 0;
        while let Some(t) = self.child.read_next()? {
            self.db.buffer_pool().delete_tuple(self.tid, &t)?;
            count += 1;
        }

        self.done = true;
        Ok(Some(Tuple::with_fields(
            self.desc.clone(),
            vec![Field::Int(count)],
        )))
    }

    fn rewind(&mut self) -> Result<()> {
        self.done = false;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.done = true;
        self.child.close()
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }
}
