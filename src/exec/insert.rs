use std::sync::Arc;

use crate::common::{DbError, Result, TransactionId};
use crate::database::Database;
use crate::tuple::{Field, FieldType, Tuple, TupleDesc};

use super::DbIterator;

/// Single-shot insert: the first `read_next` drains the child, inserts
/// every tuple into the target table through the buffer pool, and yields a
/// one-field tuple holding the insert count. Further calls yield nothing
/// until a rewind.
pub struct Insert {
    tid: TransactionId,
    child: Box<dyn DbIterator>,
    table_id: u32,
    db: Arc<Database>,
    desc: Arc<TupleDesc>,
    done: bool,
}

impl Insert {
    /// Fails with `SchemaMismatch` when the child's schema differs from the
    /// target table's.
    pub fn new(
        db: Arc<Database>,
        tid: TransactionId,
        child: Box<dyn DbIterator>,
        table_id: u32,
    ) -> Result<Self> {
        if *child.tuple_desc() != *db.catalog().tuple_desc(table_id)? {
            return Err(DbError::SchemaMismatch);
        }
        Ok(Self {
            tid,
            child,
            table_id,
            db,
            desc: TupleDesc::unnamed(vec![FieldType::Int]).into_arc(),
            done: false,
        })
    }
}

impl DbIterator for Insert {
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
            self.db
                .buffer_pool()
                .insert_tuple(self.tid, self.table_id, t)?;
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
