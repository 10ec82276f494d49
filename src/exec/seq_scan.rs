use std::sync::Arc;

use crate::common::{Result, TransactionId};
use crate::database::Database;
use crate::storage::HeapFileIterator;
use crate::tuple::{Tuple, TupleDesc};

use super::DbIterator;

/// Sequential scan over one table: reads every tuple in on-disk order under
/// transaction `tid` with read-only permission.
pub struct SeqScan {
    iter: HeapFileIterator,
    desc: Arc<TupleDesc>,
}

impl SeqScan {
    pub fn new(db: &Database, tid: TransactionId, table_id: u32) -> Result<Self> {
        let file = db.catalog().table(table_id)?;
        let desc = file.desc().clone();
        Ok(Self {
            iter: file.iter(tid, db.buffer_pool().clone()),
            desc,
        })
    }
}

impl DbIterator for SeqScan {
    fn open(&mut self) -> Result<()> {
        self.iter.open()
    }

    fn read_next(&mut self) -> Result<Option<Tuple>> {
        self.iter.read_next()
    }

    fn rewind(&mut self) -> Result<()> {
        self.iter.rewind()
    }

    fn close(&mut self) {
        self.iter.close()
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }
}
