use std::sync::Arc;

use crate::common::{DbError, Result};
use crate::tuple::{FieldType, Tuple, TupleDesc};

use super::{AggregateOp, Aggregator, DbIterator, IntAggregator, StringAggregator};

/// Computes one aggregate over one column, optionally grouped by another.
/// Opening the operator drains the child into the aggregation engine;
/// iteration then walks the materialized result rows. Rewinding resets the
/// result cursor without re-draining the child.
pub struct Aggregate {
    child: Box<dyn DbIterator>,
    afield: usize,
    group_by: Option<usize>,
    op: AggregateOp,
    desc: Arc<TupleDesc>,
    results: Vec<Tuple>,
    cursor: Option<usize>,
}

impl Aggregate {
    /// Fails with `InvalidAggregate` when the aggregated column is a string
    /// and the operator is anything but COUNT.
    pub fn new(
        child: Box<dyn DbIterator>,
        afield: usize,
        group_by: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self> {
        let child_desc = child.tuple_desc();
        let atype = child_desc.field_type(afield)?;
        if atype == FieldType::Text && op != AggregateOp::Count {
            return Err(DbError::InvalidAggregate(op.to_string()));
        }

        let agg_name = format!("{}({})", op, child_desc.field_name(afield).unwrap_or(""));
        let desc = match group_by {
            None => TupleDesc::new(vec![FieldType::Int], vec![Some(agg_name)]),
            Some(gfield) => {
                let gtype = child_desc.field_type(gfield)?;
                let gname = child_desc.field_name(gfield).map(|s| s.to_string());
                TupleDesc::new(vec![gtype, FieldType::Int], vec![gname, Some(agg_name)])
            }
        }
        .into_arc();

        Ok(Self {
            child,
            afield,
            group_by,
            op,
            desc,
            results: Vec::new(),
            cursor: None,
        })
    }

    fn build_aggregator(&self) -> Result<Box<dyn Aggregator>> {
        let child_desc = self.child.tuple_desc();
        let group_by = match self.group_by {
            Some(gfield) => Some((gfield, child_desc.field_type(gfield)?)),
            None => None,
        };

        Ok(match child_desc.field_type(self.afield)? {
            FieldType::Int => Box::new(IntAggregator::new(group_by, self.afield, self.op)),
            FieldType::Text => Box::new(StringAggregator::new(group_by, self.afield, self.op)?),
        })
    }
}

impl DbIterator for Aggregate {
    fn open(&mut self) -> Result<()> {
        let mut aggregator = self.build_aggregator()?;

        self.child.open()?;
        while let Some(t) = self.child.read_next()? {
            aggregator.merge(&t)?;
        }
        self.child.close();

        self.results = aggregator.results();
        self.cursor = Some(0);
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Tuple>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        match self.results.get(*cursor) {
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
        self.results.clear();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }
}
