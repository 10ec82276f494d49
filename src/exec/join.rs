use std::sync::Arc;

use crate::common::Result;
use crate::tuple::{Tuple, TupleDesc};

use super::{DbIterator, JoinPredicate};

/// Nested-loop join. The current outer tuple is held across full sweeps of
/// the inner child; when the inner is exhausted it is rewound and the outer
/// advances. Output tuples are the concatenation of the matching pair, so
/// an equality join carries both copies of the join attribute.
pub struct Join {
    predicate: JoinPredicate,
    outer: Box<dyn DbIterator>,
    inner: Box<dyn DbIterator>,
    current_outer: Option<Tuple>,
    desc: Arc<TupleDesc>,
}

impl Join {
    pub fn new(
        predicate: JoinPredicate,
        outer: Box<dyn DbIterator>,
        inner: Box<dyn DbIterator>,
    ) -> Self {
        let desc = TupleDesc::combine(&outer.tuple_desc(), &inner.tuple_desc()).into_arc();
        Self {
            predicate,
            outer,
            inner,
            current_outer: None,
            desc,
        }
    }

    fn concat(&self, left: &Tuple, right: &Tuple) -> Tuple {
        let n_left = left.desc().num_fields();
        let mut t = Tuple::new(self.desc.clone());
        for (i, field) in left.fields().iter().enumerate() {
            if let Some(f) = field {
                t.set_field(i, f.clone());
            }
        }
        for (i, field) in right.fields().iter().enumerate() {
            if let Some(f) = field {
                t.set_field(n_left + i, f.clone());
            }
        }
        t
    }
}

impl DbIterator for Join {
    fn open(&mut self) -> Result<()> {
        self.outer.open()?;
        self.inner.open()
    }

    fn read_next(&mut self) -> Result<Option<Tuple>> {
        loop {
            if self.current_outer.is_none() {
                self.current_outer = self.outer.read_next()?;
            }
            let Some(outer) = self.current_outer.clone() else {
                return Ok(None);
            };

            while let Some(inner) = self.inner.read_next()? {
                if self.predicate.eval(&outer, &inner) {
                    return Ok(Some(self.concat(&outer, &inner)));
                }
            }

            self.inner.rewind()?;
            self.current_outer = None;
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.outer.rewind()?;
        self.inner.rewind()?;
        self.current_outer = None;
        Ok(())
    }

    fn close(&mut self) {
        self.outer.close();
        self.inner.close();
        self.current_outer = None;
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::TupleIterator;
    use crate::tuple::{CompareOp, Field, FieldType};

    fn int_source(name: &str, values: &[i32]) -> Box<dyn DbIterator> {
        let desc = TupleDesc::named(vec![(name, FieldType::Int)]).into_arc();
        let rows = values
            .iter()
            .map(|&v| Tuple::with_fields(desc.clone(), vec![Field::Int(v)]))
            .collect();
        Box::new(TupleIterator::new(desc, rows))
    }

    fn drain(join: &mut Join) -> Vec<Vec<i32>> {
        let mut out = Vec::new();
        while let Some(t) = join.read_next().unwrap() {
            out.push(
                t.fields()
                    .iter()
                    .map(|f| match f.as_ref().unwrap() {
                        Field::Int(v) => *v,
                        _ => unreachable!(),
                    })
                    .collect(),
            );
        }
        out
    }

    #[test]
    fn test_equality_join() {
        let mut join = Join::new(
            JoinPredicate::new(0, CompareOp::Equals, 0),
            int_source("a", &[1, 2, 3]),
            int_source("b", &[2, 3, 4]),
        );

        assert_eq!(join.tuple_desc().num_fields(), 2);
        join.open().unwrap();
        assert_eq!(drain(&mut join), vec![vec![2, 2], vec![3, 3]]);
    }

    #[test]
    fn test_join_with_duplicate_matches() {
        let mut join = Join::new(
            JoinPredicate::new(0, CompareOp::Equals, 0),
            int_source("a", &[1, 1]),
            int_source("b", &[1, 1]),
        );

        join.open().unwrap();
        assert_eq!(drain(&mut join).len(), 4);
    }

    #[test]
    fn test_join_rewind() {
        let mut join = Join::new(
            JoinPredicate::new(0, CompareOp::LessThan, 0),
            int_source("a", &[1]),
            int_source("b", &[0, 2]),
        );

        join.open().unwrap();
        assert_eq!(drain(&mut join), vec![vec![1, 2]]);

        join.rewind().unwrap();
        assert_eq!(drain(&mut join), vec![vec![1, 2]]);
    }
}
