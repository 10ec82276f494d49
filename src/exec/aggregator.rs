use std::collections::HashMap;
use std::fmt;

use crate::common::{DbError, Result};
use crate::tuple::{Field, FieldType, Tuple, TupleDesc};

/// The aggregation operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        };
        write!(f, "{}", s)
    }
}

/// The grouping and accumulation engine behind the Aggregate operator:
/// tuples are merged in one at a time, results read out as rows of
/// `(group, value)` pairs, or a single `(value)` without grouping.
pub trait Aggregator {
    fn merge(&mut self, t: &Tuple) -> Result<()>;

    /// The accumulated result rows. Order is unspecified but stable for a
    /// given materialization.
    fn results(&self) -> Vec<Tuple>;
}

/// Per-group running state: an accumulator plus the sample count AVG needs.
#[derive(Clone, Copy)]
struct Acc {
    value: i32,
    samples: i32,
}

impl Acc {
    fn initial(op: AggregateOp) -> Self {
        let value = match op {
            AggregateOp::Min => i32::MAX,
            AggregateOp::Max => i32::MIN,
            _ => 0,
        };
        Self { value, samples: 0 }
    }

    fn merge(&mut self, op: AggregateOp, v: i32) {
        match op {
            AggregateOp::Min => self.value = self.value.min(v),
            AggregateOp::Max => self.value = self.value.max(v),
            AggregateOp::Sum => self.value += v,
            AggregateOp::Count => self.value += 1,
            AggregateOp::Avg => {
                self.value += v;
                self.samples += 1;
            }
        }
    }

    fn output(&self, op: AggregateOp) -> i32 {
        match op {
            AggregateOp::Avg if self.samples > 0 => self.value / self.samples,
            AggregateOp::Avg => 0,
            _ => self.value,
        }
    }
}

enum GroupState {
    /// No grouping: one accumulator, and one result row even with no input
    Single(Acc),
    Grouped(HashMap<Field, Acc>),
}

/// Aggregates integer fields; supports MIN, MAX, SUM, AVG, and COUNT.
pub struct IntAggregator {
    group_type: Option<FieldType>,
    group_field: usize,
    afield: usize,
    op: AggregateOp,
    state: GroupState,
}

impl IntAggregator {
    /// `group_by` is the index and type of the grouping field, or None for
    /// a single ungrouped aggregate.
    pub fn new(group_by: Option<(usize, FieldType)>, afield: usize, op: AggregateOp) -> Self {
        let (group_field, group_type, state) = match group_by {
            Some((idx, ty)) => (idx, Some(ty), GroupState::Grouped(HashMap::new())),
            None => (0, None, GroupState::Single(Acc::initial(op))),
        };
        Self {
            group_type,
            group_field,
            afield,
            op,
            state,
        }
    }
}

impl Aggregator for IntAggregator {
    fn merge(&mut self, t: &Tuple) -> Result<()> {
        let value = match t.field(self.afield) {
            Some(Field::Int(v)) => *v,
            _ => return Err(DbError::SchemaMismatch),
        };

        match &mut self.state {
            GroupState::Single(acc) => acc.merge(self.op, value),
            GroupState::Grouped(groups) => {
                let key = t.field(self.group_field).ok_or(DbError::SchemaMismatch)?;
                groups
                    .entry(key.clone())
                    .or_insert_with(|| Acc::initial(self.op))
                    .merge(self.op, value);
            }
        }
        Ok(())
    }

    fn results(&self) -> Vec<Tuple> {
        match &self.state {
            GroupState::Single(acc) => {
                let desc = TupleDesc::unnamed(vec![FieldType::Int]).into_arc();
                vec![Tuple::with_fields(
                    desc,
                    vec![Field::Int(acc.output(self.op))],
                )]
            }
            GroupState::Grouped(groups) => {
                let group_type = self.group_type.unwrap_or(FieldType::Int);
                let desc = TupleDesc::unnamed(vec![group_type, FieldType::Int]).into_arc();
                groups
                    .iter()
                    .map(|(key, acc)| {
                        Tuple::with_fields(
                            desc.clone(),
                            vec![key.clone(), Field::Int(acc.output(self.op))],
                        )
                    })
                    .collect()
            }
        }
    }
}

/// Aggregates string fields; COUNT is the only supported operator.
pub struct StringAggregator {
    group_type: Option<FieldType>,
    group_field: usize,
    state: GroupState,
}

impl StringAggregator {
    /// Fails with `InvalidAggregate` for any operator other than COUNT.
    pub fn new(
        group_by: Option<(usize, FieldType)>,
        _afield: usize,
        op: AggregateOp,
    ) -> Result<Self> {
        if op != AggregateOp::Count {
            return Err(DbError::InvalidAggregate(op.to_string()));
        }
        let (group_field, group_type, state) = match group_by {
            Some((idx, ty)) => (idx, Some(ty), GroupState::Grouped(HashMap::new())),
            None => (
                0,
                None,
                GroupState::Single(Acc::initial(AggregateOp::Count)),
            ),
        };
        Ok(Self {
            group_type,
            group_field,
            state,
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge(&mut self, t: &Tuple) -> Result<()> {
        match &mut self.state {
            GroupState::Single(acc) => acc.merge(AggregateOp::Count, 0),
            GroupState::Grouped(groups) => {
                let key = t.field(self.group_field).ok_or(DbError::SchemaMismatch)?;
                groups
                    .entry(key.clone())
                    .or_insert_with(|| Acc::initial(AggregateOp::Count))
                    .merge(AggregateOp::Count, 0);
            }
        }
        Ok(())
    }

    fn results(&self) -> Vec<Tuple> {
        match &self.state {
            GroupState::Single(acc) => {
                let desc = TupleDesc::unnamed(vec![FieldType::Int]).into_arc();
                vec![Tuple::with_fields(
                    desc,
                    vec![Field::Int(acc.output(AggregateOp::Count))],
                )]
            }
            GroupState::Grouped(groups) => {
                let group_type = self.group_type.unwrap_or(FieldType::Text);
                let desc = TupleDesc::unnamed(vec![group_type, FieldType::Int]).into_arc();
                groups
                    .iter()
                    .map(|(key, acc)| {
                        Tuple::with_fields(
                            desc.clone(),
                            vec![key.clone(), Field::Int(acc.output(AggregateOp::Count))],
                        )
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge_grouped(op: AggregateOp, rows: &[(i32, i32)]) -> HashMap<i32, i32> {
        let desc = TupleDesc::named(vec![("g", FieldType::Int), ("a", FieldType::Int)]).into_arc();
        let mut agg = IntAggregator::new(Some((0, FieldType::Int)), 1, op);
        for &(g, a) in rows {
            let t = Tuple::with_fields(desc.clone(), vec![Field::Int(g), Field::Int(a)]);
            agg.merge(&t).unwrap();
        }

        agg.results()
            .into_iter()
            .map(|t| match (t.field(0), t.field(1)) {
                (Some(Field::Int(g)), Some(Field::Int(v))) => (*g, *v),
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_grouped_sum() {
        let out = merge_grouped(AggregateOp::Sum, &[(1, 10), (1, 5), (2, 7)]);
        assert_eq!(out, HashMap::from([(1, 15), (2, 7)]));
    }

    #[test]
    fn test_grouped_min_max() {
        let rows = [(1, 4), (1, -2), (2, 9)];
        assert_eq!(
            merge_grouped(AggregateOp::Min, &rows),
            HashMap::from([(1, -2), (2, 9)])
        );
        assert_eq!(
            merge_grouped(AggregateOp::Max, &rows),
            HashMap::from([(1, 4), (2, 9)])
        );
    }

    #[test]
    fn test_grouped_avg_uses_integer_division() {
        let out = merge_grouped(AggregateOp::Avg, &[(1, 5), (1, 2), (2, 9)]);
        assert_eq!(out, HashMap::from([(1, 3), (2, 9)]));
    }

    #[test]
    fn test_grouped_count() {
        let out = merge_grouped(AggregateOp::Count, &[(1, 10), (1, 20), (2, 30)]);
        assert_eq!(out, HashMap::from([(1, 2), (2, 1)]));
    }

    #[test]
    fn test_ungrouped_always_yields_one_row() {
        let agg = IntAggregator::new(None, 0, AggregateOp::Count);
        let rows = agg.results();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field(0), Some(&Field::Int(0)));
    }

    #[test]
    fn test_ungrouped_sum() {
        let desc = TupleDesc::named(vec![("a", FieldType::Int)]).into_arc();
        let mut agg = IntAggregator::new(None, 0, AggregateOp::Sum);
        for v in [1, 2, 3] {
            agg.merge(&Tuple::with_fields(desc.clone(), vec![Field::Int(v)]))
                .unwrap();
        }
        assert_eq!(agg.results()[0].field(0), Some(&Field::Int(6)));
    }

    #[test]
    fn test_merge_non_int_field_rejected() {
        let desc = TupleDesc::named(vec![("a", FieldType::Text)]).into_arc();
        let mut agg = IntAggregator::new(None, 0, AggregateOp::Sum);
        let t = Tuple::with_fields(desc, vec![Field::text("x")]);
        assert!(matches!(agg.merge(&t), Err(DbError::SchemaMismatch)));
    }

    #[test]
    fn test_string_aggregator_counts_by_group() {
        let desc =
            TupleDesc::named(vec![("g", FieldType::Text), ("s", FieldType::Text)]).into_arc();
        let mut agg =
            StringAggregator::new(Some((0, FieldType::Text)), 1, AggregateOp::Count).unwrap();
        for (g, s) in [("x", "a"), ("x", "b"), ("y", "c")] {
            let t = Tuple::with_fields(desc.clone(), vec![Field::text(g), Field::text(s)]);
            agg.merge(&t).unwrap();
        }

        let counts: HashMap<String, i32> = agg
            .results()
            .into_iter()
            .map(|t| match (t.field(0), t.field(1)) {
                (Some(Field::Text(g)), Some(Field::Int(v))) => (g.clone(), *v),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(counts, HashMap::from([("x".into(), 2), ("y".into(), 1)]));
    }

    #[test]
    fn test_string_aggregator_rejects_non_count() {
        for op in [
            AggregateOp::Min,
            AggregateOp::Max,
            AggregateOp::Sum,
            AggregateOp::Avg,
        ] {
            assert!(matches!(
                StringAggregator::new(None, 0, op),
                Err(DbError::InvalidAggregate(_))
            ));
        }
    }
}
