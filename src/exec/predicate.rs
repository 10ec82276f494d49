use std::fmt;

use crate::tuple::{CompareOp, Field, Tuple};

/// Compares one field of a tuple against a constant operand.
#[derive(Debug, Clone)]
pub struct Predicate {
    field: usize,
    op: CompareOp,
    operand: Field,
}

impl Predicate {
    /// Creates a predicate testing `tuple[field] op operand`.
    pub fn new(field: usize, op: CompareOp, operand: Field) -> Self {
        Self { field, op, operand }
    }

    /// Evaluates the predicate against a tuple. An unset field never
    /// matches.
    pub fn eval(&self, t: &Tuple) -> bool {
        t.field(self.field)
            .map_or(false, |f| f.compare(self.op, &self.operand))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{} {} {}", self.field, self.op, self.operand)
    }
}

/// Compares a field of one tuple against a field of another; used by joins.
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    field1: usize,
    op: CompareOp,
    field2: usize,
}

impl JoinPredicate {
    /// Creates a predicate testing `left[field1] op right[field2]`.
    pub fn new(field1: usize, op: CompareOp, field2: usize) -> Self {
        Self { field1, op, field2 }
    }

    /// Evaluates the predicate over a pair of tuples.
    pub fn eval(&self, left: &Tuple, right: &Tuple) -> bool {
        match (left.field(self.field1), right.field(self.field2)) {
            (Some(a), Some(b)) => a.compare(self.op, b),
            _ => false,
        }
    }
}
