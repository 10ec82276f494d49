mod aggregate;
mod aggregator;
mod delete;
mod filter;
mod insert;
mod iterator;
mod join;
mod predicate;
mod seq_scan;

pub use aggregate::Aggregate;
pub use aggregator::{AggregateOp, Aggregator, IntAggregator, StringAggregator};
pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use iterator::{DbIterator, Peek, TupleIterator};
pub use join::Join;
pub use predicate::{JoinPredicate, Predicate};
pub use seq_scan::SeqScan;
