mod field;
mod schema;
mod tuple;

pub use field::{CompareOp, Field, FieldType};
pub use schema::TupleDesc;
pub use tuple::Tuple;
