use std::fmt;
use std::sync::Arc;

use crate::common::RecordId;

use super::{Field, TupleDesc};

/// A single row: a schema, one value slot per field, and the physical
/// address of the row if it has been persisted.
///
/// Field slots start out unset; a tuple that has never been stored has no
/// `RecordId`.
#[derive(Debug, Clone)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Option<Field>>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Creates a tuple with all field slots unset.
    pub fn new(desc: Arc<TupleDesc>) -> Self {
        let fields = vec![None; desc.num_fields()];
        Self {
            desc,
            fields,
            record_id: None,
        }
    }

    /// Creates a tuple with every slot filled, in schema order.
    ///
    /// # Panics
    /// Panics if the value count does not match the schema.
    pub fn with_fields(desc: Arc<TupleDesc>, values: Vec<Field>) -> Self {
        assert_eq!(
            values.len(),
            desc.num_fields(),
            "Value count must match schema field count"
        );
        Self {
            desc,
            fields: values.into_iter().map(Some).collect(),
            record_id: None,
        }
    }

    /// Returns the schema of this tuple.
    pub fn desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    /// Returns the value of the `i`th field, or None if unset.
    pub fn field(&self, i: usize) -> Option<&Field> {
        self.fields.get(i).and_then(|f| f.as_ref())
    }

    /// Sets the value of the `i`th field.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    pub fn set_field(&mut self, i: usize, value: Field) {
        self.fields[i] = Some(value);
    }

    /// Returns all field slots in schema order.
    pub fn fields(&self) -> &[Option<Field>] {
        &self.fields
    }

    /// Returns the physical address of this tuple, if persisted.
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    /// Stamps the physical address of this tuple.
    pub fn set_record_id(&mut self, rid: RecordId) {
        self.record_id = Some(rid);
    }
}

/// Tuples compare by schema and field values; the record id is identity, not
/// content.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.desc == other.desc && self.fields == other.fields
    }
}

impl Eq for Tuple {}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            match field {
                Some(v) => write!(f, "{}", v)?,
                None => write!(f, "null")?,
            }
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PageId;
    use crate::tuple::FieldType;

    fn two_int_desc() -> Arc<TupleDesc> {
        TupleDesc::named(vec![("a", FieldType::Int), ("b", FieldType::Int)]).into_arc()
    }

    #[test]
    fn test_unset_fields() {
        let t = Tuple::new(two_int_desc());
        assert_eq!(t.field(0), None);
        assert_eq!(t.field(1), None);
        assert_eq!(t.record_id(), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut t = Tuple::new(two_int_desc());
        t.set_field(0, Field::Int(1));
        t.set_field(1, Field::Int(2));
        assert_eq!(t.field(0), Some(&Field::Int(1)));
        assert_eq!(t.field(1), Some(&Field::Int(2)));
    }

    #[test]
    fn test_equality_ignores_record_id() {
        let desc = two_int_desc();
        let a = Tuple::with_fields(desc.clone(), vec![Field::Int(1), Field::Int(2)]);
        let mut b = Tuple::with_fields(desc, vec![Field::Int(1), Field::Int(2)]);
        b.set_record_id(RecordId::new(PageId::new(1, 0), 5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let desc = two_int_desc();
        let t = Tuple::with_fields(desc, vec![Field::Int(3), Field::Int(7)]);
        assert_eq!(t.to_string(), "3\t7\n");
    }
}
