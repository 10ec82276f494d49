use std::fmt;
use std::sync::Arc;

use crate::common::{DbError, Result};

use super::FieldType;

/// Describes the schema of a tuple: an ordered, non-empty sequence of field
/// types with optional names. Names are advisory; schema equality compares
/// the type sequence only.
#[derive(Debug, Clone)]
pub struct TupleDesc {
    types: Vec<FieldType>,
    names: Vec<Option<String>>,
}

impl TupleDesc {
    /// Creates a schema from types and matching names.
    ///
    /// # Panics
    /// Panics if `types` is empty or the lengths differ.
    pub fn new(types: Vec<FieldType>, names: Vec<Option<String>>) -> Self {
        assert!(!types.is_empty(), "A schema must have at least one field");
        assert_eq!(
            types.len(),
            names.len(),
            "Field name count must match field type count"
        );
        Self { types, names }
    }

    /// Creates a schema with anonymous fields.
    pub fn unnamed(types: Vec<FieldType>) -> Self {
        let names = vec![None; types.len()];
        Self::new(types, names)
    }

    /// Creates a schema from `(name, type)` pairs.
    pub fn named(fields: Vec<(&str, FieldType)>) -> Self {
        let (names, types) = fields
            .into_iter()
            .map(|(n, t)| (Some(n.to_string()), t))
            .unzip();
        Self::new(types, names)
    }

    /// Merges two schemas into one: all of `a`'s fields followed by all of
    /// `b`'s.
    pub fn combine(a: &TupleDesc, b: &TupleDesc) -> TupleDesc {
        let mut types = a.types.clone();
        types.extend(b.types.iter().copied());
        let mut names = a.names.clone();
        names.extend(b.names.iter().cloned());
        TupleDesc { types, names }
    }

    /// Returns the number of fields.
    pub fn num_fields(&self) -> usize {
        self.types.len()
    }

    /// Returns the type of the `i`th field.
    pub fn field_type(&self, i: usize) -> Result<FieldType> {
        self.types.get(i).copied().ok_or(DbError::NoSuchElement)
    }

    /// Returns the (possibly absent) name of the `i`th field.
    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.names.get(i).and_then(|n| n.as_deref())
    }

    /// Finds the index of the first field with the given name.
    pub fn field_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n.as_deref() == Some(name))
            .ok_or_else(|| DbError::NoSuchColumn(name.to_string()))
    }

    /// Returns an iterator over the field types.
    pub fn types(&self) -> impl Iterator<Item = FieldType> + '_ {
        self.types.iter().copied()
    }

    /// The size in bytes of a serialized tuple with this schema.
    pub fn byte_size(&self) -> usize {
        self.types.iter().map(|t| t.byte_len()).sum()
    }

    /// Convenience wrapper for shared ownership.
    pub fn into_arc(self) -> Arc<TupleDesc> {
        Arc::new(self)
    }
}

impl PartialEq for TupleDesc {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
    }
}

impl Eq for TupleDesc {}

impl fmt::Display for TupleDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ty) in self.types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match self.field_name(i) {
                Some(name) => write!(f, "{}({})", ty, name)?,
                None => write!(f, "{}", ty)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_accessors() {
        let desc = TupleDesc::named(vec![("id", FieldType::Int), ("name", FieldType::Text)]);

        assert_eq!(desc.num_fields(), 2);
        assert_eq!(desc.field_type(0).unwrap(), FieldType::Int);
        assert_eq!(desc.field_type(1).unwrap(), FieldType::Text);
        assert_eq!(desc.field_name(0), Some("id"));
        assert_eq!(desc.field_index("name").unwrap(), 1);
        assert!(desc.field_index("missing").is_err());
        assert!(desc.field_type(2).is_err());
    }

    #[test]
    fn test_unnamed_fields_never_match() {
        let desc = TupleDesc::unnamed(vec![FieldType::Int]);
        assert_eq!(desc.field_name(0), None);
        assert!(desc.field_index("anything").is_err());
    }

    #[test]
    fn test_byte_size() {
        let desc = TupleDesc::unnamed(vec![FieldType::Int, FieldType::Int]);
        assert_eq!(desc.byte_size(), 8);

        let desc = TupleDesc::unnamed(vec![FieldType::Int, FieldType::Text]);
        assert_eq!(desc.byte_size(), 4 + FieldType::Text.byte_len());
    }

    #[test]
    fn test_equality_ignores_names() {
        let a = TupleDesc::named(vec![("x", FieldType::Int)]);
        let b = TupleDesc::unnamed(vec![FieldType::Int]);
        assert_eq!(a, b);

        let c = TupleDesc::unnamed(vec![FieldType::Text]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_combine() {
        let a = TupleDesc::named(vec![("a", FieldType::Int)]);
        let b = TupleDesc::named(vec![("b", FieldType::Text), ("c", FieldType::Int)]);
        let merged = TupleDesc::combine(&a, &b);

        assert_eq!(merged.num_fields(), 3);
        assert_eq!(merged.field_name(0), Some("a"));
        assert_eq!(merged.field_name(1), Some("b"));
        assert_eq!(merged.field_type(2).unwrap(), FieldType::Int);
        assert_eq!(merged.byte_size(), a.byte_size() + b.byte_size());
    }

    #[test]
    #[should_panic]
    fn test_empty_schema_rejected() {
        TupleDesc::unnamed(vec![]);
    }
}
