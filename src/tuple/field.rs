use std::fmt;
use std::io::{Read, Write};

use crate::common::{Result, STRING_LEN};

/// The two field types the engine stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 32-bit signed integer, 4 bytes big-endian
    Int,
    /// Fixed-width string: 4-byte big-endian length prefix plus STRING_LEN
    /// payload bytes, zero-padded
    Text,
}

impl FieldType {
    /// Returns the number of bytes a field of this type occupies in a slot.
    pub fn byte_len(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Text => 4 + STRING_LEN,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => write!(f, "INT"),
            FieldType::Text => write!(f, "STRING"),
        }
    }
}

/// Comparison operators usable in predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    GreaterThan,
    LessThan,
    LessThanOrEq,
    GreaterThanOrEq,
    Like,
    NotEquals,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Equals => "=",
            CompareOp::GreaterThan => ">",
            CompareOp::LessThan => "<",
            CompareOp::LessThanOrEq => "<=",
            CompareOp::GreaterThanOrEq => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::NotEquals => "<>",
        };
        write!(f, "{}", s)
    }
}

/// A typed field value. Text payloads are truncated to STRING_LEN bytes at
/// construction so every value fits its fixed-width slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Int(i32),
    Text(String),
}

impl Field {
    /// Creates a text field, truncating the payload to STRING_LEN bytes
    /// (backing off to a character boundary).
    pub fn text(s: impl Into<String>) -> Self {
        let mut s = s.into();
        if s.len() > STRING_LEN {
            let mut end = STRING_LEN;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            s.truncate(end);
        }
        Field::Text(s)
    }

    /// Returns the type of this field.
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Text(_) => FieldType::Text,
        }
    }

    /// Compares this field against `other` under `op`.
    ///
    /// Fields of different kinds never compare equal; ordering operators
    /// across kinds are false. LIKE is substring match on strings and plain
    /// equality on integers.
    pub fn compare(&self, op: CompareOp, other: &Field) -> bool {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => match op {
                CompareOp::Equals | CompareOp::Like => a == b,
                CompareOp::NotEquals => a != b,
                CompareOp::GreaterThan => a > b,
                CompareOp::GreaterThanOrEq => a >= b,
                CompareOp::LessThan => a < b,
                CompareOp::LessThanOrEq => a <= b,
            },
            (Field::Text(a), Field::Text(b)) => match op {
                CompareOp::Equals => a == b,
                CompareOp::NotEquals => a != b,
                CompareOp::GreaterThan => a > b,
                CompareOp::GreaterThanOrEq => a >= b,
                CompareOp::LessThan => a < b,
                CompareOp::LessThanOrEq => a <= b,
                CompareOp::Like => a.contains(b.as_str()),
            },
            _ => matches!(op, CompareOp::NotEquals),
        }
    }

    /// Writes the field's on-disk representation.
    pub fn write_to(&self, out: &mut impl Write) -> Result<()> {
        match self {
            Field::Int(v) => out.write_all(&v.to_be_bytes())?,
            Field::Text(s) => {
                let payload = s.as_bytes();
                out.write_all(&(payload.len() as u32).to_be_bytes())?;
                out.write_all(payload)?;
                let padding = STRING_LEN - payload.len();
                out.write_all(&vec![0u8; padding])?;
            }
        }
        Ok(())
    }

    /// Reads a field of the given type from its on-disk representation.
    pub fn read_from(ty: FieldType, input: &mut impl Read) -> Result<Field> {
        match ty {
            FieldType::Int => {
                let mut buf = [0u8; 4];
                input.read_exact(&mut buf)?;
                Ok(Field::Int(i32::from_be_bytes(buf)))
            }
            FieldType::Text => {
                let mut len_buf = [0u8; 4];
                input.read_exact(&mut len_buf)?;
                let len = (u32::from_be_bytes(len_buf) as usize).min(STRING_LEN);
                let mut payload = vec![0u8; STRING_LEN];
                input.read_exact(&mut payload)?;
                payload.truncate(len);
                Ok(Field::Text(
                    String::from_utf8_lossy(&payload).into_owned(),
                ))
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::Int(v)
    }
}

impl From<&str> for Field {
    fn from(v: &str) -> Self {
        Field::text(v)
    }
}

impl From<String> for Field {
    fn from(v: String) -> Self {
        Field::text(v)
    }
}
