//! Dynamically-typed values handed to field setters.

use std::any::Any;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A synthetic value produced by the populator for one field.
///
/// Setters receive a `Value` and convert it into the concrete Rust field type
/// with [`Value::take`] (or [`Value::take_sequence`] for lists). A conversion
/// that does not match the field's type yields `None` and the field is left
/// unset.
pub enum Value {
    Text(String),
    Integer(i32),
    Decimal(f64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    /// A member of a registered enumeration, boxed as its concrete enum type.
    Variant(Box<dyn Any>),
    Sequence(Vec<Value>),
    /// A built and populated instance, boxed in the representation of the
    /// field's declared type (the concrete type, or e.g. `Box<dyn Trait>`).
    Object(Box<dyn Any>),
}

impl Value {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::Variant(_) => "variant",
            Value::Sequence(_) => "sequence",
            Value::Object(_) => "object",
        }
    }

    /// Erase the value into a box of its natural Rust type.
    ///
    /// Text becomes `String`, integers `i32`, decimals `f64`, sequences
    /// `Vec<Value>`; variants and objects are returned as-is.
    pub fn into_any(self) -> Box<dyn Any> {
        match self {
            Value::Text(s) => Box::new(s),
            Value::Integer(i) => Box::new(i),
            Value::Decimal(d) => Box::new(d),
            Value::Uuid(u) => Box::new(u),
            Value::Timestamp(t) => Box::new(t),
            Value::Sequence(items) => Box::new(items),
            Value::Variant(any) | Value::Object(any) => any,
        }
    }

    /// Convert into `T`, or `None` if the value holds something else.
    pub fn take<T: Any>(self) -> Option<T> {
        self.into_any().downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Convert a sequence into `Vec<T>`; fails if any element does not match.
    pub fn take_sequence<T: Any>(self) -> Option<Vec<T>> {
        match self {
            Value::Sequence(items) => items.into_iter().map(Value::take::<T>).collect(),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Text(s) => write!(f, "Text({:?})", s),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Decimal(d) => write!(f, "Decimal({})", d),
            Value::Uuid(u) => write!(f, "Uuid({})", u),
            Value::Timestamp(t) => write!(f, "Timestamp({})", t.to_rfc3339()),
            Value::Variant(_) => f.write_str("Variant(..)"),
            Value::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Value::Object(_) => f.write_str("Object(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_matching_type() {
        assert_eq!(Value::Text("lorem".into()).take::<String>(), Some("lorem".into()));
        assert_eq!(Value::Integer(7).take::<i32>(), Some(7));
    }

    #[test]
    fn test_take_mismatched_type() {
        assert_eq!(Value::Integer(7).take::<i64>(), None);
        assert_eq!(Value::Text("x".into()).take::<i32>(), None);
    }

    #[test]
    fn test_take_object() {
        #[derive(Debug, PartialEq)]
        struct Point(i32, i32);
        let value = Value::Object(Box::new(Point(1, 2)));
        assert_eq!(value.take::<Point>(), Some(Point(1, 2)));
    }

    #[test]
    fn test_take_sequence() {
        let value = Value::Sequence(vec![Value::Integer(1), Value::Integer(2)]);
        assert_eq!(value.take_sequence::<i32>(), Some(vec![1, 2]));

        let mixed = Value::Sequence(vec![Value::Integer(1), Value::Text("a".into())]);
        assert_eq!(mixed.take_sequence::<i32>(), None);

        assert_eq!(Value::Integer(1).take_sequence::<i32>(), None);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(Value::Decimal(1.5).kind(), "decimal");
        assert_eq!(Value::Sequence(vec![]).kind(), "sequence");
    }
}
