//! Named, typed attributes attached to a [`crate::message::Message`].

use std::borrow::Cow;

/// One of the five value kinds a field may hold. Multi-valued fields preserve order.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Strings(Vec<String>),
    Bytes(Vec<Vec<u8>>),
    Integers(Vec<i64>),
    Doubles(Vec<f64>),
    Bools(Vec<bool>),
}

impl FieldValue {
    pub fn len(&self) -> usize {
        match self {
            FieldValue::Strings(v) => v.len(),
            FieldValue::Bytes(v) => v.len(),
            FieldValue::Integers(v) => v.len(),
            FieldValue::Doubles(v) => v.len(),
            FieldValue::Bools(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the `j`-th element as a [`FieldScalar`], or `None` if out of range.
    pub fn scalar(&self, j: usize) -> Option<FieldScalar<'_>> {
        match self {
            FieldValue::Strings(v) => v.get(j).map(|s| FieldScalar::Str(Cow::Borrowed(s))),
            FieldValue::Bytes(v) => v.get(j).map(|b| FieldScalar::Bytes(Cow::Borrowed(b))),
            FieldValue::Integers(v) => v.get(j).copied().map(FieldScalar::Int),
            FieldValue::Doubles(v) => v.get(j).copied().map(FieldScalar::Double),
            FieldValue::Bools(v) => v.get(j).copied().map(FieldScalar::Bool),
        }
    }
}

/// A single scalar pulled out of a [`FieldValue`] at some index, used by the matcher
/// to compare against a literal without caring which variant the field is.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldScalar<'a> {
    Str(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    Int(i64),
    Double(f64),
    Bool(bool),
}

/// Named typed attribute attached to a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Representation hint, e.g. units ("ms", "B", "count").
    pub representation: Option<String>,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue) -> Self {
        Field {
            name: name.into(),
            representation: None,
            value,
        }
    }

    pub fn with_representation(mut self, representation: impl Into<String>) -> Self {
        self.representation = Some(representation.into());
        self
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Field::new(name, FieldValue::Strings(vec![value.into()]))
    }

    pub fn strings(name: impl Into<String>, values: Vec<String>) -> Self {
        Field::new(name, FieldValue::Strings(values))
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Field::new(name, FieldValue::Integers(vec![value]))
    }

    pub fn double(name: impl Into<String>, value: f64) -> Self {
        Field::new(name, FieldValue::Doubles(vec![value]))
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Field::new(name, FieldValue::Bools(vec![value]))
    }

    pub fn bytes(name: impl Into<String>, value: Vec<u8>) -> Self {
        Field::new(name, FieldValue::Bytes(vec![value]))
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}
