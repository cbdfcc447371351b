//! Record model: attribute values plus the fields the core owns.
//!
//! Callers hand in plain attribute maps; the core never mutates or
//! decorates caller-owned structures. Instead each record is wrapped in
//! a [`Datum`] that pairs the attributes with an identity, a selection
//! flag and a display label.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute map of a single record, in insertion order.
pub type Record = IndexMap<String, Value>;

/// Stable identity of a datum within one data set.
///
/// Assigned sequentially at ingestion, never reused or changed. Every
/// set operation in the selection graph sorts and compares by this key,
/// ascending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DatumId(pub(crate) usize);

impl DatumId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DatumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An attribute value: numeric or categorical text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// The numeric form, if this value is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Writes a float without a trailing `.0` for whole numbers, so numeric
/// grouping keys match their text form.
pub(crate) fn write_number(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_finite() && v == v.trunc() && v.abs() < 1e15 {
        write!(f, "{}", v as i64)
    } else {
        write!(f, "{}", v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write_number(f, *v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A raw record wrapped with the three core-owned fields: identity,
/// selection flag and display label.
///
/// A datum is either selected or not; fractional selection exists only
/// on partition aggregates. The flag is mutated exclusively by the
/// owning data set's commit path.
#[derive(Debug, Clone)]
pub struct Datum {
    id: DatumId,
    label: String,
    selected: bool,
    values: Record,
}

impl Datum {
    pub(crate) fn new(id: DatumId, values: Record) -> Self {
        Self {
            id,
            label: id.to_string(),
            selected: false,
            values,
        }
    }

    pub fn id(&self) -> DatumId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn value(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// Numeric value of an attribute, if present and a number.
    pub fn number(&self, attribute: &str) -> Option<f64> {
        self.values.get(attribute).and_then(Value::as_number)
    }

    pub fn values(&self) -> &Record {
        &self.values
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn set_value(&mut self, attribute: String, value: Value) {
        self.values.insert(attribute, value);
    }

    pub(crate) fn remove_value(&mut self, attribute: &str) {
        self.values.shift_remove(attribute);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display_matches_grouping_key() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(3.5).to_string(), "3.5");
        assert_eq!(Value::Text("red".to_string()).to_string(), "red");
    }

    #[test]
    fn test_datum_defaults() {
        let mut values = Record::new();
        values.insert("x".to_string(), Value::Number(1.0));
        let datum = Datum::new(DatumId(7), values);
        assert_eq!(datum.label(), "7");
        assert!(!datum.selected());
        assert_eq!(datum.number("x"), Some(1.0));
        assert_eq!(datum.number("missing"), None);
    }
}
