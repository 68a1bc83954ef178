//! Data flowing into a transformer
//!
//! Transformers accept plain JSON values, records that expose attributes,
//! relations and computed accessors, or ordered lists of either.

use crate::record::Record;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A value handed to a transformer
#[derive(Clone, Debug)]
pub enum Input {
    /// Plain JSON data
    Value(Value),
    /// A record with attributes, relations and accessors
    Record(Arc<dyn Record>),
    /// An ordered collection
    List(Vec<Input>),
}

impl Input {
    /// The null input
    pub fn null() -> Self {
        Input::Value(Value::Null)
    }

    /// Wrap a record
    pub fn record(record: impl Record + 'static) -> Self {
        Input::Record(Arc::new(record))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Input::Value(Value::Null))
    }

    /// Whether the input counts as empty: null, false, "", or an empty container.
    ///
    /// Records are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Input::Value(value) => is_blank_value(value),
            Input::Record(_) => false,
            Input::List(items) => items.is_empty(),
        }
    }

    /// Whether the input is an ordered, 0-indexed collection
    pub fn is_sequence(&self) -> bool {
        match self {
            Input::Value(value) => is_sequential(value),
            Input::Record(_) => false,
            Input::List(_) => true,
        }
    }

    /// Coerce a sequence into its elements, or `None` for single values
    pub fn into_sequence(self) -> Option<Vec<Input>> {
        match self {
            Input::List(items) => Some(items),
            Input::Value(Value::Array(items)) => Some(items.into_iter().map(Input::Value).collect()),
            Input::Value(Value::Object(map)) if is_sequential_map(&map) => {
                Some(map.into_iter().map(|(_, v)| Input::Value(v)).collect())
            }
            _ => None,
        }
    }

    /// Serialized view of the input
    pub fn to_value(&self) -> Value {
        match self {
            Input::Value(value) => value.clone(),
            Input::Record(record) => record.to_value(),
            Input::List(items) => Value::Array(items.iter().map(Input::to_value).collect()),
        }
    }

    /// Consume the input into its serialized view
    pub fn into_value(self) -> Value {
        match self {
            Input::Value(value) => value,
            other => other.to_value(),
        }
    }

    /// Member of the input by key: a map entry, record field, or numeric index
    pub fn child(&self, key: &str) -> Option<Input> {
        match self {
            Input::Value(value) => value_child(value, key).cloned().map(Input::Value),
            Input::Record(record) => record.get(key),
            Input::List(items) => key.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
        }
    }

    /// Element of the input by integer index
    pub fn index(&self, index: usize) -> Option<Input> {
        match self {
            Input::Value(value) => value_index(value, index).cloned().map(Input::Value),
            Input::Record(record) => record.get(&index.to_string()),
            Input::List(items) => items.get(index).cloned(),
        }
    }

    /// Name of the input kind for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Input::Value(Value::Null) => "null",
            Input::Value(Value::Bool(_)) => "boolean",
            Input::Value(Value::Number(_)) => "number",
            Input::Value(Value::String(_)) => "string",
            Input::Value(Value::Array(_)) => "array",
            Input::Value(Value::Object(_)) => "object",
            Input::Record(_) => "record",
            Input::List(_) => "list",
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Input::null()
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl From<Arc<dyn Record>> for Input {
    fn from(record: Arc<dyn Record>) -> Self {
        Input::Record(record)
    }
}

impl From<Vec<Input>> for Input {
    fn from(items: Vec<Input>) -> Self {
        Input::List(items)
    }
}

/// PHP-style emptiness: null, false, 0, 0.0, "", "0", [] and {}
pub fn is_blank_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Arrays, and non-empty objects keyed exactly "0".."n-1" in order
pub fn is_sequential(value: &Value) -> bool {
    match value {
        Value::Array(_) => true,
        Value::Object(map) => is_sequential_map(map),
        _ => false,
    }
}

fn is_sequential_map(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().enumerate().all(|(i, key)| *key == i.to_string())
}

pub(crate) fn value_child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

pub(crate) fn value_index(value: &Value, index: usize) -> Option<&Value> {
    match value {
        Value::Array(items) => items.get(index),
        Value::Object(map) => map.get(&index.to_string()),
        _ => None,
    }
}
