//! Built-in value transformers
//!
//! This module provides ready-made value transformers for common field
//! conversions: date formatting, lookup tables and closures.
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use super::types::ValueTransformer;
use crate::error::{describe_json, Error};
use crate::input::is_blank_value;
use crate::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use std::fmt::{self, Write};
use std::sync::Arc;

/// Output format used when none is given
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Formats dates and timestamps with a chrono format string
#[derive(Debug, Clone, PartialEq)]
pub struct DateFormat {
    format: String,
    default: Value,
}

impl DateFormat {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            default: Value::Null,
        }
    }

    /// Value returned for blank input
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    fn parse(&self, value: &Value) -> Result<DateTime<FixedOffset>> {
        let parsed = match value {
            Value::String(s) => parse_date_string(s.trim()),
            Value::Number(n) => n
                .as_i64()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                .map(DateTime::<FixedOffset>::from),
            _ => None,
        };

        parsed.ok_or_else(|| Error::ValueTransform {
            transformer: "date_format".to_string(),
            message: format!("cannot interpret {} as a date", describe_json(value)),
        })
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

fn parse_date_string(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date);
    }

    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive).into())
}

impl ValueTransformer for DateFormat {
    fn transform_value(&self, value: Value) -> Result<Value> {
        if is_blank_value(&value) {
            return Ok(self.default.clone());
        }

        let date = self.parse(&value)?;

        let mut out = String::new();
        write!(out, "{}", date.format(&self.format)).map_err(|_| Error::ValueTransform {
            transformer: "date_format".to_string(),
            message: format!("invalid date format '{}'", self.format),
        })?;

        Ok(Value::String(out))
    }
}

/// Key under which a value is looked up in a mapping table
fn lookup_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("1".to_string()),
        Value::Bool(false) => Some("0".to_string()),
        _ => None,
    }
}

/// Look a value up in a table, falling back to a default
#[derive(Debug, Clone, PartialEq)]
pub struct MapLookup {
    map: Map<String, Value>,
    default: Value,
}

impl MapLookup {
    pub fn new(map: Map<String, Value>) -> Self {
        Self {
            map,
            default: Value::Null,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }

    fn mapped(&self, value: &Value) -> Option<&Value> {
        lookup_key(value)
            .and_then(|key| self.map.get(&key))
            .filter(|mapped| !mapped.is_null())
    }
}

impl ValueTransformer for MapLookup {
    fn transform_value(&self, value: Value) -> Result<Value> {
        Ok(self.mapped(&value).cloned().unwrap_or_else(|| self.default.clone()))
    }
}

/// Expand a value into a `{key, value}` pair using a table
#[derive(Debug, Clone, PartialEq)]
pub struct MapKeyValue {
    lookup: MapLookup,
}

impl MapKeyValue {
    pub fn new(map: Map<String, Value>) -> Self {
        Self {
            lookup: MapLookup::new(map),
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.lookup = self.lookup.with_default(default);
        self
    }
}

impl ValueTransformer for MapKeyValue {
    fn transform_value(&self, value: Value) -> Result<Value> {
        let mapped = self.lookup.transform_value(value.clone())?;

        let mut pair = Map::new();
        pair.insert("key".to_string(), value);
        pair.insert("value".to_string(), mapped);
        Ok(Value::Object(pair))
    }
}

/// Value transformer backed by a closure
#[derive(Clone)]
pub struct FnTransformer {
    name: String,
    func: Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>,
}

impl FnTransformer {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for FnTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransformer").field("name", &self.name).finish()
    }
}

impl ValueTransformer for FnTransformer {
    fn transform_value(&self, value: Value) -> Result<Value> {
        (self.func)(value)
    }
}

/// Format dates with `format`
pub fn date_format(format: impl Into<String>) -> DateFormat {
    DateFormat::new(format)
}

/// Format dates as `Y-m-d H:M:S`
pub fn date_time() -> DateFormat {
    DateFormat::default()
}

/// Map values through `map`; unmapped values become `null`
pub fn map_lookup(map: Map<String, Value>) -> MapLookup {
    MapLookup::new(map)
}

/// Map values to `{key, value}` pairs through `map`
pub fn map_key_value(map: Map<String, Value>) -> MapKeyValue {
    MapKeyValue::new(map)
}

/// Wrap an infallible closure
pub fn from_fn<F>(name: impl Into<String>, func: F) -> FnTransformer
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    FnTransformer::new(name, move |value| Ok(func(value)))
}
