//! Field value resolution
//!
//! A field is resolved through a fixed fallback chain:
//!
//! 1. a getter registered on the transformer for that field, called with the
//!    original input
//! 2. a path lookup on the original input or the current object
//! 3. a computed accessor exposed by the original record
//! 4. `null`
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use crate::input::Input;
use crate::path::{Lookup, Path};
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Computes a field from the original input
pub type Getter = Arc<dyn Fn(&Input) -> Result<Input> + Send + Sync>;

/// Per-field getter table, built once alongside the structure
#[derive(Clone, Default)]
pub struct Getters {
    getters: HashMap<String, Getter>,
}

impl Getters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a getter returning a plain JSON value
    pub fn define<F>(mut self, field: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&Input) -> Result<Value> + Send + Sync + 'static,
    {
        self.getters
            .insert(field.into(), Arc::new(move |original| getter(original).map(Input::Value)));
        self
    }

    /// Register a getter that may return records, e.g. a derived relation
    pub fn insert(&mut self, field: impl Into<String>, getter: Getter) {
        self.getters.insert(field.into(), getter);
    }

    pub fn get(&self, field: &str) -> Option<&Getter> {
        self.getters.get(field)
    }

    pub fn len(&self) -> usize {
        self.getters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.getters.is_empty()
    }
}

impl fmt::Debug for Getters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&str> = self.getters.keys().map(String::as_str).collect();
        fields.sort_unstable();
        f.debug_struct("Getters").field("fields", &fields).finish()
    }
}

/// Resolve `field` for the current level of a structure walk
pub(crate) fn resolve_value(
    getters: &Getters,
    field: &str,
    current: &Value,
    original: &Input,
    use_original: bool,
) -> Result<Input> {
    if let Some(getter) = getters.get(field) {
        return getter(original);
    }

    let path = Path::parse(field);
    let found = if use_original {
        path.lookup_input(original)
    } else {
        match path.lookup(current) {
            Lookup::Found(value) => Lookup::Found(Input::Value(value.clone())),
            Lookup::Missing => Lookup::Missing,
        }
    };
    if let Lookup::Found(value) = found {
        return Ok(value);
    }

    if let Input::Record(record) = original {
        if let Some(value) = record.accessor(field) {
            return Ok(Input::Value(value));
        }
    }

    Ok(Input::null())
}
