//! Core types for the structure transformation system
//!
//! This module defines the transformer capabilities, the structure variant
//! selector and the ordering rule applied to transformed collections.
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use crate::input::Input;
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Anything that turns an input into a JSON-ready value
pub trait Transformer: Send + Sync {
    fn transform(&self, input: Input) -> Result<Value>;
}

/// A stateless transformation of a single value in isolation
pub trait ValueTransformer: Send + Sync + fmt::Debug {
    fn transform_value(&self, value: Value) -> Result<Value>;
}

/// A transformer driven by a structure tree, usable as a nested node
pub trait StructureTransformer: Transformer {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Relations this transformer needs loaded, ordered and deduplicated
    fn plan_preloads(&self) -> Vec<String>;
}

/// Either kind of transformer, as accepted by keyed structure entries and
/// response extras
#[derive(Clone)]
pub enum AnyTransformer {
    Structure(Arc<dyn StructureTransformer>),
    Value(Arc<dyn ValueTransformer>),
}

impl AnyTransformer {
    pub fn structure(transformer: impl StructureTransformer + 'static) -> Self {
        AnyTransformer::Structure(Arc::new(transformer))
    }

    pub fn value(transformer: impl ValueTransformer + 'static) -> Self {
        AnyTransformer::Value(Arc::new(transformer))
    }
}

impl Transformer for AnyTransformer {
    fn transform(&self, input: Input) -> Result<Value> {
        match self {
            AnyTransformer::Structure(transformer) => transformer.transform(input),
            AnyTransformer::Value(transformer) => transformer.transform_value(input.into_value()),
        }
    }
}

impl fmt::Debug for AnyTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyTransformer::Structure(transformer) => {
                f.debug_tuple("Structure").field(&transformer.name()).finish()
            }
            AnyTransformer::Value(transformer) => f.debug_tuple("Value").field(transformer).finish(),
        }
    }
}

impl From<Arc<dyn StructureTransformer>> for AnyTransformer {
    fn from(transformer: Arc<dyn StructureTransformer>) -> Self {
        AnyTransformer::Structure(transformer)
    }
}

impl From<Arc<dyn ValueTransformer>> for AnyTransformer {
    fn from(transformer: Arc<dyn ValueTransformer>) -> Self {
        AnyTransformer::Value(transformer)
    }
}

/// Which structure tree a transformer uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    #[default]
    Standard,
    Minimal,
    Download,
}

impl Variant {
    /// Variant selected by the two construction flags; download wins
    pub fn from_flags(show_min: bool, use_download_structure: bool) -> Self {
        if use_download_structure {
            Variant::Download
        } else if show_min {
            Variant::Minimal
        } else {
            Variant::Standard
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Standard => write!(f, "standard"),
            Variant::Minimal => write!(f, "minimal"),
            Variant::Download => write!(f, "download"),
        }
    }
}

impl FromStr for Variant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Variant::Standard),
            "minimal" | "min" => Ok(Variant::Minimal),
            "download" => Ok(Variant::Download),
            other => Err(Error::configuration(format!("Unknown structure variant: {}", other))),
        }
    }
}

/// Sort direction of an order-by rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    /// Case-insensitive; anything other than `desc`/`descending` is ascending
    pub fn parse(direction: &str) -> Self {
        match direction.trim().to_lowercase().as_str() {
            "desc" | "descending" => Direction::Descending,
            _ => Direction::Ascending,
        }
    }
}

/// Ordering applied to a transformed collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field of the transformed output; dotted paths allowed
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: &str) -> Self {
        Self {
            field: field.into(),
            direction: Direction::parse(direction),
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

impl From<&str> for OrderBy {
    fn from(field: &str) -> Self {
        OrderBy::asc(field)
    }
}

impl From<(&str, &str)> for OrderBy {
    fn from((field, direction): (&str, &str)) -> Self {
        OrderBy::new(field, direction)
    }
}
