//! Declarative structure trees
//!
//! A [`Structure`] is an ordered list of output keys, each mounted with a
//! [`StructureNode`] that says how the value for that key is produced.
//! Structures are built with a fluent API:
//!
//! ```
//! use scene_core::{Structure, built_in};
//!
//! let structure = Structure::new()
//!     .field("id")
//!     .rename("display_name", "name")
//!     .value("created_at", built_in::date_format("%Y-%m-%d"))
//!     .nested("address", Structure::from_fields(["city", "country"]))
//!     .when(false, "email", "email".into());
//!
//! assert_eq!(structure.len(), 5);
//! ```
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use crate::transformer::{AnyTransformer, StructureTransformer, ValueTransformer};
use crate::Result;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Marker that passes the current object through unchanged, as key or value
pub const PASSTHROUGH: &str = "__all";

/// How the value for one output key is produced
#[derive(Clone)]
pub enum StructureNode {
    /// Stop and return the entire current object for this level
    Passthrough,
    /// Drop the key from the output
    Remove,
    /// Copy the field named like the output key
    PlainField,
    /// Copy a differently named source field
    RenamedField(String),
    /// Transform the sub-value read from the original record
    ChildTransformer(Arc<dyn StructureTransformer>),
    /// Transform the sub-value, element-wise when it is a sequence
    ValueTransformerNode(Arc<dyn ValueTransformer>),
    /// Read `source` and apply `transformer` once
    KeyedTransformer {
        source: String,
        transformer: AnyTransformer,
    },
    /// Evaluate a subtree against the same object, without nesting the input
    FlatSubtree(Structure),
    /// Evaluate a subtree against the sub-object at the output key
    NestedSubtree(Structure),
}

impl StructureNode {
    /// Short name of the node kind
    pub fn kind(&self) -> &'static str {
        match self {
            StructureNode::Passthrough => "passthrough",
            StructureNode::Remove => "remove",
            StructureNode::PlainField => "plain_field",
            StructureNode::RenamedField(_) => "renamed_field",
            StructureNode::ChildTransformer(_) => "child_transformer",
            StructureNode::ValueTransformerNode(_) => "value_transformer",
            StructureNode::KeyedTransformer { .. } => "keyed_transformer",
            StructureNode::FlatSubtree(_) => "flat_subtree",
            StructureNode::NestedSubtree(_) => "nested_subtree",
        }
    }
}

impl From<&str> for StructureNode {
    /// A source field name; the output key decides whether it is a rename
    fn from(source: &str) -> Self {
        if source == PASSTHROUGH {
            StructureNode::Passthrough
        } else {
            StructureNode::RenamedField(source.to_string())
        }
    }
}

impl From<Structure> for StructureNode {
    fn from(structure: Structure) -> Self {
        StructureNode::NestedSubtree(structure)
    }
}

impl fmt::Debug for StructureNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureNode::Passthrough => write!(f, "Passthrough"),
            StructureNode::Remove => write!(f, "Remove"),
            StructureNode::PlainField => write!(f, "PlainField"),
            StructureNode::RenamedField(source) => f.debug_tuple("RenamedField").field(source).finish(),
            StructureNode::ChildTransformer(child) => {
                f.debug_tuple("ChildTransformer").field(&child.name()).finish()
            }
            StructureNode::ValueTransformerNode(transformer) => {
                f.debug_tuple("ValueTransformerNode").field(transformer).finish()
            }
            StructureNode::KeyedTransformer { source, transformer } => f
                .debug_struct("KeyedTransformer")
                .field("source", source)
                .field("transformer", transformer)
                .finish(),
            StructureNode::FlatSubtree(structure) => f.debug_tuple("FlatSubtree").field(structure).finish(),
            StructureNode::NestedSubtree(structure) => {
                f.debug_tuple("NestedSubtree").field(structure).finish()
            }
        }
    }
}

/// Ordered structure tree
#[derive(Clone, Default, Debug)]
pub struct Structure {
    entries: Vec<(String, StructureNode)>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Structure copying each named field as-is
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        fields.into_iter().fold(Self::new(), |structure, field| structure.field(field))
    }

    /// Parse a JSON structure tree; see [`crate::config`] for the syntax.
    ///
    /// Scene references need a catalog and are rejected here.
    pub fn from_json(value: &Value) -> Result<Self> {
        crate::config::parse_structure(value)
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[(String, StructureNode)] {
        &self.entries
    }

    /// The node mounted at `key`
    pub fn get(&self, key: &str) -> Option<&StructureNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, node)| node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mount `node` at `key`. Re-using a key replaces the node in place.
    pub fn push(&mut self, key: impl Into<String>, node: StructureNode) {
        let key = key.into();
        let node = match node {
            StructureNode::RenamedField(source) if source == key => StructureNode::PlainField,
            node => node,
        };

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = node,
            None => self.entries.push((key, node)),
        }
    }

    /// Mount `node` at `key`
    pub fn entry(mut self, key: impl Into<String>, node: StructureNode) -> Self {
        self.push(key, node);
        self
    }

    /// Copy a field, or pass the object through for `"__all"`
    pub fn field(self, name: impl Into<String>) -> Self {
        let name = name.into();
        if name == PASSTHROUGH {
            return self.all();
        }
        self.entry(name, StructureNode::PlainField)
    }

    /// Output `source` under `key`
    pub fn rename(self, key: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        self.entry(key, StructureNode::from(source.as_str()))
    }

    /// Pass the whole current object through
    pub fn all(self) -> Self {
        self.entry(PASSTHROUGH, StructureNode::Passthrough)
    }

    /// Explicitly drop `key`
    pub fn remove(self, key: impl Into<String>) -> Self {
        self.entry(key, StructureNode::Remove)
    }

    /// Nest a structure transformer
    pub fn child(self, key: impl Into<String>, transformer: impl StructureTransformer + 'static) -> Self {
        self.entry(key, StructureNode::ChildTransformer(Arc::new(transformer)))
    }

    /// Nest a shared structure transformer
    pub fn child_shared(self, key: impl Into<String>, transformer: Arc<dyn StructureTransformer>) -> Self {
        self.entry(key, StructureNode::ChildTransformer(transformer))
    }

    /// Apply a value transformer to the field named like `key`
    pub fn value(self, key: impl Into<String>, transformer: impl ValueTransformer + 'static) -> Self {
        self.entry(key, StructureNode::ValueTransformerNode(Arc::new(transformer)))
    }

    /// Read `source`, apply `transformer` and output under `key`
    pub fn keyed(
        self,
        key: impl Into<String>,
        source: impl Into<String>,
        transformer: impl Into<AnyTransformer>,
    ) -> Self {
        self.entry(
            key,
            StructureNode::KeyedTransformer {
                source: source.into(),
                transformer: transformer.into(),
            },
        )
    }

    /// Evaluate `structure` against the same object, output under `key`
    pub fn flat(self, key: impl Into<String>, structure: Structure) -> Self {
        self.entry(key, StructureNode::FlatSubtree(structure))
    }

    /// Evaluate `structure` against the sub-object at `key`
    pub fn nested(self, key: impl Into<String>, structure: Structure) -> Self {
        self.entry(key, StructureNode::NestedSubtree(structure))
    }

    /// Mount `node` when `condition` holds, otherwise drop the key
    pub fn when(self, condition: bool, key: impl Into<String>, node: StructureNode) -> Self {
        self.entry(key, if condition { node } else { StructureNode::Remove })
    }

    /// Like [`Structure::when`], building the node only when needed
    pub fn when_with<F>(self, condition: bool, key: impl Into<String>, node: F) -> Self
    where
        F: FnOnce() -> StructureNode,
    {
        self.entry(key, if condition { node() } else { StructureNode::Remove })
    }
}

impl<S: Into<String>> FromIterator<S> for Structure {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Structure::from_fields(iter)
    }
}
