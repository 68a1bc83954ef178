//! Relation preload planning
//!
//! A scene declares the relations it needs as a [`PreloadSpec`]. Planning turns
//! that declaration into an ordered, deduplicated list of relation paths,
//! recursing into child transformers for entries marked [`Preload::Related`].
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use crate::structure::{Structure, StructureNode};

/// Marker value asking the planner to expand a relation through its child transformer
pub const PRELOAD_RELATED: &str = "__related";

/// How a declared relation takes part in the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preload {
    /// Always included
    Always,
    /// Included only when the flag is set
    When(bool),
    /// Expanded through the child transformer mounted at the same key
    Related,
}

/// Ordered relation declarations of a scene
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadSpec {
    entries: Vec<(String, Preload)>,
}

impl PreloadSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional relations, in order
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(Self::new(), |spec, name| spec.always(name))
    }

    pub fn always(self, relation: impl Into<String>) -> Self {
        self.with(relation, Preload::Always)
    }

    pub fn when(self, relation: impl Into<String>, condition: bool) -> Self {
        self.with(relation, Preload::When(condition))
    }

    pub fn related(self, relation: impl Into<String>) -> Self {
        self.with(relation, Preload::Related)
    }

    /// Declare `relation`, replacing an earlier declaration of the same name
    pub fn with(mut self, relation: impl Into<String>, preload: Preload) -> Self {
        let relation = relation.into();
        match self.entries.iter_mut().find(|(name, _)| *name == relation) {
            Some(slot) => slot.1 = preload,
            None => self.entries.push((relation, preload)),
        }
        self
    }

    pub fn entries(&self) -> &[(String, Preload)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Plan the relations to load for `spec`, given the active structure
pub fn plan(spec: &PreloadSpec, structure: &Structure) -> Vec<String> {
    let mut planned: Vec<String> = Vec::new();

    for (relation, preload) in spec.entries() {
        match preload {
            Preload::Always | Preload::When(true) => planned.push(relation.clone()),
            Preload::When(false) => {}
            Preload::Related => {
                if let Some(StructureNode::ChildTransformer(child)) = structure.get(relation) {
                    planned.extend(
                        child
                            .plan_preloads()
                            .into_iter()
                            .map(|nested| format!("{}.{}", relation, nested)),
                    );
                }
            }
        }
    }

    dedup_in_order(planned)
}

/// Drop repeated entries, keeping the first occurrence
pub(crate) fn dedup_in_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}
