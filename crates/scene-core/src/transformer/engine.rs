//! Structure tree walker
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use super::resolver::{resolve_value, Getters};
use super::types::Transformer;
use crate::input::{is_blank_value, Input};
use crate::structure::{Structure, StructureNode, PASSTHROUGH};
use crate::Result;
use serde_json::{Map, Value};

/// Evaluate `structure` against `object`.
///
/// `original` is the untransformed top-level input and stays the same through
/// the whole recursion. A passthrough entry returns `object` as-is and drops
/// whatever this level produced before it.
pub(crate) fn walk(getters: &Getters, object: &Value, structure: &Structure, original: &Input) -> Result<Value> {
    let mut output = Map::new();

    if structure.is_empty() || is_blank_value(object) {
        return Ok(Value::Object(output));
    }

    for (key, node) in structure.entries() {
        tracing::trace!(key = %key, node = node.kind(), "evaluating structure entry");

        if key == PASSTHROUGH {
            return Ok(object.clone());
        }

        let value = match node {
            StructureNode::Passthrough => return Ok(object.clone()),
            StructureNode::Remove => continue,
            StructureNode::PlainField => resolve_value(getters, key, object, original, false)?.into_value(),
            StructureNode::RenamedField(source) => {
                resolve_value(getters, source, object, original, false)?.into_value()
            }
            StructureNode::ChildTransformer(child) => {
                child.transform(resolve_value(getters, key, object, original, true)?)?
            }
            StructureNode::ValueTransformerNode(transformer) => {
                let resolved = resolve_value(getters, key, object, original, false)?;
                if resolved.is_sequence() {
                    let items = resolved.into_sequence().unwrap_or_default();
                    Value::Array(
                        items
                            .into_iter()
                            .map(|item| transformer.transform_value(item.into_value()))
                            .collect::<Result<Vec<_>>>()?,
                    )
                } else {
                    transformer.transform_value(resolved.into_value())?
                }
            }
            StructureNode::KeyedTransformer { source, transformer } => {
                transformer.transform(resolve_value(getters, source, object, original, false)?)?
            }
            StructureNode::FlatSubtree(subtree) => walk(getters, object, subtree, original)?,
            StructureNode::NestedSubtree(subtree) => {
                let nested = resolve_value(getters, key, object, original, false)?.into_value();
                walk(getters, &nested, subtree, original)?
            }
        };

        output.insert(key.clone(), value);
    }

    Ok(Value::Object(output))
}
