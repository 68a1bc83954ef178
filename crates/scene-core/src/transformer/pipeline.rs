//! Top-level transform pipeline
//!
//! Classifies the input as a sequence or a single value, runs the scene's
//! pre-processing hooks, walks each object and orders collections.
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use super::engine::walk;
use super::scene::{Resolved, Scene};
use super::types::{Direction, OrderBy};
use crate::error::Error;
use crate::input::Input;
use crate::path::{Lookup, Path};
use crate::Result;
use serde_json::Value;
use std::cmp::Ordering;

/// Transform `input` as a collection or a single value
pub(crate) fn run<S: Scene + ?Sized>(scene: &S, resolved: &Resolved, input: Input) -> Result<Value> {
    if !input.is_sequence() {
        return transform_one(scene, resolved, input);
    }

    let items = input.into_sequence().unwrap_or_default();
    let processed = scene.pre_process_collection(items)?;
    if !processed.is_sequence() {
        return Err(Error::InvalidCollectionHook {
            found: processed.kind().to_string(),
        });
    }

    let mut transformed = processed
        .into_sequence()
        .unwrap_or_default()
        .into_iter()
        .map(|item| transform_one(scene, resolved, item))
        .collect::<Result<Vec<_>>>()?;

    if let Some(order_by) = scene.order_by() {
        sort_by_field(&mut transformed, &order_by);
    }

    Ok(Value::Array(transformed))
}

/// Transform one element: null state, pre-processing, walk, post-hook
pub(crate) fn transform_one<S: Scene + ?Sized>(scene: &S, resolved: &Resolved, object: Input) -> Result<Value> {
    if object.is_blank() {
        return Ok(scene.null_state());
    }

    let original = scene.pre_process_single(object)?;
    if original.is_blank() {
        return Err(Error::NullAfterPreprocess {
            transformer: scene.name().to_string(),
        });
    }

    let current = original.to_value();
    let transformed = walk(&resolved.getters, &current, &resolved.structure, &original)?;

    scene.transform_object(transformed, &original)
}

/// Stable sort of transformed objects by a (possibly dotted) output field
pub fn sort_by_field(items: &mut [Value], order_by: &OrderBy) {
    let path = Path::parse(&order_by.field);
    let key = |item: &Value| match path.lookup(item) {
        Lookup::Found(value) => value.clone(),
        Lookup::Missing => Value::Null,
    };

    items.sort_by(|a, b| {
        let ordering = compare_values(&key(a), &key(b));
        match order_by.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });
}

/// Total order over JSON values: null < bool < number < string < array < object
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(x, y)| compare_values(x, y))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compare_values_across_types() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!([1, 2]), &json!([1, 2, 0])), Ordering::Less);
        assert_eq!(compare_values(&json!("1"), &json!(1)), Ordering::Greater);
    }

    #[test]
    fn test_sort_by_nested_field() {
        let mut items = vec![
            json!({"id": 1, "meta": {"rank": 3}}),
            json!({"id": 2, "meta": {"rank": 1}}),
            json!({"id": 3, "meta": {"rank": 2}}),
        ];
        sort_by_field(&mut items, &OrderBy::asc("meta.rank"));
        let ids: Vec<&Value> = items.iter().map(|item| &item["id"]).collect();
        assert_eq!(ids, vec![&json!(2), &json!(3), &json!(1)]);
    }

    #[test]
    fn test_descending_keeps_ties_stable() {
        let mut items = vec![
            json!({"id": 1, "group": "a"}),
            json!({"id": 2, "group": "b"}),
            json!({"id": 3, "group": "a"}),
            json!({"id": 4, "group": "b"}),
        ];
        sort_by_field(&mut items, &OrderBy::new("group", "DESC"));
        let ids: Vec<&Value> = items.iter().map(|item| &item["id"]).collect();
        assert_eq!(ids, vec![&json!(2), &json!(4), &json!(1), &json!(3)]);
    }

    #[test]
    fn test_missing_sort_field_sorts_first() {
        let mut items = vec![json!({"id": 1, "n": 5}), json!({"id": 2})];
        sort_by_field(&mut items, &OrderBy::asc("n"));
        assert_eq!(items[0]["id"], json!(2));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #[test]
        fn ascending_sort_is_ordered(keys in proptest::collection::vec(any::<i64>(), 0..30)) {
            let mut items: Vec<Value> = keys.iter().map(|k| json!({"k": k})).collect();
            sort_by_field(&mut items, &OrderBy::asc("k"));
            for pair in items.windows(2) {
                prop_assert!(pair[0]["k"].as_i64() <= pair[1]["k"].as_i64());
            }
        }

        #[test]
        fn sort_is_stable_for_equal_keys(keys in proptest::collection::vec(0i64..4, 0..30), desc in any::<bool>()) {
            let mut items: Vec<Value> = keys
                .iter()
                .enumerate()
                .map(|(position, k)| json!({"k": k, "position": position}))
                .collect();
            let order_by = if desc { OrderBy::desc("k") } else { OrderBy::asc("k") };
            sort_by_field(&mut items, &order_by);

            for pair in items.windows(2) {
                if pair[0]["k"] == pair[1]["k"] {
                    prop_assert!(pair[0]["position"].as_u64() < pair[1]["position"].as_u64());
                }
            }
        }
    }
}
