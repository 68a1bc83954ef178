//! Tests for the structure transformation engine
//!
//! Covers projection, variants, hooks, ordering, getters, child transformers
//! and relation preloading.
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use super::*;
use crate::error::Error;
use crate::inject::Services;
use crate::input::Input;
use crate::record::{Loadable, Model, ModelSet};
use crate::structure::Structure;
use crate::Result;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scene whose structures come entirely from transformer overrides
struct Blank;

impl Scene for Blank {
    fn structure(&self) -> Structure {
        Structure::new()
    }
}

fn persons_array() -> Value {
    json!([
        {"id": 1, "name": "Azaan", "email": "azaan@email.com"},
        {"id": 2, "name": "John Doe", "email": "john@email.com"},
    ])
}

fn person_models() -> Vec<Model> {
    persons_array()
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|attributes| {
            Model::new(attributes)
                .with_relation("status", json!("status"))
                .with_accessor("number", |_| json!("number"))
        })
        .collect()
}

fn person_records() -> Input {
    Input::List(person_models().into_iter().map(Model::into_input).collect())
}

fn simple(structure: Structure) -> SceneTransformer<Blank> {
    SceneTransformer::new(Blank).with_structure(structure)
}

fn prefix_child() -> AnyTransformer {
    AnyTransformer::value(built_in::from_fn("prefix", |value| json!(format!("child{}", value))))
}

#[test]
fn test_simple_transformation() {
    let output = simple(Structure::from_fields(["id", "name"]))
        .transform(Input::from(persons_array()))
        .unwrap();

    assert_eq!(
        output,
        json!([{"id": 1, "name": "Azaan"}, {"id": 2, "name": "John Doe"}])
    );
}

#[test]
fn test_record_transformation() {
    let output = simple(Structure::from_fields(["id", "name"]))
        .transform(person_records())
        .unwrap();

    assert_eq!(
        output,
        json!([{"id": 1, "name": "Azaan"}, {"id": 2, "name": "John Doe"}])
    );
}

#[test]
fn test_loadable_transformation() {
    let mut people = ModelSet::new(person_models());
    let output = simple(Structure::from_fields(["id", "name"]))
        .transform_loadable(&mut people)
        .unwrap();

    assert_eq!(
        output,
        json!([{"id": 1, "name": "Azaan"}, {"id": 2, "name": "John Doe"}])
    );
    assert!(people.load_requests().is_empty());
}

#[test]
fn test_minimal_structure() {
    let transformer = SceneTransformer::minimal(Blank).with_min_structure(Structure::from_fields(["id"]));
    assert_eq!(transformer.variant(), Variant::Minimal);

    let output = transformer.transform(Input::from(persons_array())).unwrap();
    assert_eq!(output, json!([{"id": 1}, {"id": 2}]));
}

#[test]
fn test_download_structure() {
    let transformer = SceneTransformer::download(Blank)
        .with_structure(Structure::from_fields(["id", "name"]))
        .with_download_structure(Structure::from_fields(["id"]));
    assert_eq!(transformer.variant(), Variant::Download);

    let output = transformer.transform(Input::from(persons_array())).unwrap();
    assert_eq!(output, json!([{"id": 1}, {"id": 2}]));
}

#[test]
fn test_variant_falls_back_to_standard_structure() {
    struct Person;

    impl Scene for Person {
        fn structure(&self) -> Structure {
            Structure::from_fields(["id", "name"])
        }
    }

    let output = SceneTransformer::with_variant(Person, Variant::Minimal)
        .transform(Input::from(json!({"id": 1, "name": "Ada", "email": "x"})))
        .unwrap();
    assert_eq!(output, json!({"id": 1, "name": "Ada"}));
}

#[test]
fn test_empty_array() {
    let transformer = simple(Structure::from_fields(["id", "name"]));
    assert_eq!(transformer.transform(Input::from(json!([]))).unwrap(), json!([]));
    assert_eq!(transformer.transform(Input::List(vec![])).unwrap(), json!([]));
}

#[test]
fn test_null_state() {
    struct WithNullState;

    impl Scene for WithNullState {
        fn structure(&self) -> Structure {
            Structure::from_fields(["id"])
        }

        fn null_state(&self) -> Value {
            json!({"id": null})
        }
    }

    let output = SceneTransformer::new(WithNullState)
        .transform(Input::from(json!([null])))
        .unwrap();
    assert_eq!(output, json!([{"id": null}]));
}

#[test]
fn test_null_state_defaults_to_null() {
    let transformer = simple(Structure::from_fields(["id"]));
    assert_eq!(transformer.transform(Input::from(json!([null]))).unwrap(), json!([null]));
    assert_eq!(transformer.transform(Input::null()).unwrap(), json!(null));
    assert_eq!(transformer.transform(Input::from(json!({}))).unwrap(), json!(null));
}

#[test]
fn test_zero_counts_as_empty() {
    let structure = Structure::new()
        .field("id")
        .nested("address", Structure::from_fields(["city"]));

    let output = simple(structure)
        .transform(Input::from(json!([0, {"id": 1, "address": 0}, "0", {"id": 2, "address": "0"}])))
        .unwrap();
    assert_eq!(
        output,
        json!([null, {"id": 1, "address": {}}, null, {"id": 2, "address": {}}])
    );
}

#[test]
fn test_single_value_is_unwrapped() {
    let output = simple(Structure::from_fields(["id"]))
        .transform(Input::from(json!({"id": 5, "name": "x"})))
        .unwrap();
    assert_eq!(output, json!({"id": 5}));
}

#[test]
fn test_sequential_keyed_object_is_a_collection() {
    let output = simple(Structure::from_fields(["id"]))
        .transform(Input::from(json!({"0": {"id": 1}, "1": {"id": 2}})))
        .unwrap();
    assert_eq!(output, json!([{"id": 1}, {"id": 2}]));
}

#[test]
fn test_pre_process_single() {
    struct AddsKey;

    impl Scene for AddsKey {
        fn structure(&self) -> Structure {
            Structure::from_fields(["id", "key"])
        }

        fn pre_process_single(&self, input: Input) -> Result<Input> {
            let mut value = input.into_value();
            if let Some(map) = value.as_object_mut() {
                map.insert("key".to_string(), json!("test"));
            }
            Ok(Input::Value(value))
        }
    }

    let output = SceneTransformer::new(AddsKey)
        .transform(Input::from(persons_array()))
        .unwrap();
    assert_eq!(output, json!([{"id": 1, "key": "test"}, {"id": 2, "key": "test"}]));
}

#[test]
fn test_pre_process_collection() {
    struct AddsKeyToAll;

    impl Scene for AddsKeyToAll {
        fn structure(&self) -> Structure {
            Structure::from_fields(["id", "key"])
        }

        fn pre_process_collection(&self, items: Vec<Input>) -> Result<Input> {
            Ok(Input::List(
                items
                    .into_iter()
                    .map(|item| {
                        let mut value = item.into_value();
                        if let Some(map) = value.as_object_mut() {
                            map.insert("key".to_string(), json!("test"));
                        }
                        Input::Value(value)
                    })
                    .collect(),
            ))
        }
    }

    let output = SceneTransformer::new(AddsKeyToAll)
        .transform(Input::from(persons_array()))
        .unwrap();
    assert_eq!(output, json!([{"id": 1, "key": "test"}, {"id": 2, "key": "test"}]));
}

#[test]
fn test_collection_hook_must_return_sequence() {
    struct Collapses;

    impl Scene for Collapses {
        fn structure(&self) -> Structure {
            Structure::from_fields(["id"])
        }

        fn pre_process_collection(&self, _items: Vec<Input>) -> Result<Input> {
            Ok(Input::from(json!({"id": 1})))
        }
    }

    let err = SceneTransformer::new(Collapses)
        .transform(Input::from(persons_array()))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCollectionHook { ref found } if found == "object"));
}

#[test]
fn test_null_after_pre_process_fails() {
    struct Erases;

    impl Scene for Erases {
        fn name(&self) -> &str {
            "erases"
        }

        fn structure(&self) -> Structure {
            Structure::from_fields(["id"])
        }

        fn pre_process_single(&self, _input: Input) -> Result<Input> {
            Ok(Input::null())
        }
    }

    let err = SceneTransformer::new(Erases)
        .transform(Input::from(persons_array()))
        .unwrap_err();
    assert!(matches!(err, Error::NullAfterPreprocess { ref transformer } if transformer == "erases"));
}

#[test]
fn test_ordering() {
    struct Ordered;

    impl Scene for Ordered {
        fn structure(&self) -> Structure {
            Structure::from_fields(["id"])
        }

        fn order_by(&self) -> Option<OrderBy> {
            Some(("id", "desc").into())
        }
    }

    let output = SceneTransformer::new(Ordered)
        .transform(Input::from(persons_array()))
        .unwrap();
    assert_eq!(output, json!([{"id": 2}, {"id": 1}]));
}

#[test]
fn test_lookup_with_different_key() {
    let output = simple(Structure::new().rename("key", "id"))
        .transform(Input::from(persons_array()))
        .unwrap();
    assert_eq!(output, json!([{"key": 1}, {"key": 2}]));
}

#[test]
fn test_value_transformer_at_own_key() {
    let output = simple(Structure::new().value(
        "id",
        built_in::from_fn("prefix", |value| json!(format!("child{}", value))),
    ))
    .transform(Input::from(persons_array()))
    .unwrap();
    assert_eq!(output, json!([{"id": "child1"}, {"id": "child2"}]));
}

#[test]
fn test_keyed_transformer_with_different_key() {
    let output = simple(Structure::new().keyed("key", "id", prefix_child()))
        .transform(Input::from(persons_array()))
        .unwrap();
    assert_eq!(output, json!([{"key": "child1"}, {"key": "child2"}]));
}

#[test]
fn test_value_transformer_maps_sequences() {
    let output = simple(Structure::new().value(
        "tags",
        built_in::from_fn("upper", |value| json!(value.as_str().unwrap_or_default().to_uppercase())),
    ))
    .transform(Input::from(json!({"tags": ["a", "b"]})))
    .unwrap();
    assert_eq!(output, json!({"tags": ["A", "B"]}));
}

#[test]
fn test_transformer_lookup_chain() {
    let getters = Getters::new().define("id", |original| {
        let id = original.child("id").map(Input::into_value).unwrap_or_default();
        Ok(json!(format!("child{}", id)))
    });

    struct WithGetters(Getters);

    impl Scene for WithGetters {
        fn structure(&self) -> Structure {
            Structure::from_fields(["id", "status", "number"])
        }

        fn getters(&self) -> Getters {
            self.0.clone()
        }
    }

    let output = SceneTransformer::new(WithGetters(getters))
        .transform(person_records())
        .unwrap();

    assert_eq!(
        output,
        json!([
            {"id": "child1", "status": "status", "number": "number"},
            {"id": "child2", "status": "status", "number": "number"},
        ])
    );
}

#[test]
fn test_structure_when_helper() {
    let structure = Structure::new()
        .field("id")
        .when(false, "email", "email".into())
        .when(true, "valid", "name".into())
        .when_with(true, "valid2", || "name".into());

    let output = simple(structure).transform(person_records()).unwrap();
    assert_eq!(
        output,
        json!([
            {"id": 1, "valid": "Azaan", "valid2": "Azaan"},
            {"id": 2, "valid": "John Doe", "valid2": "John Doe"},
        ])
    );
}

#[test]
fn test_missing_field_is_null() {
    let output = simple(Structure::from_fields(["invalid"]))
        .transform(person_records())
        .unwrap();
    assert_eq!(output, json!([{"invalid": null}, {"invalid": null}]));
}

#[test]
fn test_passthrough_is_idempotent() {
    let transformer = simple(Structure::from_fields(["__all"]));
    let data = json!({"id": 1, "nested": {"a": [1, 2]}, "name": "x"});

    let once = transformer.transform(Input::from(data.clone())).unwrap();
    let twice = transformer.transform(Input::from(once.clone())).unwrap();
    assert_eq!(once, data);
    assert_eq!(twice, data);
}

#[test]
fn test_child_scene_reads_original_record() {
    struct Author;

    impl Scene for Author {
        fn structure(&self) -> Structure {
            Structure::new().rename("display", "name").field("initials")
        }

        fn getters(&self) -> Getters {
            Getters::new().define("initials", |original| {
                let name = original.child("name").map(Input::into_value).unwrap_or_default();
                let initials: String = name
                    .as_str()
                    .unwrap_or_default()
                    .split_whitespace()
                    .filter_map(|part| part.chars().next())
                    .collect();
                Ok(json!(initials))
            })
        }
    }

    let post = Model::new(json!({"id": 3, "title": "Notes"}))
        .with_relation("author", Model::new(json!({"name": "Ada Lovelace"})).into_input());

    let structure = Structure::new()
        .field("title")
        .child("author", SceneTransformer::new(Author))
        .child("editor", SceneTransformer::new(Author));

    let output = simple(structure).transform(post.into_input()).unwrap();
    assert_eq!(
        output,
        json!({"title": "Notes", "author": {"display": "Ada Lovelace", "initials": "AL"}, "editor": null})
    );
}

#[test]
fn test_transform_object_post_hook() {
    struct Counts;

    impl Scene for Counts {
        fn structure(&self) -> Structure {
            Structure::from_fields(["id"])
        }

        fn transform_object(&self, mut transformed: Value, original: &Input) -> Result<Value> {
            let fields = original.to_value().as_object().map(|map| map.len()).unwrap_or_default();
            if let Some(map) = transformed.as_object_mut() {
                map.insert("field_count".to_string(), json!(fields));
            }
            Ok(transformed)
        }
    }

    let output = SceneTransformer::new(Counts)
        .transform(Input::from(json!({"id": 1, "a": 2})))
        .unwrap();
    assert_eq!(output, json!({"id": 1, "field_count": 2}));
}

#[test]
fn test_structure_resolved_once() {
    struct Counting(Arc<AtomicUsize>);

    impl Scene for Counting {
        fn structure(&self) -> Structure {
            self.0.fetch_add(1, Ordering::SeqCst);
            Structure::from_fields(["id"])
        }
    }

    let calls = Arc::new(AtomicUsize::new(0));
    let transformer = SceneTransformer::new(Counting(calls.clone()));

    transformer.transform(Input::from(persons_array())).unwrap();
    transformer.transform(Input::from(persons_array())).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[derive(Debug)]
struct Greeting(String);

struct Injected {
    greeting: Mutex<Option<Arc<Greeting>>>,
    calls: AtomicUsize,
}

impl Scene for Injected {
    fn structure(&self) -> Structure {
        Structure::from_fields(["id"])
    }

    fn inject(&self, services: &Services) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let greeting = services.require::<Greeting>()?;
        if let Ok(mut slot) = self.greeting.lock() {
            *slot = Some(greeting);
        }
        Ok(())
    }

    fn transform_object(&self, mut transformed: Value, _original: &Input) -> Result<Value> {
        let greeting = self
            .greeting
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|g| g.0.clone()));
        if let Some(map) = transformed.as_object_mut() {
            map.insert("greeting".to_string(), json!(greeting));
        }
        Ok(transformed)
    }
}

fn injected() -> Injected {
    Injected {
        greeting: Mutex::new(None),
        calls: AtomicUsize::new(0),
    }
}

#[test]
fn test_inject_runs_once_per_transform() {
    let services = Arc::new(Services::new().with(Greeting("hello".to_string())));
    let transformer = SceneTransformer::new(injected()).with_services(services);

    let output = transformer.transform(Input::from(persons_array())).unwrap();
    assert_eq!(
        output,
        json!([{"id": 1, "greeting": "hello"}, {"id": 2, "greeting": "hello"}])
    );
    assert_eq!(transformer.scene().calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_inject_missing_service() {
    let err = SceneTransformer::new(injected())
        .transform(Input::from(persons_array()))
        .unwrap_err();
    assert!(matches!(err, Error::MissingService { .. }));
    assert!(err.to_string().contains("Greeting"));
}

struct Preloading {
    spec: PreloadSpec,
    structure: Structure,
}

impl Scene for Preloading {
    fn structure(&self) -> Structure {
        self.structure.clone()
    }

    fn preloads(&self, _variant: Variant) -> PreloadSpec {
        self.spec.clone()
    }
}

fn preloading(spec: PreloadSpec) -> SceneTransformer<Preloading> {
    SceneTransformer::new(Preloading {
        spec,
        structure: Structure::from_fields(["id"]),
    })
}

#[test]
fn test_not_preloaded_for_plain_data() {
    let output = preloading(PreloadSpec::from_names(["test"]))
        .transform(Input::from(persons_array()))
        .unwrap();
    assert_eq!(output, json!([{"id": 1}, {"id": 2}]));
}

#[test]
fn test_preload_relations_loaded() {
    let mut people = ModelSet::new(person_models());
    let output = preloading(PreloadSpec::from_names(["test"]))
        .transform_loadable(&mut people)
        .unwrap();

    assert_eq!(output, json!([{"id": 1}, {"id": 2}]));
    assert_eq!(people.load_requests(), &[vec!["test".to_string()]]);
}

#[test]
fn test_preload_conditional() {
    let spec = PreloadSpec::new().when("wrong", false).when("one", true).always("two");
    let mut people = ModelSet::new(person_models());
    preloading(spec).transform_loadable(&mut people).unwrap();

    assert_eq!(people.load_requests(), &[vec!["one".to_string(), "two".to_string()]]);
}

#[test]
fn test_preload_related_transformer_relations() {
    let child = SceneTransformer::new(Preloading {
        spec: PreloadSpec::from_names(["child"]),
        structure: Structure::new(),
    });
    let parent = SceneTransformer::new(Preloading {
        spec: PreloadSpec::new().related("key"),
        structure: Structure::new(),
    })
    .with_structure(Structure::new().child("key", child));

    assert_eq!(parent.plan_preloads(), vec!["key.child"]);

    let mut people = ModelSet::new(person_models());
    let output = parent.transform_loadable(&mut people).unwrap();
    assert_eq!(output, json!([{"key": null}, {"key": null}]));
    assert_eq!(people.load_requests(), &[vec!["key.child".to_string()]]);
}

#[test]
fn test_already_loaded_relations_are_skipped() {
    let mut people = ModelSet::new(person_models());
    preloading(PreloadSpec::from_names(["status", "team"]))
        .transform_loadable(&mut people)
        .unwrap();
    assert_eq!(people.load_requests(), &[vec!["team".to_string()]]);

    let mut people = ModelSet::new(person_models());
    preloading(PreloadSpec::from_names(["status"]))
        .transform_loadable(&mut people)
        .unwrap();
    assert!(people.load_requests().is_empty());
}

#[test]
fn test_preloads_depend_on_variant() {
    struct Audited;

    impl Scene for Audited {
        fn structure(&self) -> Structure {
            Structure::from_fields(["id", "created_by"])
        }

        fn min_structure(&self) -> Structure {
            Structure::from_fields(["id"])
        }

        fn preloads(&self, variant: Variant) -> PreloadSpec {
            PreloadSpec::new().when("created_by", variant != Variant::Minimal)
        }
    }

    assert_eq!(SceneTransformer::new(Audited).plan_preloads(), vec!["created_by"]);
    assert!(SceneTransformer::minimal(Audited).plan_preloads().is_empty());
}

#[test]
fn test_loader_runs_before_transform() {
    let mut people = ModelSet::new(person_models()).with_fetcher(|model, relation| {
        model.set_relation(relation, Model::new(json!({"name": "Core"})).into_input());
        Ok(())
    });

    let transformer = SceneTransformer::new(Preloading {
        spec: PreloadSpec::from_names(["team"]),
        structure: Structure::new().field("id").nested("team", Structure::from_fields(["name"])),
    });

    let output = transformer.transform_loadable(&mut people).unwrap();
    assert_eq!(
        output,
        json!([{"id": 1, "team": {"name": "Core"}}, {"id": 2, "team": {"name": "Core"}}])
    );
    assert!(people.is_relation_loaded("team"));
}

#[test]
fn test_child_relations_load_through_parent_plan() {
    let child = SceneTransformer::new(Preloading {
        spec: PreloadSpec::from_names(["lead"]),
        structure: Structure::new().field("name").nested("lead", Structure::from_fields(["id"])),
    });
    let parent = SceneTransformer::new(Preloading {
        spec: PreloadSpec::new().related("team"),
        structure: Structure::new(),
    })
    .with_structure(Structure::new().field("id").child("team", child));

    let mut people = ModelSet::new(person_models()).with_fetcher(|model, relation| {
        if relation == "team.lead" {
            let team = Model::new(json!({"name": "Core"}))
                .with_relation("lead", Model::new(json!({"id": 9})).into_input());
            model.set_relation("team", team.into_input());
        }
        Ok(())
    });

    // plain transform leaves the loader alone
    let unloaded = parent.transform(people.to_input()).unwrap();
    assert_eq!(unloaded, json!([{"id": 1, "team": null}, {"id": 2, "team": null}]));
    assert!(people.load_requests().is_empty());

    let output = parent.transform_loadable(&mut people).unwrap();
    assert_eq!(people.load_requests(), &[vec!["team.lead".to_string()]]);
    assert_eq!(
        output,
        json!([
            {"id": 1, "team": {"name": "Core", "lead": {"id": 9}}},
            {"id": 2, "team": {"name": "Core", "lead": {"id": 9}}},
        ])
    );
}
