//! Records and relation loading
//!
//! A [`Record`] is anything a transformer can read fields from beyond plain
//! JSON: it exposes attributes, loaded relations and computed accessors. A
//! [`Loadable`] is a record or record set whose relations may not be populated
//! yet; the transformer asks it to load what the structure needs before
//! transforming.
//!
//! The storage layer behind relation loading is not part of this crate.
//! [`Model`] and [`ModelSet`] are in-memory implementations that are handy for
//! fixtures, tests and data that was fetched elsewhere.
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use crate::input::Input;
use crate::Result;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A record that exposes attributes, relations and computed accessors
pub trait Record: Send + Sync + fmt::Debug {
    /// Attribute or loaded relation by name
    fn get(&self, key: &str) -> Option<Input>;

    /// Serialized view: attributes plus loaded relations
    fn to_value(&self) -> Value;

    /// Computed property defined by the record type
    fn accessor(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Whether the named relation has been populated
    fn relation_loaded(&self, relation: &str) -> bool {
        self.get(relation).is_some()
    }
}

/// A record or record set whose relations can be loaded on demand
pub trait Loadable: fmt::Debug {
    /// The records held, in order
    fn records(&self) -> Vec<Arc<dyn Record>>;

    /// Load every listed relation that is not loaded yet.
    ///
    /// Must be idempotent; callers pass a non-empty, deduplicated list.
    fn load_missing(&mut self, relations: &[String]) -> Result<()>;

    /// Hand the (possibly freshly loaded) data to the transformer
    fn to_input(&self) -> Input;

    /// Whether `relation` (dotted paths allowed) is loaded on every record
    fn is_relation_loaded(&self, relation: &str) -> bool {
        relation_loaded_on(&self.records(), relation)
    }
}

/// Check a possibly nested relation path against a set of records.
///
/// An empty set counts as loaded since there is nothing to load.
pub fn relation_loaded_on(records: &[Arc<dyn Record>], relation: &str) -> bool {
    let (first, rest) = match relation.split_once('.') {
        Some((first, rest)) => (first, Some(rest)),
        None => (relation, None),
    };

    if !records.iter().all(|record| record.relation_loaded(first)) {
        return false;
    }

    match rest {
        Some(rest) => records.iter().all(|record| {
            let related = record.get(first).map(related_records).unwrap_or_default();
            relation_loaded_on(&related, rest)
        }),
        None => true,
    }
}

fn related_records(input: Input) -> Vec<Arc<dyn Record>> {
    match input {
        Input::Record(record) => vec![record],
        Input::List(items) => items.into_iter().flat_map(related_records).collect(),
        Input::Value(_) => Vec::new(),
    }
}

/// Computed accessor attached to a [`Model`]
pub type Accessor = Arc<dyn Fn(&Model) -> Value + Send + Sync>;

/// In-memory record with attributes, relations and accessors
#[derive(Clone, Default)]
pub struct Model {
    attributes: Map<String, Value>,
    relations: Vec<(String, Input)>,
    accessors: HashMap<String, Accessor>,
}

impl Model {
    /// Create a model from a JSON object of attributes.
    ///
    /// Non-object values produce a model without attributes.
    pub fn new(attributes: Value) -> Self {
        let attributes = match attributes {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            attributes,
            relations: Vec::new(),
            accessors: HashMap::new(),
        }
    }

    /// Attach a loaded relation
    pub fn with_relation(mut self, name: impl Into<String>, related: impl Into<Input>) -> Self {
        self.set_relation(name, related);
        self
    }

    /// Attach a computed accessor
    pub fn with_accessor<F>(mut self, name: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&Model) -> Value + Send + Sync + 'static,
    {
        self.accessors.insert(name.into(), Arc::new(accessor));
        self
    }

    /// Set or replace a loaded relation
    pub fn set_relation(&mut self, name: impl Into<String>, related: impl Into<Input>) {
        let name = name.into();
        let related = related.into();
        match self.relations.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = related,
            None => self.relations.push((name, related)),
        }
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.iter().any(|(existing, _)| existing == name)
    }

    /// Wrap the model for use as transformer input
    pub fn into_input(self) -> Input {
        Input::record(self)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relations: Vec<&str> = self.relations.iter().map(|(name, _)| name.as_str()).collect();
        let mut accessors: Vec<&str> = self.accessors.keys().map(String::as_str).collect();
        accessors.sort_unstable();

        f.debug_struct("Model")
            .field("attributes", &self.attributes)
            .field("relations", &relations)
            .field("accessors", &accessors)
            .finish()
    }
}

impl Record for Model {
    fn get(&self, key: &str) -> Option<Input> {
        if let Some(value) = self.attributes.get(key) {
            return Some(Input::Value(value.clone()));
        }

        self.relations
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, related)| related.clone())
    }

    fn to_value(&self) -> Value {
        let mut out = self.attributes.clone();
        for (name, related) in &self.relations {
            out.insert(name.clone(), related.to_value());
        }
        Value::Object(out)
    }

    fn accessor(&self, name: &str) -> Option<Value> {
        self.accessors.get(name).map(|accessor| accessor(self))
    }

    fn relation_loaded(&self, relation: &str) -> bool {
        self.has_relation(relation)
    }
}

/// Callback that populates one relation on one model
pub type RelationFetcher = Box<dyn FnMut(&mut Model, &str) -> Result<()> + Send>;

/// In-memory set of models that can load relations through a fetch callback
pub struct ModelSet {
    models: Vec<Arc<Model>>,
    single: bool,
    fetcher: Option<RelationFetcher>,
    requests: Vec<Vec<String>>,
}

impl ModelSet {
    /// A collection of models
    pub fn new(models: Vec<Model>) -> Self {
        Self {
            models: models.into_iter().map(Arc::new).collect(),
            single: false,
            fetcher: None,
            requests: Vec::new(),
        }
    }

    /// A single loadable model, transformed as a single value
    pub fn one(model: Model) -> Self {
        Self {
            single: true,
            ..Self::new(vec![model])
        }
    }

    /// Use `fetcher` to populate relations requested by `load_missing`
    pub fn with_fetcher<F>(mut self, fetcher: F) -> Self
    where
        F: FnMut(&mut Model, &str) -> Result<()> + Send + 'static,
    {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Every relation list passed to `load_missing`, in call order
    pub fn load_requests(&self) -> &[Vec<String>] {
        &self.requests
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter().map(Arc::as_ref)
    }
}

impl fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSet")
            .field("models", &self.models)
            .field("single", &self.single)
            .field("requests", &self.requests)
            .finish()
    }
}

impl Loadable for ModelSet {
    fn records(&self) -> Vec<Arc<dyn Record>> {
        self.models
            .iter()
            .map(|model| Arc::clone(model) as Arc<dyn Record>)
            .collect()
    }

    fn load_missing(&mut self, relations: &[String]) -> Result<()> {
        self.requests.push(relations.to_vec());

        let Some(fetcher) = self.fetcher.as_mut() else {
            return Ok(());
        };

        for relation in relations {
            for model in &mut self.models {
                if !relation.contains('.') && model.has_relation(relation) {
                    continue;
                }
                fetcher(Arc::make_mut(model), relation.as_str())?;
            }
        }

        Ok(())
    }

    fn to_input(&self) -> Input {
        if self.single {
            if let Some(model) = self.models.first() {
                return Input::Record(Arc::clone(model) as Arc<dyn Record>);
            }
            return Input::null();
        }

        Input::List(
            self.models
                .iter()
                .map(|model| Input::Record(Arc::clone(model) as Arc<dyn Record>))
                .collect(),
        )
    }
}
