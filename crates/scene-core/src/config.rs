//! Declarative scene catalogs
//!
//! Scenes can be declared in YAML or JSON instead of code. A catalog document
//! holds named scene definitions; each definition carries its structure trees,
//! preloads, ordering and null state:
//!
//! ```yaml
//! scenes:
//!   person:
//!     structure:
//!       id: true
//!       display_name: name
//!       team: { __scene: team, variant: minimal }
//!       joined: { __transform: date_format, format: "%Y-%m-%d" }
//!     min_structure: [id, name]
//!     preload: { team: __related }
//!     order_by: [id, desc]
//!   team:
//!     structure: [id, name]
//! ```
//!
//! Structure trees use this syntax:
//!
//! - array entries: `"name"` copies a field, `"__all"` passes the object through
//! - object entries, by value:
//!   - string: rename (`"__all"` passes through)
//!   - `true`: copy, `false`/`null`: remove
//!   - `{"__scene": name, "variant": ...}`: child scene transformer
//!   - `{"__transform": kind, ...}`: value transformer (`date_format`, `map`, `map_key_value`)
//!   - `[source, transformer]`: apply a scene or value transformer to `source`
//!   - object with `"__flat"`: subtree evaluated against the same object
//!   - any other object or array: nested subtree
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use crate::error::{describe_json, Error};
use crate::input::is_blank_value;
use crate::structure::{Structure, StructureNode, PASSTHROUGH};
use crate::transformer::built_in::{DateFormat, MapKeyValue, MapLookup, DEFAULT_DATE_FORMAT};
use crate::transformer::{
    AnyTransformer, OrderBy, PreloadSpec, Scene, SceneTransformer, StructureTransformer, ValueTransformer,
    Variant, PRELOAD_RELATED,
};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

const SCENE_KEY: &str = "__scene";
const TRANSFORM_KEY: &str = "__transform";
const FLAT_KEY: &str = "__flat";

/// Top-level catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub scenes: BTreeMap<String, SceneConfig>,
}

/// One scene definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub structure: Value,
    pub min_structure: Option<Value>,
    pub download_structure: Option<Value>,
    pub preload: Value,
    pub order_by: Option<Value>,
    pub null_state: Value,
    /// Keys this version does not understand; ignored with a warning
    #[serde(flatten, skip_serializing)]
    pub unknown: BTreeMap<String, Value>,
}

/// Scene built from a [`SceneConfig`] for one structure variant.
///
/// Only the structure tree of that variant is parsed, so a scene may mount
/// other variants of itself.
#[derive(Debug, Clone)]
pub struct ConfiguredScene {
    name: String,
    variant: Variant,
    structure: Structure,
    preload: PreloadSpec,
    order_by: Option<OrderBy>,
    null_state: Value,
}

impl ConfiguredScene {
    /// Variant whose structure this scene carries
    pub fn variant(&self) -> Variant {
        self.variant
    }
}

impl Scene for ConfiguredScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn structure(&self) -> Structure {
        self.structure.clone()
    }

    fn preloads(&self, _variant: Variant) -> PreloadSpec {
        self.preload.clone()
    }

    fn order_by(&self) -> Option<OrderBy> {
        self.order_by.clone()
    }

    fn null_state(&self) -> Value {
        self.null_state.clone()
    }
}

/// Transformer produced by a catalog
pub type CatalogTransformer = SceneTransformer<ConfiguredScene>;

/// Named scenes loaded from a document, with transformers built for every variant
#[derive(Debug, Default)]
pub struct SceneCatalog {
    configs: BTreeMap<String, SceneConfig>,
    transformers: HashMap<(String, Variant), Arc<CatalogTransformer>>,
}

impl SceneCatalog {
    /// Load a catalog file; `.yaml`/`.yml` files are read as YAML, anything else as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            message: format!("Failed to read scene catalog from {:?}", path),
            source: e,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s == "yaml" || s == "yml")
            .unwrap_or(false);

        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: CatalogDocument = serde_yaml::from_str(content).map_err(|e| Error::Yaml {
            message: format!("Failed to parse scene catalog: {}", e),
            source: e,
        })?;
        Self::from_document(document)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let document: CatalogDocument = serde_json::from_str(content).map_err(|e| Error::Json {
            message: format!("Failed to parse scene catalog: {}", e),
            source: e,
        })?;
        Self::from_document(document)
    }

    /// Build every scene of `document` in every variant
    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let configs = document.scenes;

        let transformers = {
            let mut builder = Builder::new(&configs);
            for (name, config) in &configs {
                for key in config.unknown.keys() {
                    log::warn!("Ignoring unknown key '{}' in scene '{}'", key, name);
                }
                for variant in [Variant::Standard, Variant::Minimal, Variant::Download] {
                    builder.transformer(name, variant)?;
                }
            }
            builder.transformers
        };

        tracing::debug!(scenes = configs.len(), "loaded scene catalog");

        Ok(Self { configs, transformers })
    }

    /// Standard transformer of scene `name`
    pub fn transformer(&self, name: &str) -> Result<Arc<CatalogTransformer>> {
        self.transformer_for(name, Variant::Standard)
    }

    pub fn transformer_for(&self, name: &str, variant: Variant) -> Result<Arc<CatalogTransformer>> {
        self.transformers
            .get(&(name.to_string(), variant))
            .cloned()
            .ok_or_else(|| Error::configuration(format!("Unknown scene '{}'", name)))
    }

    pub fn config(&self, name: &str) -> Option<&SceneConfig> {
        self.configs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    /// Scene names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

/// Parse a structure tree that does not reference other scenes
pub fn parse_structure(value: &Value) -> Result<Structure> {
    let configs = BTreeMap::new();
    Builder::new(&configs).structure(value, "structure")
}

/// Parse a value transformer declaration such as `{"__transform": "map", "map": {...}}`
pub fn parse_value_transformer(spec: &Map<String, Value>) -> Result<Arc<dyn ValueTransformer>> {
    let kind = match spec.get(TRANSFORM_KEY) {
        Some(Value::String(kind)) => kind.as_str(),
        Some(other) => {
            return Err(Error::configuration(format!(
                "Transformer kind must be a string, found {}",
                describe_json(other)
            )))
        }
        None => return Err(Error::configuration("Missing transformer kind")),
    };
    let default = spec.get("default").cloned().unwrap_or(Value::Null);

    let transformer: Arc<dyn ValueTransformer> = match kind {
        "date_format" => {
            let format = match spec.get("format") {
                None | Some(Value::Null) => DEFAULT_DATE_FORMAT,
                Some(Value::String(format)) => format.as_str(),
                Some(other) => {
                    return Err(Error::configuration(format!(
                        "date_format format must be a string, found {}",
                        describe_json(other)
                    )))
                }
            };
            Arc::new(DateFormat::new(format).with_default(default))
        }
        "map" => Arc::new(MapLookup::new(mapping_table(spec, kind)?).with_default(default)),
        "map_key_value" => Arc::new(MapKeyValue::new(mapping_table(spec, kind)?).with_default(default)),
        other => return Err(Error::configuration(format!("Unknown value transformer '{}'", other))),
    };

    Ok(transformer)
}

fn mapping_table(spec: &Map<String, Value>, kind: &str) -> Result<Map<String, Value>> {
    match spec.get("map") {
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(other) => Err(Error::configuration(format!(
            "{} transformer needs an object 'map', found {}",
            kind,
            describe_json(other)
        ))),
        None => Err(Error::configuration(format!("{} transformer needs a 'map'", kind))),
    }
}

/// Parse a preload declaration: a list of names, or a map of name to flag
pub fn parse_preloads(value: &Value) -> Result<PreloadSpec> {
    match value {
        Value::Null => Ok(PreloadSpec::new()),
        Value::Array(names) => names.iter().try_fold(PreloadSpec::new(), |spec, name| match name {
            Value::String(name) => Ok(spec.always(name.as_str())),
            other => Err(Error::invalid_key(other, "preload list")),
        }),
        Value::Object(map) => Ok(map.iter().fold(PreloadSpec::new(), |spec, (relation, flag)| match flag {
            Value::String(marker) if marker == PRELOAD_RELATED => spec.related(relation.as_str()),
            flag => spec.when(relation.as_str(), !is_blank_value(flag)),
        })),
        other => Err(Error::configuration(format!(
            "preload must be a list or a map, found {}",
            describe_json(other)
        ))),
    }
}

/// Parse `"field"` or `["field", "desc"]`
pub fn parse_order_by(value: &Value) -> Result<Option<OrderBy>> {
    match value {
        Value::Null => Ok(None),
        Value::String(field) => Ok(Some(OrderBy::asc(field.as_str()))),
        Value::Array(parts) => match parts.as_slice() {
            [Value::String(field)] => Ok(Some(OrderBy::asc(field.as_str()))),
            [Value::String(field), Value::String(direction)] => Ok(Some(OrderBy::new(field.as_str(), direction))),
            _ => Err(Error::configuration(format!(
                "order_by must be [field] or [field, direction], found {}",
                describe_json(value)
            ))),
        },
        other => Err(Error::configuration(format!(
            "order_by must be a string or a list, found {}",
            describe_json(other)
        ))),
    }
}

/// Builds transformers on demand, following child scene references
struct Builder<'a> {
    configs: &'a BTreeMap<String, SceneConfig>,
    transformers: HashMap<(String, Variant), Arc<CatalogTransformer>>,
    stack: Vec<(String, Variant)>,
}

impl<'a> Builder<'a> {
    fn new(configs: &'a BTreeMap<String, SceneConfig>) -> Self {
        Self {
            configs,
            transformers: HashMap::new(),
            stack: Vec::new(),
        }
    }

    fn transformer(&mut self, name: &str, variant: Variant) -> Result<Arc<CatalogTransformer>> {
        let key = (name.to_string(), variant);
        if let Some(transformer) = self.transformers.get(&key) {
            return Ok(transformer.clone());
        }

        if self.stack.contains(&key) {
            let path: Vec<String> = self
                .stack
                .iter()
                .chain(std::iter::once(&key))
                .map(|(name, variant)| format!("{} ({})", name, variant))
                .collect();
            return Err(Error::configuration(format!(
                "Scene reference cycle: {}",
                path.join(" -> ")
            )));
        }

        let configs = self.configs;
        let config = configs
            .get(name)
            .ok_or_else(|| Error::configuration(format!("Unknown scene '{}'", name)))?;

        self.stack.push(key.clone());
        let built = self.build(name, variant, config);
        self.stack.pop();

        let transformer = Arc::new(SceneTransformer::with_variant(built?, variant));
        self.transformers.insert(key, transformer.clone());
        Ok(transformer)
    }

    fn build(&mut self, name: &str, variant: Variant, config: &SceneConfig) -> Result<ConfiguredScene> {
        let source = match variant {
            Variant::Standard => &config.structure,
            Variant::Minimal => config.min_structure.as_ref().unwrap_or(&config.structure),
            Variant::Download => config.download_structure.as_ref().unwrap_or(&config.structure),
        };
        let structure = self.structure(source, name)?;
        let order_by = match &config.order_by {
            Some(value) => parse_order_by(value)?,
            None => None,
        };

        Ok(ConfiguredScene {
            name: name.to_string(),
            variant,
            structure,
            preload: parse_preloads(&config.preload)?,
            order_by,
            null_state: config.null_state.clone(),
        })
    }

    fn structure(&mut self, value: &Value, context: &str) -> Result<Structure> {
        match value {
            Value::Null => Ok(Structure::new()),
            Value::Array(entries) => {
                let mut structure = Structure::new();
                for (position, entry) in entries.iter().enumerate() {
                    match entry {
                        Value::String(field) => structure = structure.field(field.as_str()),
                        other => {
                            return Err(Error::invalid_key(
                                other,
                                format!("entry {} of {}", position, context),
                            ))
                        }
                    }
                }
                Ok(structure)
            }
            Value::Object(entries) => {
                let mut structure = Structure::new();
                for (key, entry) in entries {
                    let node = if key == PASSTHROUGH {
                        StructureNode::Passthrough
                    } else {
                        self.node(key, entry, context)?
                    };
                    structure.push(key.as_str(), node);
                }
                Ok(structure)
            }
            other => Err(Error::configuration(format!(
                "{} must be a list or a map, found {}",
                context,
                describe_json(other)
            ))),
        }
    }

    fn node(&mut self, key: &str, entry: &Value, context: &str) -> Result<StructureNode> {
        let context = format!("{}.{}", context, key);

        let node = match entry {
            Value::String(source) => StructureNode::from(source.as_str()),
            Value::Bool(true) => StructureNode::PlainField,
            Value::Bool(false) | Value::Null => StructureNode::Remove,
            Value::Number(_) => return Err(Error::invalid_key(entry, context)),
            Value::Object(spec) if spec.contains_key(SCENE_KEY) => {
                StructureNode::ChildTransformer(self.child_scene(spec, &context)?)
            }
            Value::Object(spec) if spec.contains_key(TRANSFORM_KEY) => {
                StructureNode::ValueTransformerNode(parse_value_transformer(spec)?)
            }
            Value::Object(spec) if spec.contains_key(FLAT_KEY) => {
                let mut subtree = spec.clone();
                subtree.remove(FLAT_KEY);
                StructureNode::FlatSubtree(self.structure(&Value::Object(subtree), &context)?)
            }
            Value::Array(pair) if is_keyed_pair(pair) => {
                let source = match &pair[0] {
                    Value::String(source) => source.clone(),
                    other => return Err(Error::invalid_key(other, format!("source of {}", context))),
                };
                let transformer = match &pair[1] {
                    Value::Object(spec) if spec.contains_key(SCENE_KEY) => {
                        AnyTransformer::Structure(self.child_scene(spec, &context)?)
                    }
                    Value::Object(spec) => AnyTransformer::Value(parse_value_transformer(spec)?),
                    other => {
                        return Err(Error::configuration(format!(
                            "Expected a transformer declaration in {}, found {}",
                            context,
                            describe_json(other)
                        )))
                    }
                };
                StructureNode::KeyedTransformer { source, transformer }
            }
            Value::Object(_) | Value::Array(_) => StructureNode::NestedSubtree(self.structure(entry, &context)?),
        };

        Ok(node)
    }

    fn child_scene(&mut self, spec: &Map<String, Value>, context: &str) -> Result<Arc<dyn StructureTransformer>> {
        let name = match spec.get(SCENE_KEY) {
            Some(Value::String(name)) => name.as_str(),
            Some(other) => return Err(Error::invalid_key(other, format!("scene reference in {}", context))),
            None => return Err(Error::configuration(format!("Missing scene name in {}", context))),
        };
        let variant = match spec.get("variant") {
            None | Some(Value::Null) => Variant::Standard,
            Some(Value::String(variant)) => variant.parse()?,
            Some(other) => {
                return Err(Error::configuration(format!(
                    "Scene variant in {} must be a string, found {}",
                    context,
                    describe_json(other)
                )))
            }
        };

        let transformer: Arc<dyn StructureTransformer> = self.transformer(name, variant)?;
        Ok(transformer)
    }
}

fn is_keyed_pair(pair: &[Value]) -> bool {
    pair.len() == 2
        && matches!(&pair[1], Value::Object(spec) if spec.contains_key(SCENE_KEY) || spec.contains_key(TRANSFORM_KEY))
}
