//! Scenes and the structure-driven transformer
//!
//! A [`Scene`] describes one API-facing representation: its structure trees,
//! getters, preloads, ordering and hooks. Every method has a default except
//! [`Scene::structure`]. A [`SceneTransformer`] wraps a scene together with the
//! variant flags and structure overrides chosen at construction, and memoizes
//! the resolved structure for its lifetime.
//!
//! Relations are loaded only by [`SceneTransformer::transform_loadable`], and
//! only at the top level. The plan it computes already covers nested child
//! scenes through dotted paths such as `author.avatar`, so child transformers
//! read relations that are already in place and never call a loader.
//! [`Transformer::transform`] works on the data as given.
//!
//! ```
//! use scene_core::{Input, Scene, SceneTransformer, Structure, Transformer};
//! use serde_json::json;
//!
//! struct PersonScene;
//!
//! impl Scene for PersonScene {
//!     fn structure(&self) -> Structure {
//!         Structure::from_fields(["id", "name"])
//!     }
//!
//!     fn min_structure(&self) -> Structure {
//!         Structure::from_fields(["id"])
//!     }
//! }
//!
//! let people = json!([{"id": 1, "name": "Ada", "email": "ada@example.com"}]);
//!
//! let full = SceneTransformer::new(PersonScene).transform(Input::from(people.clone())).unwrap();
//! assert_eq!(full, json!([{"id": 1, "name": "Ada"}]));
//!
//! let min = SceneTransformer::minimal(PersonScene).transform(Input::from(people)).unwrap();
//! assert_eq!(min, json!([{"id": 1}]));
//! ```
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

use super::pipeline;
use super::preload::{self, PreloadSpec};
use super::resolver::Getters;
use super::types::{OrderBy, StructureTransformer, Transformer, Variant};
use crate::inject::Services;
use crate::input::Input;
use crate::record::Loadable;
use crate::structure::Structure;
use crate::Result;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// One API-facing representation of a record type
pub trait Scene: Send + Sync {
    /// Name used in diagnostics and log spans
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Standard structure tree
    fn structure(&self) -> Structure;

    /// Structure used by minimal transformers
    fn min_structure(&self) -> Structure {
        self.structure()
    }

    /// Structure used by download transformers
    fn download_structure(&self) -> Structure {
        self.structure()
    }

    /// Per-field getters, consulted before any lookup on the data
    fn getters(&self) -> Getters {
        Getters::new()
    }

    /// Relations to load when transforming loadable records
    fn preloads(&self, _variant: Variant) -> PreloadSpec {
        PreloadSpec::new()
    }

    /// Ordering of transformed collections
    fn order_by(&self) -> Option<OrderBy> {
        None
    }

    /// Output for a null input
    fn null_state(&self) -> Value {
        Value::Null
    }

    /// Pull services needed by the hooks; called once per transform call
    fn inject(&self, _services: &Services) -> Result<()> {
        Ok(())
    }

    /// Replace each single input before it is walked
    fn pre_process_single(&self, input: Input) -> Result<Input> {
        Ok(input)
    }

    /// Replace a whole collection before its elements are transformed.
    ///
    /// Must return a sequence.
    fn pre_process_collection(&self, items: Vec<Input>) -> Result<Input> {
        Ok(Input::List(items))
    }

    /// Final adjustment of each transformed object
    fn transform_object(&self, transformed: Value, _original: &Input) -> Result<Value> {
        Ok(transformed)
    }
}

/// Structure and getters resolved for one transformer
#[derive(Debug)]
pub(crate) struct Resolved {
    pub(crate) structure: Structure,
    pub(crate) getters: Getters,
}

/// Structure transformer driven by a [`Scene`]
pub struct SceneTransformer<S> {
    scene: S,
    show_min: bool,
    use_download_structure: bool,
    structure_override: Option<Structure>,
    min_structure_override: Option<Structure>,
    download_structure_override: Option<Structure>,
    services: Arc<Services>,
    resolved: OnceLock<Resolved>,
}

impl<S: Scene> SceneTransformer<S> {
    /// Standard transformer
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            show_min: false,
            use_download_structure: false,
            structure_override: None,
            min_structure_override: None,
            download_structure_override: None,
            services: Arc::new(Services::new()),
            resolved: OnceLock::new(),
        }
    }

    /// Transformer using the minimal structure
    pub fn minimal(scene: S) -> Self {
        Self {
            show_min: true,
            ..Self::new(scene)
        }
    }

    /// Transformer using the download structure
    pub fn download(scene: S) -> Self {
        Self {
            use_download_structure: true,
            ..Self::new(scene)
        }
    }

    /// Transformer for an explicit variant
    pub fn with_variant(scene: S, variant: Variant) -> Self {
        match variant {
            Variant::Standard => Self::new(scene),
            Variant::Minimal => Self::minimal(scene),
            Variant::Download => Self::download(scene),
        }
    }

    /// Use `structure` instead of [`Scene::structure`]
    pub fn with_structure(mut self, structure: Structure) -> Self {
        self.structure_override = Some(structure);
        self.resolved = OnceLock::new();
        self
    }

    /// Use `structure` instead of [`Scene::min_structure`]
    pub fn with_min_structure(mut self, structure: Structure) -> Self {
        self.min_structure_override = Some(structure);
        self.resolved = OnceLock::new();
        self
    }

    /// Use `structure` instead of [`Scene::download_structure`]
    pub fn with_download_structure(mut self, structure: Structure) -> Self {
        self.download_structure_override = Some(structure);
        self.resolved = OnceLock::new();
        self
    }

    /// Services handed to [`Scene::inject`]
    pub fn with_services(mut self, services: Arc<Services>) -> Self {
        self.services = services;
        self
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Active structure variant
    pub fn variant(&self) -> Variant {
        Variant::from_flags(self.show_min, self.use_download_structure)
    }

    /// The active structure tree, computed once
    pub fn structure(&self) -> &Structure {
        &self.resolve().structure
    }

    pub(crate) fn resolve(&self) -> &Resolved {
        self.resolved.get_or_init(|| {
            let variant = self.variant();
            let structure = match variant {
                Variant::Download => self
                    .download_structure_override
                    .clone()
                    .unwrap_or_else(|| self.scene.download_structure()),
                Variant::Minimal => self
                    .min_structure_override
                    .clone()
                    .unwrap_or_else(|| self.scene.min_structure()),
                Variant::Standard => self
                    .structure_override
                    .clone()
                    .unwrap_or_else(|| self.scene.structure()),
            };

            tracing::debug!(
                scene = self.scene.name(),
                variant = %variant,
                entries = structure.len(),
                "resolved structure"
            );

            Resolved {
                structure,
                getters: self.scene.getters(),
            }
        })
    }

    /// Load the relations this transformer needs, then transform the loaded data.
    ///
    /// This is the only entry point that talks to a relation loader. Relations
    /// of child scenes are requested here as dotted paths.
    pub fn transform_loadable(&self, data: &mut dyn Loadable) -> Result<Value> {
        let span = tracing::debug_span!("transform", scene = self.scene.name());
        let _enter = span.enter();

        self.scene.inject(&self.services)?;

        let to_load: Vec<String> = self
            .plan_preloads()
            .into_iter()
            .filter(|relation| !data.is_relation_loaded(relation))
            .collect();

        if !to_load.is_empty() {
            tracing::debug!(relations = ?to_load, "loading missing relations");
            data.load_missing(&to_load)?;
        }

        pipeline::run(&self.scene, self.resolve(), data.to_input())
    }
}

impl<S: Scene> Transformer for SceneTransformer<S> {
    /// Transform `input` as given; no relations are planned or loaded
    fn transform(&self, input: Input) -> Result<Value> {
        let span = tracing::debug_span!("transform", scene = self.scene.name());
        let _enter = span.enter();

        self.scene.inject(&self.services)?;
        pipeline::run(&self.scene, self.resolve(), input)
    }
}

impl<S: Scene> StructureTransformer for SceneTransformer<S> {
    fn name(&self) -> &str {
        self.scene.name()
    }

    fn plan_preloads(&self) -> Vec<String> {
        let spec = self.scene.preloads(self.variant());
        let planned = preload::plan(&spec, self.structure());

        tracing::debug!(scene = self.scene.name(), preloads = ?planned, "planned preloads");
        planned
    }
}

impl<S: Scene> fmt::Debug for SceneTransformer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneTransformer")
            .field("scene", &self.scene.name())
            .field("variant", &self.variant())
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}
