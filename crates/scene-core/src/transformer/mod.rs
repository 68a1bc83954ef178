//! Structure-driven transformation engine
//!
//! This module turns records into JSON-ready values by walking a declarative
//! [`Structure`](crate::Structure) against each record.
//!
//! # Module Organization
//!
//! - [`types`] - Transformer traits, structure variants and ordering rules
//! - [`scene`] - The [`Scene`] description and the memoizing [`SceneTransformer`]
//! - [`resolver`] - Getter table and the field value fallback chain
//! - [`preload`] - Relation preload declarations and planning
//! - [`pipeline`] - Collection handling, hooks and ordering
//! - [`built_in`] - Ready-made value transformers
//! - `engine` - The recursive structure walk
//!
//! # Examples
//!
//! ```
//! use scene_core::{built_in, Input, Scene, SceneTransformer, Structure, Transformer};
//! use serde_json::json;
//!
//! struct OrderScene;
//!
//! impl Scene for OrderScene {
//!     fn structure(&self) -> Structure {
//!         Structure::new()
//!             .field("id")
//!             .rename("placed", "created_at")
//!             .value("status", built_in::map_lookup(
//!                 json!({"p": "pending", "s": "shipped"}).as_object().cloned().unwrap_or_default(),
//!             ))
//!     }
//! }
//!
//! let order = json!({"id": 10, "created_at": "2024-01-01", "status": "s"});
//! let output = SceneTransformer::new(OrderScene).transform(Input::from(order)).unwrap();
//! assert_eq!(output, json!({"id": 10, "placed": "2024-01-01", "status": "shipped"}));
//! ```
//!
//! Copyright (c) 2025 Scene Team
//! Licensed under the Apache-2.0 license

pub mod built_in;
mod engine;
pub mod pipeline;
pub mod preload;
pub mod resolver;
pub mod scene;
pub mod types;

#[cfg(test)]
mod tests;

pub use pipeline::{compare_values, sort_by_field};
pub use preload::{plan, Preload, PreloadSpec, PRELOAD_RELATED};
pub use resolver::{Getter, Getters};
pub use scene::{Scene, SceneTransformer};
pub use types::{AnyTransformer, Direction, OrderBy, StructureTransformer, Transformer, ValueTransformer, Variant};
