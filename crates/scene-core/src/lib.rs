//! Scene Core - Declarative structure transformations
//!
//! This crate shapes records into JSON-ready values. A transformer is
//! described once as a structure tree (which fields to copy, rename, nest or
//! transform), and then applied to single records or whole collections.
//!
//! # Main Components
//!
//! - **Structures**: Ordered trees of output keys built with a fluent API or parsed from JSON/YAML
//! - **Transformers**: The [`Scene`] description and the memoizing [`SceneTransformer`]
//! - **Records**: Plain JSON, or [`Record`]s exposing relations and computed accessors
//! - **Relation Preloading**: Plans and requests missing relations before transforming
//! - **Catalogs**: Scenes declared in configuration files
//! - **Responses**: `data`/`pagination` envelopes for API output
//!
//! # Example
//!
//! ```
//! use scene_core::{Input, Result, Scene, SceneTransformer, Structure, Transformer};
//! use serde_json::json;
//!
//! struct PersonScene;
//!
//! impl Scene for PersonScene {
//!     fn structure(&self) -> Structure {
//!         Structure::new().field("id").rename("display_name", "name")
//!     }
//! }
//!
//! fn example() -> Result<()> {
//!     let transformer = SceneTransformer::new(PersonScene);
//!     let output = transformer.transform(Input::from(json!([
//!         {"id": 1, "name": "Ada", "email": "ada@example.com"}
//!     ])))?;
//!
//!     assert_eq!(output, json!([{"id": 1, "display_name": "Ada"}]));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod inject;
pub mod input;
pub mod path;
pub mod record;
pub mod response;
pub mod structure;
pub mod transformer;

// Re-export main types for convenience
pub use config::{CatalogTransformer, ConfiguredScene, SceneCatalog, SceneConfig};
pub use error::{Error, Result};
pub use inject::Services;
pub use input::{is_blank_value, is_sequential, Input};
pub use path::{path_get, Lookup, Path};
pub use record::{Loadable, Model, ModelSet, Record};
pub use response::{respond, Extra, Paginated, Pagination};
pub use structure::{Structure, StructureNode, PASSTHROUGH};
pub use transformer::built_in;
pub use transformer::{
    compare_values, sort_by_field, AnyTransformer, Direction, Getter, Getters, OrderBy, Preload, PreloadSpec, Scene, SceneTransformer,
    StructureTransformer, Transformer, ValueTransformer, Variant, PRELOAD_RELATED,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
