//! Fuzzing target for structure declarations
//!
//! Any JSON document either parses into a structure or returns an error; a
//! parsed structure is then applied to the same document.

#![no_main]

use libfuzzer_sys::fuzz_target;
use scene_core::{Input, Scene, SceneCatalog, SceneTransformer, Structure, Transformer};
use serde_json::Value;

struct Fuzzed;

impl Scene for Fuzzed {
    fn structure(&self) -> Structure {
        Structure::new()
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(json_str) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(doc) = serde_json::from_str::<Value>(json_str) else {
        return;
    };

    let _ = SceneCatalog::from_json_str(json_str);

    if let Ok(structure) = Structure::from_json(&doc) {
        let transformer = SceneTransformer::new(Fuzzed).with_structure(structure);
        let _ = transformer.transform(Input::from(doc));
    }
});
