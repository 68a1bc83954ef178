//! Fuzzing target for dotted path lookup
//!
//! Arbitrary paths are looked up on fixed documents and on a document parsed
//! from the rest of the input. Lookup must never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use scene_core::{Input, Path};
use serde_json::{json, Value};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let split_point = (data[0] as usize) % data.len();
    let (path_bytes, doc_bytes) = data.split_at(split_point);

    let path_str = String::from_utf8_lossy(path_bytes);
    let path = Path::parse(&path_str);

    let docs = vec![
        json!(null),
        json!([]),
        json!({}),
        json!([1, 2, 3]),
        json!({"0": "a", "1": "b"}),
        json!({"nested": {"deep": [{"value": 42}]}}),
        json!([[[[[]]]]]),
    ];

    for doc in &docs {
        let _ = path.lookup(doc);
        let _ = path.lookup_input(&Input::from(doc.clone()));
    }

    if let Ok(json_str) = std::str::from_utf8(doc_bytes) {
        if let Ok(doc) = serde_json::from_str::<Value>(json_str) {
            let _ = scene_core::path_get(&doc, &path_str, Value::Null);
        }
    }
});
