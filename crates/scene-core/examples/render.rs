// Render a JSON data file through a scene from a catalog file
// Usage: cargo run --example render <catalog.yaml> <scene> <data.json> [standard|minimal|download]
// Example: cargo run --example render tests/fixtures/blog.yaml post posts.json minimal

use scene_core::{respond, Input, SceneCatalog, Transformer, Variant};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <catalog> <scene> <data.json> [variant]", args[0]);
        std::process::exit(2);
    }

    let catalog = SceneCatalog::from_file(&args[1])?;
    let variant: Variant = args.get(4).map(|s| s.parse()).transpose()?.unwrap_or_default();
    let transformer = catalog.transformer_for(&args[2], variant)?;

    let data: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&args[3])?)?;
    let body = respond(Input::from(data), Some(transformer.as_ref() as &dyn Transformer), Vec::new())?;

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
