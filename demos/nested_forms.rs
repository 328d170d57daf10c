//! Nested forms - shape normalization step by step.
//!
//! HTML form encoders submit collections as index-keyed maps. This example
//! walks the normalization pipeline on its own, without a dispatcher:
//! - `normalize_indexed` converting index-keyed maps to arrays
//! - `standardize` applying that conversion across a parameter map
//! - `attributize` renaming a whitelist to `_attributes` entries
//! - the difference between the all-keys and first-key detection modes
//!
//! ## Run
//! ```sh
//! cargo run -p demos --example nested_forms
//! ```

use serde_json::json;
use strong_params::prelude::*;
use strong_params::whitelist;

fn main() -> Result<(), ParamsError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "strong_params=trace".parse().unwrap()),
        )
        .with_target(false)
        .init();

    println!("=== Nested Form Normalization ===\n");

    // --- 1. Indexed maps become arrays ---
    println!("--- normalize_indexed ---\n");
    let submitted = ParamValue::from(json!({
        "0": {"body": "first comment"},
        "1": {"body": "second comment"},
        "new_72": {"body": "unsaved draft"},
    }));
    let normalized = normalize_indexed(&submitted, IndexedFormCheck::AllKeys);
    println!("submitted:  {}", submitted.to_value());
    println!("normalized: {}\n", normalized.to_value());

    // --- 2. Ordinary maps are left alone ---
    let author = ParamValue::from(json!({"name": "Frank", "born": 1920}));
    println!(
        "author map unchanged: {}\n",
        normalize_indexed(&author, IndexedFormCheck::AllKeys).to_value()
    );

    // --- 3. standardize walks one level of a parameter map ---
    println!("--- standardize ---\n");
    let params = Params::from_value(json!({
        "title": "Dune",
        "comments_attributes": {
            "0": {"body": "outer", "replies_attributes": {"0": {"text": "inner"}}},
        },
    }));
    let standardized = standardize(&params, IndexedFormCheck::AllKeys);
    println!("before: {}", params.to_value());
    println!("after:  {}\n", standardized.to_value());

    // --- 4. Detection modes differ on mixed keys ---
    println!("--- detection modes ---\n");
    let mixed = ParamValue::from(json!({"0": {"a": 1}, "label": "not an index"}));
    println!(
        "all-keys:  {}",
        normalize_indexed(&mixed, IndexedFormCheck::AllKeys).to_value()
    );
    println!(
        "first-key: {}\n",
        normalize_indexed(&mixed, IndexedFormCheck::FirstKey).to_value()
    );

    // --- 5. Whitelists are renamed to match ---
    println!("--- attributize ---\n");
    let spec = whitelist![title, comments: [body, replies: [text]]];
    let renamed = attributize(&spec)?;
    println!("declared: {}", serde_json::to_string(&spec)?);
    println!("renamed:  {}", serde_json::to_string(&renamed)?);

    Ok(())
}
