//! Permit-everything and tree declarations.
//!
//! Some endpoints accept free-form input: settings blobs, import payloads,
//! webhook bodies. This example shows the escape hatches and their blast
//! radius:
//! - `permit_all_params_on` trusting a whole tree for chosen actions
//! - tree declarations whitelisting named branches, with `{}` for the
//!   branches that stay free-form
//! - whitelists loaded from JSON configuration at startup
//!
//! ## Run
//! ```sh
//! cargo run -p demos --example permit_everything
//! ```

use serde_json::json;
use strong_params::prelude::*;
use strong_params::whitelist;

async fn echo(request: Request) -> Result<Response, ParamsError> {
    Ok(Response::ok(request.params.to_value()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "strong_params=debug".parse().unwrap()),
        )
        .with_target(false)
        .init();

    println!("=== Permit Everything ===\n");

    // --- 1. Trust the whole tree, but only where declared ---
    println!("--- permit_all_params_on(import) ---\n");
    let import_filters = FilterSet::builder()
        .permit_all_params_on(["import"])
        .build()?;
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("BatchesController", import_filters, echo);

    let payload = json!({"rows": [{"anything": {"goes": true}}], "source": "csv"});
    let imported = dispatcher
        .dispatch("BatchesController", "import", payload.clone())
        .await?;
    println!("import kept everything: {}\n", imported.body);

    let created = dispatcher
        .dispatch("BatchesController", "create", payload)
        .await?;
    println!("create was left untouched (and untrusted): {}\n", created.body);

    // --- 2. Trees: free-form only where the declaration says so ---
    println!("--- tree declaration with a free-form branch ---\n");
    let settings_filters = FilterSet::builder()
        .permit_params(whitelist![
            preferences: { display: [theme, density], experiments: {} },
        ])
        .build()?;
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("SettingsController", settings_filters, echo);

    let response = dispatcher
        .dispatch(
            "SettingsController",
            "update",
            json!({
                "preferences": {
                    "display": {"theme": "dark", "injected": "dropped"},
                    "experiments": {"any": {"shape": ["works"]}},
                    "unlisted": {"token": "dropped"},
                },
            }),
        )
        .await?;
    println!("filtered settings: {}\n", response.body);

    // --- 3. Whitelists from configuration ---
    println!("--- whitelist loaded from JSON ---\n");
    let declaration = json!(["title", {"comments": ["body"]}]);
    let loaded = Whitelist::from_value(&declaration)?;
    let filters = FilterSet::builder().permit_params(loaded).build()?;
    let mut dispatcher = Dispatcher::new();
    dispatcher.register("BooksController", filters, echo);

    let response = dispatcher
        .dispatch(
            "BooksController",
            "create",
            json!({
                "book": {
                    "title": "Dune",
                    "pirated_from": "nowhere",
                    "comments_attributes": {"0": {"body": "great", "spam": 1}},
                },
            }),
        )
        .await?;
    println!("declaration: {}", declaration);
    println!("filtered:    {}", response.body);

    Ok(())
}
