//! Books controller - the full request pipeline.
//!
//! This example registers a controller with require and permit
//! declarations, then dispatches a handful of requests to show:
//! - whitelisted fields surviving, everything else dropped
//! - a missing required parameter answered with a 400
//! - nested comment records filtered through their own field list
//! - a stateful handler implementing `ActionHandler` directly
//!
//! ## Run
//! ```sh
//! cargo run -p demos --example books_controller
//! ```

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use strong_params::prelude::*;
use strong_params::whitelist;

/// Keeps created books in memory so responses can show stored state.
struct BookStore {
    books: Mutex<Vec<Value>>,
}

#[async_trait]
impl ActionHandler for BookStore {
    async fn call(&self, request: Request) -> Result<Response, ParamsError> {
        match request.action.as_str() {
            "create" => {
                let book = request
                    .params
                    .get_map("book")
                    .map(Params::to_value)
                    .unwrap_or(Value::Null);
                let mut books = self
                    .books
                    .lock()
                    .map_err(|_| ParamsError::Handler("store lock poisoned".to_string()))?;
                books.push(book.clone());
                Ok(Response::ok(json!({"created": book, "count": books.len()})))
            }
            "index" => {
                let books = self
                    .books
                    .lock()
                    .map_err(|_| ParamsError::Handler("store lock poisoned".to_string()))?;
                Ok(Response::ok(json!({"books": *books})))
            }
            other => Ok(Response::not_found(format!("no action `{}`", other))),
        }
    }
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

    println!("=== Books Controller ===\n");

    let filters = FilterSet::builder()
        .require_params_on_create(["title"])
        .permit_params(whitelist![
            title,
            year,
            comments: [body, rating],
        ])
        .build()?;

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(
        "BooksController",
        filters,
        BookStore {
            books: Mutex::new(Vec::new()),
        },
    );
    println!(
        "registered BooksController (resource key: {:?})\n",
        dispatcher.resource_for("BooksController")
    );

    // --- 1. A well-formed create ---
    println!("--- Create with extra fields ---\n");
    let response = dispatcher
        .dispatch(
            "BooksController",
            "create",
            json!({
                "book": {
                    "title": "Dune",
                    "year": 1965,
                    "admin": true,
                    "comments_attributes": [
                        {"body": "a classic", "rating": 5, "spam_score": 0.9},
                    ],
                },
            }),
        )
        .await?;
    println!("status: {}", response.status);
    println!("body:   {}\n", response.body);

    // --- 2. Missing required parameter ---
    println!("--- Create without a title ---\n");
    let response = dispatcher
        .dispatch("BooksController", "create", json!({"book": {"year": 1972}}))
        .await?;
    println!("status: {}", response.status);
    println!("body:   {}\n", response.body);

    // --- 3. Unfiltered read action ---
    println!("--- Index ---\n");
    let response = dispatcher
        .dispatch("BooksController", "index", json!({}))
        .await?;
    println!("status: {}", response.status);
    println!("body:   {}", response.body);

    Ok(())
}
