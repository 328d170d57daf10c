//! strong_params - declarative request-parameter whitelisting
//!
//! This crate filters untrusted request parameters through per-action
//! whitelists declared once per controller, in the style popularized by
//! Rails' strong parameters.
//!
//! # Overview
//!
//! strong_params provides:
//! - An insertion-ordered parameter tree with per-node trust tracking
//! - Chainable whitelist declarations, checked at startup
//! - Normalization of indexed nested-form submissions into arrays
//! - Automatic `<name>_attributes` renaming with the reserved record keys
//! - A dispatcher that applies filters before handlers run
//! - A `whitelist!` macro for declaration-site ergonomics
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//! - `params`: the `Params` tree, `permit` and `require`
//! - `whitelist`: whitelist declarations and JSON parsing
//! - `shape`: nested-form normalization and `_attributes` renaming
//! - `filter`: per-action declarations compiled into a `FilterSet`
//! - `naming`: controller-name to resource-key resolution
//! - `dispatch`: controller registry and request dispatch
//! - `error`: error types and handling
//!
//! # Example
//!
//! ```rust
//! use strong_params::prelude::*;
//! use serde_json::json;
//!
//! async fn create_book(request: Request) -> Result<Response, ParamsError> {
//!     Ok(Response::ok(request.params.to_value()))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ParamsError> {
//!     let filters = FilterSet::builder()
//!         .require_params_on_create(["title"])
//!         .permit_params(
//!             Whitelist::new()
//!                 .key("title")
//!                 .key("year")
//!                 .nested("comments", NestedSpec::fields(["body", "rating"])),
//!         )
//!         .build()?;
//!
//!     let mut dispatcher = Dispatcher::new();
//!     dispatcher.register("BooksController", filters, create_book);
//!
//!     let response = dispatcher
//!         .dispatch(
//!             "BooksController",
//!             "create",
//!             json!({
//!                 "book": {
//!                     "title": "Dune",
//!                     "admin": true,
//!                     "comments_attributes": {"0": {"body": "great", "spam": 1}},
//!                 },
//!             }),
//!         )
//!         .await?;
//!
//!     assert_eq!(
//!         response.body,
//!         json!({
//!             "book": {
//!                 "title": "Dune",
//!                 "comments_attributes": [{"body": "great"}],
//!             },
//!         })
//!     );
//!     Ok(())
//! }
//! ```
//!
//! # License
//!
//! Licensed under MIT. See LICENSE file for details.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export macros from strong_params_macros
pub use strong_params_macros::*;

/// Request parameter trees with per-node trust tracking
///
/// This module defines `Params` and `ParamValue`, plus the `permit` and
/// `require` operations that apply a whitelist to a tree.
pub mod params;

/// Whitelist declarations
///
/// This module defines `Whitelist` and `NestedSpec`, the declaration model
/// the rest of the crate compiles and applies, along with
/// `Whitelist::from_value` for JSON-sourced declarations.
pub mod whitelist;

/// Shape normalization for nested-form submissions
///
/// This module converts indexed-form maps into arrays (`normalize_indexed`,
/// `standardize`) and renames whitelists to the `_attributes` convention
/// (`attributize`).
pub mod shape;

/// Resource name resolution
///
/// This module derives the parameter key a controller's filters scope to
/// from the controller's name.
pub mod naming;

/// Per-action filter declarations
///
/// This module provides `FilterSet` and its builder: declarations are
/// collected per controller, validated, and compiled once, then applied to
/// every matching request.
pub mod filter;

/// Controller registry and request dispatch
///
/// This module provides `Dispatcher`, `Request`, `Response`, and the
/// `ActionHandler` trait for servicing requests after filtering.
pub mod dispatch;

/// Error types and utilities
///
/// This module defines the `ParamsError` enum, which covers all error cases
/// in the crate:
///
/// - `MissingRequiredKey` - a required parameter was absent
/// - `MalformedWhitelist` - a declaration cannot be compiled
/// - `UnknownController` - dispatch targeted an unregistered controller
/// - `JsonDecode` - request body parsing errors (auto-converts from `serde_json::Error`)
/// - `Handler` - an action handler reported a failure
pub mod error;

// Public API re-exports
pub use dispatch::{ActionHandler, Dispatcher, Request, Response};
pub use error::ParamsError;
pub use filter::{FilterOp, FilterSet, FilterSetBuilder};
pub use naming::resource_name_for;
pub use params::{ParamValue, Params};
pub use shape::{attributize, normalize_indexed, standardize, IndexedFormCheck};
pub use whitelist::{NestedSpec, Whitelist, RESERVED_NESTED_KEYS};

// Prelude module for common imports
pub mod prelude {
    //! Common imports for strong_params users
    //!
    //! Use `use strong_params::prelude::*;` to import commonly used types.

    pub use crate::dispatch::{ActionHandler, Dispatcher, Request, Response};
    pub use crate::error::ParamsError;
    pub use crate::filter::{FilterOp, FilterSet, FilterSetBuilder};
    pub use crate::naming::resource_name_for;
    pub use crate::params::{ParamValue, Params};
    pub use crate::shape::{
        attributize, normalize_indexed, standardize, IndexedFormCheck,
    };
    pub use crate::whitelist::{NestedSpec, Whitelist, RESERVED_NESTED_KEYS};
}
