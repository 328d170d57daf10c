//! Controller registry and request dispatch
//!
//! This module wires the filtering pipeline to application code. A
//! [`Dispatcher`] maps controller names to their compiled [`FilterSet`] and
//! an [`ActionHandler`]. Dispatching a request decodes the body, applies
//! the controller's filters for the named action, and hands the surviving
//! parameters to the handler.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Dispatcher                          │
//! │                                                          │
//! │  - Controller registry: HashMap<String, ControllerEntry> │
//! │  - Resolves resource keys at registration                │
//! │  - dispatch() builds a Request and applies filters       │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            │ Contains Arc<dyn ActionHandler>
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │              ActionHandler (async trait)                 │
//! │                                                          │
//! │  async fn call(&self, request: Request)                  │
//! │      → Result<Response, ParamsError>                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed `require` never reaches the handler: the dispatcher answers
//! with a 400 [`Response`] naming the missing key.
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
//! # #[tokio::main]
//! # async fn main() -> Result<(), ParamsError> {
//! let filters = FilterSet::builder()
//!     .require_params_on_create(["title"])
//!     .permit_params(["title", "year"])
//!     .build()?;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("BooksController", filters, create_book);
//!
//! let response = dispatcher
//!     .dispatch("BooksController", "create", json!({"title": "Dune", "admin": true}))
//!     .await?;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ParamsError;
use crate::filter::FilterSet;
use crate::naming::resource_name_for;
use crate::params::Params;

/// One dispatched request, after parameter filtering
///
/// Handlers receive the request by value. `params` holds whatever survived
/// the controller's filters; for actions with no matching filters it is the
/// decoded body, untrusted.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique id for correlating log lines with responses
    pub id: Uuid,
    /// The controller the request was dispatched to
    pub controller: String,
    /// The action being performed
    pub action: String,
    /// The filtered request parameters
    pub params: Params,
}

impl Request {
    /// Builds a request with a fresh id.
    pub fn new(controller: impl Into<String>, action: impl Into<String>, params: Params) -> Self {
        Request {
            id: Uuid::new_v4(),
            controller: controller.into(),
            action: action.into(),
            params,
        }
    }
}

/// A minimal handler response: status code plus JSON body
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Response {
    /// HTTP-style status code
    pub status: u16,
    /// Response body
    pub body: Value,
}

impl Response {
    /// A 200 response with the given body.
    pub fn ok(body: Value) -> Self {
        Response { status: 200, body }
    }

    /// A 400 response with an error message body.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Response {
            status: 400,
            body: json!({"error": message.into()}),
        }
    }

    /// A 404 response with an error message body.
    pub fn not_found(message: impl Into<String>) -> Self {
        Response {
            status: 404,
            body: json!({"error": message.into()}),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for servicing dispatched requests
///
/// Implemented automatically for async functions taking a [`Request`], so
/// most handlers are plain functions:
///
/// ```rust
/// use strong_params::{ParamsError, Request, Response};
///
/// async fn show(request: Request) -> Result<Response, ParamsError> {
///     Ok(Response::ok(request.params.to_value()))
/// }
/// ```
///
/// Implement the trait directly when the handler needs shared state.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Services one request whose parameters already passed filtering.
    async fn call(&self, request: Request) -> Result<Response, ParamsError>;
}

#[async_trait]
impl<F, Fut> ActionHandler for F
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, ParamsError>> + Send,
{
    async fn call(&self, request: Request) -> Result<Response, ParamsError> {
        self(request).await
    }
}

#[derive(Clone)]
struct ControllerEntry {
    resource: String,
    filters: FilterSet,
    handler: Arc<dyn ActionHandler>,
}

/// Routes requests to registered controllers through their filters
///
/// Controllers register once with their filters and handler; the resource
/// key scoped filters apply under is resolved at that moment, either from
/// [`crate::FilterSetBuilder::resource_name`] or from the controller name.
#[derive(Clone, Default)]
pub struct Dispatcher {
    controllers: HashMap<String, ControllerEntry>,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Dispatcher {
            controllers: HashMap::new(),
        }
    }

    /// Registers a controller.
    ///
    /// # Arguments
    ///
    /// * `controller` - Controller name, e.g. `"Admin::BooksController"`
    /// * `filters` - The controller's compiled filter set
    /// * `handler` - Handles requests after filtering
    ///
    /// Registering the same name again replaces the previous entry.
    pub fn register(
        &mut self,
        controller: impl Into<String>,
        filters: FilterSet,
        handler: impl ActionHandler + 'static,
    ) {
        let controller = controller.into();
        let resource = filters
            .resource_override()
            .map(str::to_string)
            .unwrap_or_else(|| resource_name_for(&controller));
        debug!(
            "registered `{}` with {} filters under resource `{}`",
            controller,
            filters.len(),
            resource
        );
        self.controllers.insert(
            controller,
            ControllerEntry {
                resource,
                filters,
                handler: Arc::new(handler),
            },
        );
    }

    /// Returns `true` if a controller is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.controllers.contains_key(name)
    }

    /// The resource key a registered controller's scoped filters use.
    pub fn resource_for(&self, controller: &str) -> Option<&str> {
        self.controllers
            .get(controller)
            .map(|entry| entry.resource.as_str())
    }

    /// Decodes `body`, applies the controller's filters for `action`, and
    /// invokes the handler.
    ///
    /// # Returns
    ///
    /// * `Ok(Response)` - The handler's response, or a 400 when a required
    ///   parameter was missing (the handler is not invoked)
    /// * `Err(ParamsError::UnknownController)` - No controller registered
    ///   under `controller`
    /// * `Err(_)` - Handler failures propagate unchanged
    pub async fn dispatch(
        &self,
        controller: &str,
        action: &str,
        body: Value,
    ) -> Result<Response, ParamsError> {
        let entry = self
            .controllers
            .get(controller)
            .ok_or_else(|| ParamsError::UnknownController(controller.to_string()))?;
        let mut request = Request::new(controller, action, Params::from_value(body));
        debug!("[{}] {}#{}", request.id, controller, action);
        if let Err(error) = entry
            .filters
            .apply(action, &entry.resource, &mut request.params)
        {
            return match error {
                ParamsError::MissingRequiredKey { key } => {
                    warn!("[{}] missing required parameter `{}`", request.id, key);
                    Ok(Response::bad_request(format!(
                        "required parameter `{}` is missing",
                        key
                    )))
                }
                other => Err(other),
            };
        }
        entry.handler.call(request).await
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("controllers", &self.controllers.keys().collect::<Vec<_>>())
            .finish()
    }
}
