//! Error types for the strong_params crate
//!
//! This module defines the error hierarchy for the strong_params crate using
//! `thiserror`. All operations that can fail return `Result<T, ParamsError>`.
//!
//! # Error Variants
//!
//! - [`ParamsError::MissingRequiredKey`]: a required parameter was absent from the request
//! - [`ParamsError::MalformedWhitelist`]: a whitelist declaration cannot be compiled
//! - [`ParamsError::UnknownController`]: dispatch targeted an unregistered controller
//! - [`ParamsError::JsonDecode`]: request body parsing errors (auto-converts from `serde_json::Error`)
//! - [`ParamsError::Handler`]: an action handler reported a failure
//!
//! # Example
//!
//! ```rust
//! use strong_params::error::ParamsError;
//!
//! fn example() -> Result<strong_params::Params, ParamsError> {
//!     // Auto-conversion from serde_json::Error
//!     let params = strong_params::Params::from_json(r#"{"title": "Dune"}"#)?;
//!     Ok(params)
//! }
//! ```

use thiserror::Error;

/// The main error type for all strong_params operations
///
/// This enum covers all error conditions that can occur when declaring
/// whitelists, filtering request parameters, and dispatching actions.
///
/// One variant supports automatic conversion via the `?` operator:
/// - `JsonDecode` from `serde_json::Error`
#[derive(Error, Debug)]
pub enum ParamsError {
    /// A required parameter was not present in the request
    ///
    /// This error occurs when a `require` declaration matches the current
    /// action and the named key (or the resource subtree itself) is absent.
    /// The dispatcher maps it to a 400 response.
    #[error("required parameter `{key}` is missing")]
    MissingRequiredKey {
        /// The key that the declaration demanded
        key: String,
    },

    /// A whitelist declaration cannot be compiled into a filter
    ///
    /// This error is raised at build time, before any request is filtered,
    /// so a bad declaration fails fast instead of surfacing mid-request.
    #[error("malformed whitelist entry `{name}`: {reason}")]
    MalformedWhitelist {
        /// The nested entry the problem was found under
        name: String,
        /// Description of what makes the declaration invalid
        reason: String,
    },

    /// Dispatch targeted a controller that was never registered
    #[error("no controller registered as `{0}`")]
    UnknownController(String),

    /// Failed to parse a JSON request body or whitelist declaration
    ///
    /// This error is automatically converted from `serde_json::Error` when
    /// decoding request bodies into [`crate::Params`].
    #[error("failed to decode parameters: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// An action handler reported a failure
    ///
    /// This error occurs when a registered handler returns an error while
    /// servicing a dispatched request.
    #[error("action handler failed: {0}")]
    Handler(String),
}
