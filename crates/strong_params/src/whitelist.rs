//! Whitelist declarations for parameter filtering
//!
//! A [`Whitelist`] names which parameters an action accepts: a flat list of
//! scalar keys plus named nested entries. Each nested entry is a
//! [`NestedSpec`] describing what shape the value under that name may take.
//!
//! Whitelists are built three ways: the chainable constructors here, the
//! `whitelist!` macro, or [`Whitelist::from_value`] for declarations loaded
//! from JSON configuration.
//!
//! # Example
//!
//! ```rust
//! use strong_params::{NestedSpec, Whitelist};
//!
//! let spec = Whitelist::new()
//!     .key("title")
//!     .key("year")
//!     .nested("comments", NestedSpec::fields(["body", "rating"]));
//! assert_eq!(spec.scalar_keys(), ["title", "year"]);
//! ```

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::ParamsError;

/// Keys every nested-record entry accepts in addition to its declared fields.
///
/// Nested-form submissions carry the record id and the deletion markers
/// alongside the editable fields, so filters admit these implicitly.
pub const RESERVED_NESTED_KEYS: [&str; 3] = ["id", "_destroy", "_delete"];

/// The accepted shape of one named nested entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NestedSpec {
    /// A record or collection of records with the given fields.
    ///
    /// Matches a map (one record) or an array of maps (a collection), each
    /// filtered through the inner whitelist. An empty field list instead
    /// matches a plain array of scalars, such as a list of tag ids.
    Fields(Whitelist),
    /// A map whose entries are further whitelisted by name.
    ///
    /// Unlike [`NestedSpec::Fields`], the value must be a single map and its
    /// entries keep their names unchanged.
    Tree(Whitelist),
    /// A map accepted in full, every level trusted.
    All,
}

impl NestedSpec {
    /// A record entry with the given fields.
    pub fn fields(spec: impl Into<Whitelist>) -> Self {
        NestedSpec::Fields(spec.into())
    }

    /// A map entry whose sub-entries are whitelisted by name.
    pub fn tree(spec: Whitelist) -> Self {
        NestedSpec::Tree(spec)
    }

    /// A map entry accepted without inspection.
    pub fn all() -> Self {
        NestedSpec::All
    }

    /// Returns `true` for [`NestedSpec::Fields`] entries.
    pub fn is_fields(&self) -> bool {
        matches!(self, NestedSpec::Fields(_))
    }
}

/// A declaration of accepted parameters
///
/// Scalar keys admit leaf values; nested entries admit structured values
/// according to their [`NestedSpec`]. Nested entries keep declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Whitelist {
    keys: Vec<String>,
    nested: IndexMap<String, NestedSpec>,
}

impl Whitelist {
    /// Creates an empty whitelist.
    pub fn new() -> Self {
        Whitelist::default()
    }

    /// Adds a scalar key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Adds every key from an iterator of scalar keys.
    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Adds a named nested entry, replacing any previous entry of that name.
    pub fn nested(mut self, name: impl Into<String>, spec: NestedSpec) -> Self {
        self.nested.insert(name.into(), spec);
        self
    }

    /// The declared scalar keys, in declaration order.
    pub fn scalar_keys(&self) -> &[String] {
        &self.keys
    }

    /// Iterates over nested entries in declaration order.
    pub fn nested_entries(&self) -> impl Iterator<Item = (&str, &NestedSpec)> {
        self.nested.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Returns `true` if any scalar key is declared.
    pub fn has_keys(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Returns `true` if any nested entry is declared.
    pub fn has_nested(&self) -> bool {
        !self.nested.is_empty()
    }

    /// Returns `true` if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.nested.is_empty()
    }

    /// Returns `true` if every nested entry is a [`NestedSpec::Fields`].
    pub fn all_nested_are_fields(&self) -> bool {
        self.nested.values().all(NestedSpec::is_fields)
    }

    /// Returns `true` if `key` is declared, as a scalar key or a nested name.
    pub fn covers(&self, key: &str) -> bool {
        self.nested.contains_key(key) || self.keys.iter().any(|declared| declared == key)
    }

    /// Parses a whitelist from a JSON declaration.
    ///
    /// Two forms are accepted. A list mixes scalar keys with nested maps:
    ///
    /// ```json
    /// ["title", "year", {"comments": ["body", "rating"]}]
    /// ```
    ///
    /// A map declares nested entries only. Inside either form, a list value
    /// declares [`NestedSpec::Fields`], a non-empty map declares
    /// [`NestedSpec::Tree`], and an empty map declares [`NestedSpec::All`]:
    ///
    /// ```json
    /// {"author": ["name"], "metadata": {}}
    /// ```
    ///
    /// Any other shape fails with [`ParamsError::MalformedWhitelist`].
    pub fn from_value(value: &Value) -> Result<Self, ParamsError> {
        match value {
            Value::Array(items) => Self::parse_list("whitelist", items),
            Value::Object(entries) => {
                let mut spec = Whitelist::new();
                for (name, value) in entries {
                    spec = spec.nested(name.clone(), Self::parse_nested(name, value)?);
                }
                Ok(spec)
            }
            other => Err(ParamsError::MalformedWhitelist {
                name: "whitelist".to_string(),
                reason: format!("expected a list or map, got {}", value_kind(other)),
            }),
        }
    }

    fn parse_list(name: &str, items: &[Value]) -> Result<Self, ParamsError> {
        let mut spec = Whitelist::new();
        for item in items {
            match item {
                Value::String(key) => spec = spec.key(key.clone()),
                Value::Object(entries) => {
                    for (nested_name, value) in entries {
                        spec = spec.nested(
                            nested_name.clone(),
                            Self::parse_nested(nested_name, value)?,
                        );
                    }
                }
                other => {
                    return Err(ParamsError::MalformedWhitelist {
                        name: name.to_string(),
                        reason: format!(
                            "list entries must be strings or maps, got {}",
                            value_kind(other)
                        ),
                    });
                }
            }
        }
        Ok(spec)
    }

    fn parse_nested(name: &str, value: &Value) -> Result<NestedSpec, ParamsError> {
        match value {
            Value::Array(items) => Ok(NestedSpec::Fields(Self::parse_list(name, items)?)),
            Value::Object(entries) if entries.is_empty() => Ok(NestedSpec::All),
            Value::Object(entries) => {
                let mut spec = Whitelist::new();
                for (nested_name, value) in entries {
                    spec = spec.nested(
                        nested_name.clone(),
                        Self::parse_nested(nested_name, value)?,
                    );
                }
                Ok(NestedSpec::Tree(spec))
            }
            other => Err(ParamsError::MalformedWhitelist {
                name: name.to_string(),
                reason: format!("expected a list or map, got {}", value_kind(other)),
            }),
        }
    }
}

impl<const N: usize> From<[&str; N]> for Whitelist {
    fn from(keys: [&str; N]) -> Self {
        Whitelist::new().keys(keys)
    }
}

impl From<&[&str]> for Whitelist {
    fn from(keys: &[&str]) -> Self {
        Whitelist::new().keys(keys.iter().copied())
    }
}

impl From<Vec<&str>> for Whitelist {
    fn from(keys: Vec<&str>) -> Self {
        Whitelist::new().keys(keys)
    }
}

impl From<Vec<String>> for Whitelist {
    fn from(keys: Vec<String>) -> Self {
        Whitelist::new().keys(keys)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
