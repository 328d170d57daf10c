//! Request parameter trees with per-node trust tracking
//!
//! This module defines [`Params`], an insertion-ordered map of request
//! parameters, and [`ParamValue`], the value type stored under each key.
//! Together they mirror the shape of a decoded JSON request body: scalars,
//! arrays, and nested maps.
//!
//! Every map in the tree carries a `trusted` flag. Freshly decoded
//! parameters are untrusted; only the filtering operations in this crate
//! ([`Params::permit`] and [`Params::permit_all`]) produce trusted maps.
//! Consumers that persist parameters can use the flag to reject values that
//! never passed through a whitelist.
//!
//! # Example
//!
//! ```rust
//! use strong_params::Params;
//!
//! fn example() -> Result<(), strong_params::ParamsError> {
//!     let params = Params::from_json(r#"{"title": "Dune", "tags": ["sf", "classic"]}"#)?;
//!     assert_eq!(params.len(), 2);
//!     assert!(!params.trusted());
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

mod permit;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ParamsError;

/// A single value in a parameter tree
///
/// Request bodies decode into three shapes: JSON scalars (strings, numbers,
/// booleans, null), arrays of further values, and nested maps. Nested maps
/// are full [`Params`] so trust tracking reaches every level of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A leaf value: string, number, boolean, or null
    Scalar(Value),
    /// An ordered list of values
    Array(Vec<ParamValue>),
    /// A nested parameter map
    Map(Params),
}

impl ParamValue {
    /// Returns `true` if this value is a scalar leaf.
    pub fn is_scalar(&self) -> bool {
        matches!(self, ParamValue::Scalar(_))
    }

    /// Returns `true` if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, ParamValue::Array(_))
    }

    /// Returns `true` if this value is a nested map.
    pub fn is_map(&self) -> bool {
        matches!(self, ParamValue::Map(_))
    }

    /// Returns the scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ParamValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the items, if this is an array.
    pub fn as_array(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the nested map, if this is a map.
    pub fn as_map(&self) -> Option<&Params> {
        match self {
            ParamValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the nested map mutably, if this is a map.
    pub fn as_map_mut(&mut self) -> Option<&mut Params> {
        match self {
            ParamValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Converts this value back into a `serde_json::Value`.
    pub fn to_value(&self) -> Value {
        match self {
            ParamValue::Scalar(value) => value.clone(),
            ParamValue::Array(items) => Value::Array(items.iter().map(ParamValue::to_value).collect()),
            ParamValue::Map(map) => map.to_value(),
        }
    }

    /// Marks every map reachable from this value as trusted.
    pub(crate) fn trust_all(&mut self) {
        match self {
            ParamValue::Scalar(_) => {}
            ParamValue::Array(items) => {
                for item in items {
                    item.trust_all();
                }
            }
            ParamValue::Map(map) => map.permit_all(),
        }
    }
}

impl From<Value> for ParamValue {
    /// Converts a decoded JSON value into a parameter value.
    ///
    /// Arrays and objects convert recursively; every map in the result
    /// starts out untrusted.
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => {
                ParamValue::Array(items.into_iter().map(ParamValue::from).collect())
            }
            Value::Object(map) => {
                let mut params = Params::new();
                for (key, value) in map {
                    params.insert(key, ParamValue::from(value));
                }
                ParamValue::Map(params)
            }
            scalar => ParamValue::Scalar(scalar),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Scalar(Value::from(value))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Scalar(Value::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Scalar(Value::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Scalar(Value::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Scalar(Value::from(value))
    }
}

impl From<Params> for ParamValue {
    fn from(params: Params) -> Self {
        ParamValue::Map(params)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for ParamValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ParamValue::Scalar(value) => value.serialize(serializer),
            ParamValue::Array(items) => serializer.collect_seq(items),
            ParamValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ParamValue::from(value))
    }
}

/// An insertion-ordered map of request parameters
///
/// `Params` preserves the key order of the decoded request body, which
/// matters for nested-form submissions where entry order is the only
/// ordering the client expressed. The map starts untrusted; filtering
/// operations return trusted copies.
///
/// Equality compares entries only, so a filtered map can be asserted
/// against a freshly built expectation regardless of trust state.
#[derive(Debug, Clone, Default)]
pub struct Params {
    entries: IndexMap<String, ParamValue>,
    trusted: bool,
}

impl Params {
    /// Creates an empty, untrusted parameter map.
    pub fn new() -> Self {
        Params {
            entries: IndexMap::new(),
            trusted: false,
        }
    }

    /// Builds a parameter map from a decoded JSON value.
    ///
    /// Non-object values produce an empty map; request bodies are expected
    /// to be JSON objects at the top level.
    pub fn from_value(value: Value) -> Self {
        match ParamValue::from(value) {
            ParamValue::Map(params) => params,
            _ => Params::new(),
        }
    }

    /// Parses a JSON request body into a parameter map.
    ///
    /// Fails with [`ParamsError::JsonDecode`] when the body is not valid
    /// JSON or is not an object at the top level.
    pub fn from_json(body: &str) -> Result<Self, ParamsError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Converts the map back into a `serde_json::Value` object.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect(),
        )
    }

    /// Inserts a value under `key`, replacing any existing value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Returns the value stored under `key` mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ParamValue> {
        self.entries.get_mut(key)
    }

    /// Returns the nested map stored under `key`, if the value is a map.
    pub fn get_map(&self, key: &str) -> Option<&Params> {
        self.entries.get(key).and_then(ParamValue::as_map)
    }

    /// Removes and returns the value under `key`, preserving the order of
    /// the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.shift_remove(key)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if this map has passed through a whitelist.
    pub fn trusted(&self) -> bool {
        self.trusted
    }

    /// Marks this map and every map nested anywhere beneath it as trusted.
    ///
    /// Arrays are traversed, so maps inside collections are trusted too.
    /// Use this only for endpoints that genuinely accept arbitrary input,
    /// such as free-form settings blobs.
    pub fn permit_all(&mut self) {
        for value in self.entries.values_mut() {
            value.trust_all();
        }
        self.trusted = true;
    }

    /// Merges `other` into this map, replacing values for keys that already
    /// exist and appending new keys at the end. The trust state of `self`
    /// is left unchanged.
    pub fn merge(&mut self, other: Params) {
        for (key, value) in other.entries {
            self.entries.insert(key, value);
        }
    }

    pub(crate) fn set_trusted(&mut self, trusted: bool) {
        self.trusted = trusted;
    }
}

impl PartialEq for Params {
    /// Entry-wise equality; the trust flag does not participate.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Serialize for Params {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.entries.iter())
    }
}

impl<'de> Deserialize<'de> for Params {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("expected a JSON object"));
        }
        Ok(Params::from_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_parses_objects() {
        let params = Params::from_json(r#"{"title": "Dune", "year": 1965}"#).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(
            params.get("title"),
            Some(&ParamValue::Scalar(json!("Dune")))
        );
        assert!(!params.trusted());
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        let result = Params::from_json(r#"["not", "an", "object"]"#);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            crate::error::ParamsError::JsonDecode(_)
        ));
    }

    #[test]
    fn test_from_value_preserves_insertion_order() {
        let params = Params::from_value(json!({
            "zebra": 1,
            "apple": 2,
            "mango": 3,
        }));
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_from_value_non_object_is_empty() {
        let params = Params::from_value(json!("just a string"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_nested_values_convert_recursively() {
        let params = Params::from_value(json!({
            "book": {"title": "Dune"},
            "tags": ["sf", "classic"],
        }));
        let book = params.get_map("book").unwrap();
        assert!(!book.trusted());
        assert_eq!(book.get("title"), Some(&ParamValue::Scalar(json!("Dune"))));
        let tags = params.get("tags").unwrap().as_array().unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_to_value_round_trips() {
        let body = json!({
            "title": "Dune",
            "comments": [{"body": "great"}],
        });
        let params = Params::from_value(body.clone());
        assert_eq!(params.to_value(), body);
    }

    #[test]
    fn test_insert_and_remove_keep_order() {
        let mut params = Params::new();
        params.insert("a", 1);
        params.insert("b", 2);
        params.insert("c", 3);
        params.remove("b");
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_permit_all_trusts_nested_maps() {
        let mut params = Params::from_value(json!({
            "settings": {"theme": {"name": "dark"}},
            "entries": [{"key": "a"}, {"key": "b"}],
        }));
        params.permit_all();
        assert!(params.trusted());
        let theme = params.get_map("settings").unwrap().get_map("theme").unwrap();
        assert!(theme.trusted());
        let entries = params.get("entries").unwrap().as_array().unwrap();
        for entry in entries {
            assert!(entry.as_map().unwrap().trusted());
        }
    }

    #[test]
    fn test_equality_ignores_trust() {
        let mut trusted = Params::from_value(json!({"a": 1}));
        trusted.permit_all();
        let untrusted = Params::from_value(json!({"a": 1}));
        assert_eq!(trusted, untrusted);
    }

    #[test]
    fn test_merge_replaces_and_appends() {
        let mut params = Params::from_value(json!({"a": 1, "b": 2}));
        let other = Params::from_value(json!({"b": 20, "c": 30}));
        params.merge(other);
        assert_eq!(params.get("b"), Some(&ParamValue::Scalar(json!(20))));
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_serialize_matches_to_value() {
        let params = Params::from_value(json!({"b": [1, 2], "a": {"x": true}}));
        let serialized = serde_json::to_value(&params).unwrap();
        assert_eq!(serialized, params.to_value());
    }

    #[test]
    fn test_deserialize_from_reader_shape() {
        let params: Params = serde_json::from_str(r#"{"n": 1}"#).unwrap();
        assert_eq!(params.get("n"), Some(&ParamValue::Scalar(json!(1))));
        let result: Result<Params, _> = serde_json::from_str("42");
        assert!(result.is_err());
    }
}
