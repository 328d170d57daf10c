//! Shape normalization for nested-form submissions
//!
//! HTML form encoders submit collections of nested records as maps keyed by
//! synthetic indexes rather than as arrays:
//!
//! ```json
//! {"comments": {"0": {"body": "first"}, "new_17": {"body": "draft"}}}
//! ```
//!
//! The functions here rewrite that shape into the arrays the rest of the
//! filtering pipeline expects, and rewrite whitelists to match the
//! `<name>_attributes` convention those same encoders use for nested-record
//! fields.
//!
//! A map counts as an indexed collection when its keys look like indexes:
//! a `new_` prefix (client-generated placeholder ids), a decimal integer
//! with optional sign, or a lowercase hex string. [`IndexedFormCheck`]
//! selects how many keys must pass that test.

use tracing::trace;

use crate::error::ParamsError;
use crate::params::{ParamValue, Params};
use crate::whitelist::{NestedSpec, Whitelist, RESERVED_NESTED_KEYS};

/// How many keys of a candidate map must look like indexes before the map
/// is treated as an indexed collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexedFormCheck {
    /// Every key must look like an index.
    ///
    /// The safer default: a map mixing index-like keys with ordinary field
    /// names is left alone instead of being silently truncated to its
    /// values.
    #[default]
    AllKeys,
    /// Only the first key is inspected.
    ///
    /// Compatibility mode for forms that rely on the historical dispatch,
    /// where one leading index key converted the whole map.
    FirstKey,
}

/// Converts an indexed-collection map into an array of its values.
///
/// Values that are maps are recursively normalized through
/// [`standardize`]; array entry order follows the key insertion order of
/// the submitted map. Non-map values, maps that fail the index test, and
/// empty maps are returned unchanged.
///
/// # Examples
///
/// ```rust
/// use strong_params::{normalize_indexed, IndexedFormCheck, ParamValue};
/// use serde_json::json;
///
/// let submitted = ParamValue::from(json!({"0": {"a": 1}, "1": {"a": 2}}));
/// let normalized = normalize_indexed(&submitted, IndexedFormCheck::AllKeys);
/// assert_eq!(normalized.to_value(), json!([{"a": 1}, {"a": 2}]));
/// ```
pub fn normalize_indexed(value: &ParamValue, check: IndexedFormCheck) -> ParamValue {
    let ParamValue::Map(map) = value else {
        return value.clone();
    };
    if map.is_empty() || !looks_indexed(map, check) {
        return value.clone();
    }
    trace!("converting indexed form with {} entries to an array", map.len());
    let items = map
        .iter()
        .map(|(_, entry)| match entry {
            ParamValue::Map(record) => ParamValue::Map(standardize(record, check)),
            other => other.clone(),
        })
        .collect();
    ParamValue::Array(items)
}

/// Normalizes every map-valued entry of `params` through
/// [`normalize_indexed`].
///
/// Scalar and array values pass through untouched. The result preserves key
/// order and is a new map; the input is not modified.
pub fn standardize(params: &Params, check: IndexedFormCheck) -> Params {
    let mut normalized = Params::new();
    for (key, value) in params.iter() {
        let replacement = match value {
            ParamValue::Map(_) => normalize_indexed(value, check),
            other => other.clone(),
        };
        normalized.insert(key, replacement);
    }
    normalized
}

fn looks_indexed(map: &Params, check: IndexedFormCheck) -> bool {
    match check {
        IndexedFormCheck::AllKeys => map.keys().all(is_index_key),
        IndexedFormCheck::FirstKey => map.keys().next().is_some_and(is_index_key),
    }
}

fn is_index_key(key: &str) -> bool {
    key.starts_with("new_") || is_decimal(key) || is_lower_hex(key)
}

fn is_decimal(key: &str) -> bool {
    let digits = key.strip_prefix(['-', '+']).unwrap_or(key);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_lower_hex(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Rewrites a whitelist to the `<name>_attributes` naming convention.
///
/// Every nested entry `name` is renamed to `name_attributes`, recursively,
/// and each renamed entry additionally accepts [`RESERVED_NESTED_KEYS`].
/// Scalar keys are left untouched.
///
/// Only [`NestedSpec::Fields`] entries can be renamed; a
/// [`NestedSpec::Tree`] or [`NestedSpec::All`] entry fails with
/// [`ParamsError::MalformedWhitelist`] since those shapes never appear in
/// nested-record submissions.
pub fn attributize(spec: &Whitelist) -> Result<Whitelist, ParamsError> {
    let mut renamed = Whitelist::new().keys(spec.scalar_keys().iter().cloned());
    for (name, nested) in spec.nested_entries() {
        let NestedSpec::Fields(fields) = nested else {
            return Err(ParamsError::MalformedWhitelist {
                name: name.to_string(),
                reason: "only field lists can become `_attributes` entries".to_string(),
            });
        };
        renamed = renamed.nested(
            format!("{name}_attributes"),
            NestedSpec::Fields(attributize_fields(fields)?),
        );
    }
    Ok(renamed)
}

fn attributize_fields(fields: &Whitelist) -> Result<Whitelist, ParamsError> {
    let mut inner = attributize(fields)?;
    for key in RESERVED_NESTED_KEYS {
        inner = inner.key(key);
    }
    Ok(inner)
}
