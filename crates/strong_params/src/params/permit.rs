//! Whitelist application: `permit` and `require`
//!
//! `permit` walks a parameter map against a [`Whitelist`] and returns the
//! trusted subset. It never fails: values the whitelist does not cover are
//! dropped and logged. `require` is the strict counterpart for presence,
//! failing when a declared key is absent while leaving the parameters
//! untouched.

use tracing::debug;

use crate::error::ParamsError;
use crate::params::{ParamValue, Params};
use crate::whitelist::{NestedSpec, Whitelist};

impl Params {
    /// Returns the subset of these parameters covered by `whitelist`.
    ///
    /// Declared scalar keys admit leaf values only. Nested entries admit
    /// values matching their [`NestedSpec`] and filter them recursively.
    /// Everything else is dropped, with a `debug` log naming the dropped
    /// keys. The result and every map it contains are trusted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use strong_params::{Params, Whitelist};
    /// use serde_json::json;
    ///
    /// let params = Params::from_value(json!({"title": "Dune", "admin": true}));
    /// let permitted = params.permit(&Whitelist::from(["title"]));
    /// assert_eq!(permitted.to_value(), json!({"title": "Dune"}));
    /// assert!(permitted.trusted());
    /// ```
    pub fn permit(&self, whitelist: &Whitelist) -> Params {
        let mut permitted = Params::new();
        for key in whitelist.scalar_keys() {
            match self.get(key) {
                Some(ParamValue::Scalar(value)) => {
                    permitted.insert(key.clone(), ParamValue::Scalar(value.clone()));
                }
                Some(_) => {
                    debug!("dropping `{}`: declared as a scalar key", key);
                }
                None => {}
            }
        }
        for (name, spec) in whitelist.nested_entries() {
            let Some(value) = self.get(name) else {
                continue;
            };
            match admit(spec, value) {
                Some(admitted) => permitted.insert(name, admitted),
                None => debug!("dropping `{}`: value does not match its declaration", name),
            }
        }
        let unpermitted: Vec<&str> = self.keys().filter(|key| !whitelist.covers(key)).collect();
        if !unpermitted.is_empty() {
            debug!("dropping unpermitted parameters: {:?}", unpermitted);
        }
        permitted.set_trusted(true);
        permitted
    }

    /// Checks that every key `whitelist` declares is present.
    ///
    /// Scalar keys are checked first, then nested names, each in
    /// declaration order; the first absent key is reported. The parameters
    /// themselves are not filtered or modified, so a successful `require`
    /// passes the original values through.
    pub fn require(&self, whitelist: &Whitelist) -> Result<(), ParamsError> {
        for key in whitelist.scalar_keys() {
            if !self.contains_key(key) {
                return Err(ParamsError::MissingRequiredKey { key: key.clone() });
            }
        }
        for (name, _) in whitelist.nested_entries() {
            if !self.contains_key(name) {
                return Err(ParamsError::MissingRequiredKey {
                    key: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Admits `value` under a nested declaration, or rejects it with `None`.
fn admit(spec: &NestedSpec, value: &ParamValue) -> Option<ParamValue> {
    match spec {
        NestedSpec::All => {
            let ParamValue::Map(_) = value else {
                return None;
            };
            let mut trusted = value.clone();
            trusted.trust_all();
            Some(trusted)
        }
        NestedSpec::Fields(fields) if fields.is_empty() => match value {
            // An empty field list declares a plain list of scalar values.
            ParamValue::Array(items) => Some(ParamValue::Array(
                items.iter().filter(|item| item.is_scalar()).cloned().collect(),
            )),
            _ => None,
        },
        NestedSpec::Fields(fields) => match value {
            ParamValue::Map(record) => Some(ParamValue::Map(record.permit(fields))),
            ParamValue::Array(items) => Some(ParamValue::Array(
                items
                    .iter()
                    .filter_map(|item| {
                        item.as_map()
                            .map(|record| ParamValue::Map(record.permit(fields)))
                    })
                    .collect(),
            )),
            ParamValue::Scalar(_) => None,
        },
        NestedSpec::Tree(tree) => value
            .as_map()
            .map(|entries| ParamValue::Map(entries.permit(tree))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(body: serde_json::Value) -> Params {
        Params::from_value(body)
    }

    #[test]
    fn test_permit_keeps_declared_scalars() {
        let permitted = params(json!({"title": "Dune", "admin": true}))
            .permit(&Whitelist::from(["title"]));
        assert_eq!(permitted.to_value(), json!({"title": "Dune"}));
        assert!(permitted.trusted());
    }

    #[test]
    fn test_permit_drops_structured_value_under_scalar_key() {
        let permitted =
            params(json!({"title": {"sneaky": true}})).permit(&Whitelist::from(["title"]));
        assert!(permitted.is_empty());
    }

    #[test]
    fn test_permit_missing_key_is_not_an_error() {
        let permitted = params(json!({})).permit(&Whitelist::from(["title"]));
        assert!(permitted.is_empty());
        assert!(permitted.trusted());
    }

    #[test]
    fn test_permit_nested_fields_on_a_map() {
        let spec = Whitelist::new().nested("author", NestedSpec::fields(["name"]));
        let permitted =
            params(json!({"author": {"name": "Frank", "role": "admin"}})).permit(&spec);
        assert_eq!(permitted.to_value(), json!({"author": {"name": "Frank"}}));
        assert!(permitted.get_map("author").unwrap().trusted());
    }

    #[test]
    fn test_permit_nested_fields_on_a_collection() {
        let spec = Whitelist::new().nested("comments", NestedSpec::fields(["body"]));
        let permitted = params(json!({
            "comments": [
                {"body": "first", "spam": true},
                "not a record",
                {"body": "second"},
            ],
        }))
        .permit(&spec);
        assert_eq!(
            permitted.to_value(),
            json!({"comments": [{"body": "first"}, {"body": "second"}]})
        );
    }

    #[test]
    fn test_permit_nested_fields_rejects_scalar_value() {
        let spec = Whitelist::new().nested("comments", NestedSpec::fields(["body"]));
        let permitted = params(json!({"comments": "just text"})).permit(&spec);
        assert!(permitted.is_empty());
    }

    #[test]
    fn test_permit_empty_fields_admits_scalar_list() {
        let spec = Whitelist::new().nested("tag_ids", NestedSpec::fields(Whitelist::new()));
        let permitted = params(json!({"tag_ids": [1, 2, {"evil": true}, 3]})).permit(&spec);
        assert_eq!(permitted.to_value(), json!({"tag_ids": [1, 2, 3]}));
    }

    #[test]
    fn test_permit_empty_fields_rejects_a_map() {
        let spec = Whitelist::new().nested("tag_ids", NestedSpec::fields(Whitelist::new()));
        let permitted = params(json!({"tag_ids": {"0": 1}})).permit(&spec);
        assert!(permitted.is_empty());
    }

    #[test]
    fn test_permit_tree_filters_by_name() {
        let spec = Whitelist::new().nested(
            "preferences",
            NestedSpec::tree(
                Whitelist::new()
                    .nested("display", NestedSpec::fields(["theme"]))
                    .nested("flags", NestedSpec::all()),
            ),
        );
        let permitted = params(json!({
            "preferences": {
                "display": {"theme": "dark", "debug": true},
                "flags": {"beta": {"enabled": true}},
                "secrets": {"token": "xyz"},
            },
        }))
        .permit(&spec);
        assert_eq!(
            permitted.to_value(),
            json!({
                "preferences": {
                    "display": {"theme": "dark"},
                    "flags": {"beta": {"enabled": true}},
                },
            })
        );
    }

    #[test]
    fn test_permit_all_spec_trusts_every_level() {
        let spec = Whitelist::new().nested("metadata", NestedSpec::all());
        let permitted = params(json!({
            "metadata": {"nested": {"deep": {"value": 1}}},
        }))
        .permit(&spec);
        let metadata = permitted.get_map("metadata").unwrap();
        assert!(metadata.trusted());
        assert!(metadata.get_map("nested").unwrap().get_map("deep").unwrap().trusted());
    }

    #[test]
    fn test_permit_all_spec_rejects_non_map() {
        let spec = Whitelist::new().nested("metadata", NestedSpec::all());
        let permitted = params(json!({"metadata": [1, 2]})).permit(&spec);
        assert!(permitted.is_empty());
    }

    #[test]
    fn test_permit_introduces_no_new_keys() {
        let input = params(json!({"title": "Dune"}));
        let spec = Whitelist::new()
            .key("title")
            .key("id")
            .nested("comments", NestedSpec::fields(["body"]));
        let permitted = input.permit(&spec);
        for (key, _) in permitted.iter() {
            assert!(input.contains_key(key));
        }
    }

    #[test]
    fn test_permit_empty_whitelist_yields_trusted_empty() {
        let permitted = params(json!({"anything": 1})).permit(&Whitelist::new());
        assert!(permitted.is_empty());
        assert!(permitted.trusted());
    }

    #[test]
    fn test_require_passes_when_keys_present() {
        let result = params(json!({"title": "Dune", "author": {"name": "Frank"}})).require(
            &Whitelist::new()
                .key("title")
                .nested("author", NestedSpec::fields(["name"])),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_require_reports_first_missing_scalar() {
        let err = params(json!({"year": 1965}))
            .require(&Whitelist::from(["title", "year"]))
            .unwrap_err();
        let ParamsError::MissingRequiredKey { key } = err else {
            panic!("expected missing key");
        };
        assert_eq!(key, "title");
    }

    #[test]
    fn test_require_reports_missing_nested_name() {
        let err = params(json!({"title": "Dune"}))
            .require(
                &Whitelist::new()
                    .key("title")
                    .nested("author", NestedSpec::fields(["name"])),
            )
            .unwrap_err();
        let ParamsError::MissingRequiredKey { key } = err else {
            panic!("expected missing key");
        };
        assert_eq!(key, "author");
    }

    #[test]
    fn test_require_accepts_any_present_value_shape() {
        // Presence is the only contract; the value itself is not inspected.
        let result = params(json!({"title": null})).require(&Whitelist::from(["title"]));
        assert!(result.is_ok());
    }
}
