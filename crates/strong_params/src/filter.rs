//! Per-action filter declarations and their application
//!
//! A controller declares once, at registration time, which parameters each
//! of its actions accepts. [`FilterSetBuilder`] collects those declarations
//! and [`FilterSetBuilder::build`] compiles them into a [`FilterSet`],
//! validating every whitelist up front so malformed declarations fail at
//! startup instead of mid-request.
//!
//! # Declaration forms
//!
//! How a declaration is applied follows from its whitelist's shape:
//!
//! - **Scoped**: the whitelist has nested record entries (and possibly
//!   scalar keys). The filter runs against the subtree under the
//!   controller's resource key, after nested-form normalization, with
//!   nested entries renamed to `<name>_attributes` and the reserved keys
//!   admitted.
//! - **Root**: the whitelist has [`NestedSpec::Tree`] or
//!   [`NestedSpec::All`] entries and no scalar keys. The filter runs
//!   against the top-level parameters and merges the result back.
//! - **Keys**: the whitelist has scalar keys only. The filter runs against
//!   the resource subtree when one is present, otherwise against the
//!   top-level parameters.
//! - **Everything**: `permit_all_params` trusts the whole tree.
//!
//! # Examples
//!
//! ```rust
//! use strong_params::{FilterSet, NestedSpec, Whitelist};
//!
//! fn example() -> Result<FilterSet, strong_params::ParamsError> {
//!     FilterSet::builder()
//!         .require_params_on_create(["title"])
//!         .permit_params(
//!             Whitelist::new()
//!                 .key("title")
//!                 .key("year")
//!                 .nested("comments", NestedSpec::fields(["body"])),
//!         )
//!         .build()
//! }
//! # example().unwrap();
//! ```

use tracing::{debug, trace};

use crate::error::ParamsError;
use crate::params::Params;
use crate::shape::{attributize, standardize, IndexedFormCheck};
use crate::whitelist::{Whitelist, RESERVED_NESTED_KEYS};

/// The actions write-oriented declarations apply to by default.
const WRITE_ACTIONS: [&str; 2] = ["create", "update"];

/// Whether a declaration drops unlisted parameters or demands presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Keep listed parameters, drop the rest. Never fails.
    Permit,
    /// Fail when a listed parameter is absent. Filters nothing.
    Require,
}

#[derive(Debug, Clone)]
enum FilterMode {
    Scoped { shape: Whitelist },
    Root { shape: Whitelist },
    Keys { shape: Whitelist },
    Everything,
}

#[derive(Debug, Clone)]
struct Filter {
    op: FilterOp,
    actions: Vec<String>,
    mode: FilterMode,
}

#[derive(Debug)]
struct Declaration {
    op: FilterOp,
    actions: Vec<String>,
    spec: Option<Whitelist>,
}

impl Filter {
    fn compile(declaration: Declaration) -> Result<Filter, ParamsError> {
        let Declaration { op, actions, spec } = declaration;
        let Some(spec) = spec else {
            return Ok(Filter {
                op,
                actions,
                mode: FilterMode::Everything,
            });
        };
        let mode = if spec.has_nested() && (spec.has_keys() || spec.all_nested_are_fields()) {
            let mut shape = attributize(&spec)?;
            if op == FilterOp::Permit {
                shape = shape.keys(RESERVED_NESTED_KEYS);
            }
            FilterMode::Scoped { shape }
        } else if spec.has_nested() {
            FilterMode::Root { shape: spec }
        } else {
            FilterMode::Keys { shape: spec }
        };
        Ok(Filter { op, actions, mode })
    }

    fn matches(&self, action: &str) -> bool {
        self.actions.iter().any(|declared| declared == action)
    }

    fn apply(
        &self,
        resource: &str,
        params: &mut Params,
        check: IndexedFormCheck,
    ) -> Result<(), ParamsError> {
        match &self.mode {
            FilterMode::Everything => {
                params.permit_all();
                Ok(())
            }
            FilterMode::Scoped { shape } => {
                let Some(subtree) = params.get_map(resource) else {
                    return self.missing_resource(resource);
                };
                let normalized = standardize(subtree, check);
                let replacement = match self.op {
                    FilterOp::Permit => normalized.permit(shape),
                    FilterOp::Require => {
                        normalized.require(shape)?;
                        normalized
                    }
                };
                params.insert(resource, replacement);
                Ok(())
            }
            FilterMode::Root { shape } => match self.op {
                FilterOp::Permit => {
                    let filtered = params.permit(shape);
                    params.merge(filtered);
                    Ok(())
                }
                FilterOp::Require => params.require(shape),
            },
            FilterMode::Keys { shape } => {
                if let Some(subtree) = params.get_map(resource) {
                    match self.op {
                        FilterOp::Permit => {
                            let replacement = subtree.permit(shape);
                            params.insert(resource, replacement);
                        }
                        FilterOp::Require => subtree.require(shape)?,
                    }
                    Ok(())
                } else {
                    match self.op {
                        FilterOp::Permit => {
                            let filtered = params.permit(shape);
                            *params = filtered;
                            Ok(())
                        }
                        FilterOp::Require => params.require(shape),
                    }
                }
            }
        }
    }

    fn missing_resource(&self, resource: &str) -> Result<(), ParamsError> {
        match self.op {
            FilterOp::Permit => {
                debug!("no `{}` subtree in the request, nothing to filter", resource);
                Ok(())
            }
            FilterOp::Require => Err(ParamsError::MissingRequiredKey {
                key: resource.to_string(),
            }),
        }
    }
}

/// A controller's compiled parameter filters
///
/// Built once per controller through [`FilterSet::builder`] and applied to
/// every matching request. Filters run in declaration order; each sees the
/// output of the one before it.
#[derive(Debug, Clone)]
pub struct FilterSet {
    filters: Vec<Filter>,
    resource: Option<String>,
    check: IndexedFormCheck,
}

impl FilterSet {
    /// Starts a new set of declarations.
    pub fn builder() -> FilterSetBuilder {
        FilterSetBuilder::default()
    }

    /// The resource key declared with [`FilterSetBuilder::resource_name`],
    /// if any.
    pub fn resource_override(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// The indexed-form detection mode the set was built with.
    pub fn indexed_form_check(&self) -> IndexedFormCheck {
        self.check
    }

    /// Number of compiled filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if no filters were declared.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs every filter matching `action` against `params`, in
    /// declaration order, scoping to `resource` where the declaration
    /// calls for it.
    ///
    /// `permit` declarations rewrite `params` in place; `require`
    /// declarations fail with [`ParamsError::MissingRequiredKey`] when a
    /// demanded key is absent, leaving `params` as the previous filter
    /// left them.
    pub fn apply(
        &self,
        action: &str,
        resource: &str,
        params: &mut Params,
    ) -> Result<(), ParamsError> {
        for filter in self.filters.iter().filter(|filter| filter.matches(action)) {
            trace!("applying {:?} filter for action `{}`", filter.op, action);
            filter.apply(resource, params, self.check)?;
        }
        Ok(())
    }
}

/// Collects filter declarations for one controller
///
/// All declaration methods are chainable. `permit_params` and
/// `require_params` cover both `create` and `update`; the `_on_create` and
/// `_on_update` variants narrow a declaration to one action.
#[derive(Debug, Default)]
pub struct FilterSetBuilder {
    declarations: Vec<Declaration>,
    resource: Option<String>,
    check: IndexedFormCheck,
}

impl FilterSetBuilder {
    fn declare(mut self, op: FilterOp, actions: &[&str], spec: Option<Whitelist>) -> Self {
        self.declarations.push(Declaration {
            op,
            actions: actions.iter().map(|action| action.to_string()).collect(),
            spec,
        });
        self
    }

    /// Permits `spec` on `create` and `update`.
    pub fn permit_params(self, spec: impl Into<Whitelist>) -> Self {
        self.declare(FilterOp::Permit, &WRITE_ACTIONS, Some(spec.into()))
    }

    /// Permits `spec` on `create` only.
    pub fn permit_params_on_create(self, spec: impl Into<Whitelist>) -> Self {
        self.declare(FilterOp::Permit, &["create"], Some(spec.into()))
    }

    /// Permits `spec` on `update` only.
    pub fn permit_params_on_update(self, spec: impl Into<Whitelist>) -> Self {
        self.declare(FilterOp::Permit, &["update"], Some(spec.into()))
    }

    /// Requires the keys in `spec` on `create` and `update`.
    pub fn require_params(self, spec: impl Into<Whitelist>) -> Self {
        self.declare(FilterOp::Require, &WRITE_ACTIONS, Some(spec.into()))
    }

    /// Requires the keys in `spec` on `create` only.
    pub fn require_params_on_create(self, spec: impl Into<Whitelist>) -> Self {
        self.declare(FilterOp::Require, &["create"], Some(spec.into()))
    }

    /// Requires the keys in `spec` on `update` only.
    pub fn require_params_on_update(self, spec: impl Into<Whitelist>) -> Self {
        self.declare(FilterOp::Require, &["update"], Some(spec.into()))
    }

    /// Trusts the entire parameter tree on `create` and `update`.
    pub fn permit_all_params(self) -> Self {
        self.declare(FilterOp::Permit, &WRITE_ACTIONS, None)
    }

    /// Trusts the entire parameter tree on the given actions.
    pub fn permit_all_params_on<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declarations.push(Declaration {
            op: FilterOp::Permit,
            actions: actions.into_iter().map(Into::into).collect(),
            spec: None,
        });
        self
    }

    /// Overrides the resource key scoped declarations apply under.
    ///
    /// Without this, the key is derived from the controller name at
    /// registration.
    pub fn resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource = Some(name.into());
        self
    }

    /// Selects how indexed-form maps are detected during normalization.
    pub fn indexed_form_check(mut self, check: IndexedFormCheck) -> Self {
        self.check = check;
        self
    }

    /// Compiles the declarations into a [`FilterSet`].
    ///
    /// Fails with [`ParamsError::MalformedWhitelist`] when a declaration
    /// cannot be compiled, for example a whitelist mixing scalar keys with
    /// a [`crate::NestedSpec::Tree`] entry.
    pub fn build(self) -> Result<FilterSet, ParamsError> {
        let mut filters = Vec::with_capacity(self.declarations.len());
        for declaration in self.declarations {
            filters.push(Filter::compile(declaration)?);
        }
        Ok(FilterSet {
            filters,
            resource: self.resource,
            check: self.check,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::whitelist::NestedSpec;
    use serde_json::json;

    fn params(body: serde_json::Value) -> Params {
        Params::from_value(body)
    }

    fn book_filters() -> FilterSet {
        FilterSet::builder()
            .permit_params(
                Whitelist::new()
                    .key("title")
                    .key("year")
                    .nested("comments", NestedSpec::fields(["body"])),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_scoped_permit_filters_resource_subtree() {
        let mut request = params(json!({
            "book": {
                "title": "Dune",
                "year": 1965,
                "admin": true,
                "comments_attributes": [
                    {"body": "great", "id": 7, "_destroy": "1", "spam": true},
                ],
            },
            "format": "json",
        }));
        book_filters().apply("create", "book", &mut request).unwrap();
        assert_eq!(
            request.to_value(),
            json!({
                "book": {
                    "title": "Dune",
                    "year": 1965,
                    "comments_attributes": [
                        {"body": "great", "id": 7, "_destroy": "1"},
                    ],
                },
                "format": "json",
            })
        );
        assert!(request.get_map("book").unwrap().trusted());
    }

    #[test]
    fn test_scoped_permit_normalizes_indexed_forms() {
        let mut request = params(json!({
            "book": {
                "title": "Dune",
                "comments_attributes": {
                    "0": {"body": "first"},
                    "new_1": {"body": "draft"},
                },
            },
        }));
        book_filters().apply("update", "book", &mut request).unwrap();
        assert_eq!(
            request.get_map("book").unwrap().to_value(),
            json!({
                "title": "Dune",
                "comments_attributes": [{"body": "first"}, {"body": "draft"}],
            })
        );
    }

    #[test]
    fn test_scoped_permit_missing_resource_is_a_no_op() {
        let mut request = params(json!({"format": "json"}));
        book_filters().apply("create", "book", &mut request).unwrap();
        assert_eq!(request.to_value(), json!({"format": "json"}));
    }

    #[test]
    fn test_scoped_require_passes_and_filters_nothing() {
        let set = FilterSet::builder()
            .require_params(
                Whitelist::new()
                    .key("title")
                    .nested("comments", NestedSpec::fields(["body"])),
            )
            .build()
            .unwrap();
        let mut request = params(json!({
            "book": {
                "title": "Dune",
                "admin": true,
                "comments_attributes": [{"body": "x"}],
            },
        }));
        set.apply("create", "book", &mut request).unwrap();
        // Require normalizes shape but keeps undeclared keys.
        assert_eq!(
            request.get_map("book").unwrap().to_value(),
            json!({
                "title": "Dune",
                "admin": true,
                "comments_attributes": [{"body": "x"}],
            })
        );
    }

    #[test]
    fn test_scoped_require_demands_renamed_nested_name() {
        let set = FilterSet::builder()
            .require_params(
                Whitelist::new()
                    .key("title")
                    .nested("comments", NestedSpec::fields(["body"])),
            )
            .build()
            .unwrap();
        let mut request = params(json!({
            "book": {"title": "Dune", "comments": [{"body": "x"}]},
        }));
        let err = set.apply("create", "book", &mut request).unwrap_err();
        let ParamsError::MissingRequiredKey { key } = err else {
            panic!("expected missing key");
        };
        assert_eq!(key, "comments_attributes");
    }

    #[test]
    fn test_scoped_require_missing_resource_fails_with_resource_key() {
        let set = FilterSet::builder()
            .require_params(Whitelist::new().nested("comments", NestedSpec::fields(["body"])))
            .build()
            .unwrap();
        let mut request = params(json!({"format": "json"}));
        let err = set.apply("create", "book", &mut request).unwrap_err();
        let ParamsError::MissingRequiredKey { key } = err else {
            panic!("expected missing key");
        };
        assert_eq!(key, "book");
    }

    #[test]
    fn test_keys_only_filters_under_resource_when_present() {
        let set = FilterSet::builder()
            .permit_params(["title"])
            .build()
            .unwrap();
        let mut request = params(json!({
            "book": {"title": "Dune", "admin": true},
            "format": "json",
        }));
        set.apply("create", "book", &mut request).unwrap();
        assert_eq!(
            request.to_value(),
            json!({"book": {"title": "Dune"}, "format": "json"})
        );
    }

    #[test]
    fn test_keys_only_falls_back_to_top_level() {
        let set = FilterSet::builder()
            .permit_params(["q", "page"])
            .build()
            .unwrap();
        let mut request = params(json!({"q": "dune", "page": 2, "debug": true}));
        set.apply("create", "search", &mut request).unwrap();
        assert_eq!(request.to_value(), json!({"q": "dune", "page": 2}));
        assert!(request.trusted());
    }

    #[test]
    fn test_keys_only_require_at_top_level() {
        let set = FilterSet::builder()
            .require_params(["q"])
            .build()
            .unwrap();
        let mut request = params(json!({"page": 2}));
        let err = set.apply("create", "search", &mut request).unwrap_err();
        assert!(matches!(err, ParamsError::MissingRequiredKey { .. }));
    }

    #[test]
    fn test_root_mode_merges_filtered_entries_back() {
        let set = FilterSet::builder()
            .permit_params(
                Whitelist::new()
                    .nested("preferences", NestedSpec::tree(
                        Whitelist::new().nested("display", NestedSpec::fields(["theme"])),
                    ))
                    .nested("metadata", NestedSpec::all()),
            )
            .build()
            .unwrap();
        let mut request = params(json!({
            "preferences": {"display": {"theme": "dark", "debug": true}},
            "metadata": {"anything": {"goes": 1}},
            "format": "json",
        }));
        set.apply("update", "setting", &mut request).unwrap();
        assert_eq!(
            request.to_value(),
            json!({
                "preferences": {"display": {"theme": "dark"}},
                "metadata": {"anything": {"goes": 1}},
                "format": "json",
            })
        );
    }

    #[test]
    fn test_build_rejects_keys_mixed_with_tree() {
        let result = FilterSet::builder()
            .permit_params(
                Whitelist::new()
                    .key("title")
                    .nested("metadata", NestedSpec::all()),
            )
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ParamsError::MalformedWhitelist { .. }
        ));
    }

    #[test]
    fn test_action_scoping() {
        let set = FilterSet::builder()
            .permit_params_on_create(["title"])
            .build()
            .unwrap();
        let mut request = params(json!({"title": "Dune", "admin": true}));
        set.apply("update", "book", &mut request).unwrap();
        // No filter matched update, so nothing changed.
        assert_eq!(request.to_value(), json!({"title": "Dune", "admin": true}));
        assert!(!request.trusted());
    }

    #[test]
    fn test_filters_apply_in_declaration_order() {
        let set = FilterSet::builder()
            .permit_params(["title", "year"])
            .permit_params(["title"])
            .build()
            .unwrap();
        let mut request = params(json!({"title": "Dune", "year": 1965}));
        set.apply("create", "search", &mut request).unwrap();
        // The second filter sees the first one's output.
        assert_eq!(request.to_value(), json!({"title": "Dune"}));
    }

    #[test]
    fn test_require_after_permit_sees_filtered_params() {
        let set = FilterSet::builder()
            .permit_params(["title"])
            .require_params(["year"])
            .build()
            .unwrap();
        let mut request = params(json!({"title": "Dune", "year": 1965}));
        let err = set.apply("create", "search", &mut request).unwrap_err();
        let ParamsError::MissingRequiredKey { key } = err else {
            panic!("expected missing key");
        };
        assert_eq!(key, "year");
    }

    #[test]
    fn test_permit_all_params_trusts_everything() {
        let set = FilterSet::builder().permit_all_params().build().unwrap();
        let mut request = params(json!({"anything": {"deeply": {"nested": 1}}}));
        set.apply("create", "blob", &mut request).unwrap();
        assert!(request.trusted());
        assert!(request
            .get_map("anything")
            .unwrap()
            .get_map("deeply")
            .unwrap()
            .trusted());
    }

    #[test]
    fn test_permit_all_params_on_custom_actions() {
        let set = FilterSet::builder()
            .permit_all_params_on(["import"])
            .build()
            .unwrap();
        let mut request = params(json!({"rows": [{"a": 1}]}));
        set.apply("create", "batch", &mut request).unwrap();
        assert!(!request.trusted());
        set.apply("import", "batch", &mut request).unwrap();
        assert!(request.trusted());
    }

    #[test]
    fn test_first_key_check_flows_through() {
        let set = FilterSet::builder()
            .permit_params(Whitelist::new().nested("comments", NestedSpec::fields(["body"])))
            .indexed_form_check(IndexedFormCheck::FirstKey)
            .build()
            .unwrap();
        let mut request = params(json!({
            "book": {
                "comments_attributes": {"0": {"body": "x"}, "oops": {"body": "y"}},
            },
        }));
        set.apply("create", "book", &mut request).unwrap();
        let comments = request
            .get_map("book")
            .unwrap()
            .get("comments_attributes")
            .unwrap();
        assert!(comments.is_array());
    }

    #[test]
    fn test_resource_override_is_exposed() {
        let set = FilterSet::builder()
            .resource_name("library_book")
            .permit_params(["title"])
            .build()
            .unwrap();
        assert_eq!(set.resource_override(), Some("library_book"));
        assert_eq!(set.len(), 1);
    }
}
