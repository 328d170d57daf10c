//! Procedural macros for strong_params
//!
//! This crate provides procedural macros for the strong_params crate:
//! - `whitelist!`: Function-like macro for whitelist declarations
//!
//! These macros are re-exported by the main `strong_params` crate and should
//! typically be used through that interface.
//!
//! # Examples
//!
//! ## Scalar keys
//!
//! ```ignore
//! use strong_params::whitelist;
//!
//! let spec = whitelist![title, year];
//! ```
//!
//! ## Nested records
//!
//! ```ignore
//! use strong_params::whitelist;
//!
//! let spec = whitelist![
//!     title,
//!     comments: [body, rating, replies: [text]],
//! ];
//! ```
//!
//! ## Named trees and permit-everything entries
//!
//! ```ignore
//! use strong_params::whitelist;
//!
//! let spec = whitelist![
//!     preferences: { display: [theme] },
//!     metadata: {},
//! ];
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{braced, bracketed, parse_macro_input, Ident, LitStr, Token};

/// The body of a `whitelist!` invocation: comma-separated entries
struct WhitelistInput {
    entries: Punctuated<Entry, Token![,]>,
}

impl Parse for WhitelistInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        Ok(WhitelistInput {
            entries: Punctuated::parse_terminated(input)?,
        })
    }
}

/// One entry: a bare key, or a name followed by a nested shape
struct Entry {
    name: EntryName,
    spec: Option<EntrySpec>,
}

impl Parse for Entry {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name = input.parse::<EntryName>()?;
        let spec = if input.peek(Token![:]) {
            input.parse::<Token![:]>()?;
            Some(input.parse::<EntrySpec>()?)
        } else {
            None
        };
        Ok(Entry { name, spec })
    }
}

/// Entry names are identifiers, or string literals for names that are not
/// valid Rust identifiers (such as `"_destroy"` or `"type"`)
enum EntryName {
    Ident(Ident),
    Str(LitStr),
}

impl EntryName {
    fn value(&self) -> String {
        match self {
            EntryName::Ident(ident) => ident.to_string(),
            EntryName::Str(lit) => lit.value(),
        }
    }
}

impl Parse for EntryName {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let lookahead = input.lookahead1();
        if lookahead.peek(LitStr) {
            Ok(EntryName::Str(input.parse()?))
        } else if lookahead.peek(Ident) {
            Ok(EntryName::Ident(input.parse()?))
        } else {
            Err(lookahead.error())
        }
    }
}

/// The nested shape after `name:`
enum EntrySpec {
    /// `[fields...]` - a record or collection with these fields
    Fields(WhitelistInput),
    /// `{entries...}` - a map whose entries are whitelisted by name
    Tree(WhitelistInput),
    /// `{}` - a map accepted in full
    All,
}

impl Parse for EntrySpec {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let lookahead = input.lookahead1();
        if lookahead.peek(syn::token::Bracket) {
            let content;
            bracketed!(content in input);
            Ok(EntrySpec::Fields(content.parse()?))
        } else if lookahead.peek(syn::token::Brace) {
            let content;
            braced!(content in input);
            let inner: WhitelistInput = content.parse()?;
            if inner.entries.is_empty() {
                Ok(EntrySpec::All)
            } else {
                Ok(EntrySpec::Tree(inner))
            }
        } else {
            Err(lookahead.error())
        }
    }
}

/// Generate the chained builder expression for one whitelist level
fn expand_whitelist(input: &WhitelistInput) -> TokenStream2 {
    let mut expr = quote! { strong_params::Whitelist::new() };
    for entry in &input.entries {
        let name = entry.name.value();
        expr = match &entry.spec {
            None => quote! { #expr.key(#name) },
            Some(EntrySpec::Fields(inner)) => {
                let fields = expand_whitelist(inner);
                quote! { #expr.nested(#name, strong_params::NestedSpec::Fields(#fields)) }
            }
            Some(EntrySpec::Tree(inner)) => {
                let tree = expand_whitelist(inner);
                quote! { #expr.nested(#name, strong_params::NestedSpec::Tree(#tree)) }
            }
            Some(EntrySpec::All) => {
                quote! { #expr.nested(#name, strong_params::NestedSpec::All) }
            }
        };
    }
    expr
}

/// Function-like macro for whitelist declarations
///
/// Expands to a `strong_params::Whitelist` builder expression, so the
/// result can go anywhere a `Whitelist` can: `permit_params`,
/// `require_params`, or direct `permit` calls.
///
/// # Syntax
///
/// * `name` - a scalar key
/// * `"name"` - a scalar key that is not a valid identifier
/// * `name: [entries...]` - a nested record (or collection of records)
///   with the given fields; entries nest recursively
/// * `name: []` - a plain list of scalar values
/// * `name: {entries...}` - a map whose entries are whitelisted by name
/// * `name: {}` - a map accepted in full
///
/// # Example
///
/// ```ignore
/// use strong_params::prelude::*;
/// use strong_params::whitelist;
///
/// let filters = FilterSet::builder()
///     .permit_params(whitelist![
///         title,
///         year,
///         comments: [body, rating, replies: [text]],
///     ])
///     .build()?;
/// ```
#[proc_macro]
pub fn whitelist(input: TokenStream) -> TokenStream {
    let parsed = parse_macro_input!(input as WhitelistInput);
    expand_whitelist(&parsed).into()
}
