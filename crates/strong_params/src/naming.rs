//! Resource name resolution for controllers
//!
//! Registering `Admin::BooksController` scopes its filters under the `book`
//! key. The chain is: strip the `Controller` suffix, take the last
//! namespace segment, underscore it, singularize it. Controllers whose
//! resource key does not follow the convention override it at registration
//! instead.

/// Derives the parameter key a controller's filters scope to.
///
/// Accepts both `::` and `/` as namespace separators, so
/// `Admin::BooksController` and `admin/books_controller` resolve the same
/// way.
///
/// # Examples
///
/// ```rust
/// use strong_params::resource_name_for;
///
/// assert_eq!(resource_name_for("BooksController"), "book");
/// assert_eq!(resource_name_for("Admin::CategoriesController"), "category");
/// assert_eq!(resource_name_for("PeopleController"), "person");
/// ```
pub fn resource_name_for(controller: &str) -> String {
    let base = controller
        .strip_suffix("Controller")
        .or_else(|| controller.strip_suffix("_controller"))
        .unwrap_or(controller);
    let segment = base
        .rsplit("::")
        .next()
        .and_then(|tail| tail.rsplit('/').next())
        .unwrap_or(base);
    singularize(&underscore(segment))
}

/// Converts a camel-cased name to snake case.
///
/// Word boundaries fall after a lowercase letter or digit, and at the end
/// of an acronym run, so `HTMLPages` becomes `html_pages`.
pub fn underscore(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let after_word = i
                .checked_sub(1)
                .map(|prev| chars[prev].is_ascii_lowercase() || chars[prev].is_ascii_digit())
                .unwrap_or(false);
            let acronym_end = i
                .checked_sub(1)
                .map(|prev| chars[prev].is_ascii_uppercase())
                .unwrap_or(false)
                && chars
                    .get(i + 1)
                    .map(|next| next.is_ascii_lowercase())
                    .unwrap_or(false);
            if after_word || acronym_end {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Reduces a plural noun to its singular form.
///
/// Covers the conventional English plurals controller names use, plus the
/// irregulars that actually show up in resource routes. Names that are not
/// recognizably plural pass through unchanged.
pub fn singularize(word: &str) -> String {
    const IRREGULAR: [(&str, &str); 4] = [
        ("people", "person"),
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
    ];
    for (plural, singular) in IRREGULAR {
        if word == plural {
            return singular.to_string();
        }
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    if word.ends_with("ses")
        || word.ends_with("xes")
        || word.ends_with("zes")
        || word.ends_with("ches")
        || word.ends_with("shes")
    {
        return word[..word.len() - 2].to_string();
    }
    if word.ends_with('s') && !word.ends_with("ss") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}
