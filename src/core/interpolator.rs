// src/core/interpolator.rs

use crate::models::VariableTable;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;

lazy_static! {
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is a valid regex");
}

/// Replaces every `{{identifier}}` in `input` with its value from `table`.
///
/// Identifiers are looked up lower-cased. Unknown placeholders are left untouched.
/// The scan is a single left-to-right pass: substituted values are never expanded again.
pub fn substitute<'a>(input: &'a str, table: &VariableTable) -> Cow<'a, str> {
    if table.is_empty() {
        return Cow::Borrowed(input);
    }

    PLACEHOLDER_RE.replace_all(input, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let name = caps.get(1).map_or("", |m| m.as_str());
        match table.get(name) {
            Some(value) => value.to_string(),
            None => {
                log::trace!("Variable '{}' is not defined, leaving placeholder.", name);
                whole.to_string()
            }
        }
    })
}

// MARK: --- UNIT TESTS ---
