//! Placeholder extraction and interpolation for message templates.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{Result, WaymarkError};
use crate::path::parse;

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

/// Identity of a placeholder: its parsed full path, or the trimmed text when
/// it does not parse.
fn identity(inner: &str) -> String {
    parse(inner)
        .map(|path| path.full_path().to_string())
        .unwrap_or_else(|_| inner.to_string())
}

/// Distinct placeholder paths in `template`, in order of first appearance.
///
/// `"{Town.Name} and { Town.Name }"` yields one `Town.Name`. Blank braces are
/// not placeholders.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER_PATTERN
        .captures_iter(template)
        .filter_map(|caps| {
            let inner = caps[1].trim();
            (!inner.is_empty()).then(|| identity(inner))
        })
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// Substitute resolved values into `template`.
///
/// Fails with the list of placeholders that have no value. Blank braces are
/// left as they are.
pub fn interpolate(template: &str, values: &BTreeMap<String, String>) -> Result<String> {
    let mut unresolved = Vec::new();
    let rendered = PLACEHOLDER_PATTERN.replace_all(template, |caps: &Captures| {
        let inner = caps[1].trim();
        if inner.is_empty() {
            return caps[0].to_string();
        }
        let key = identity(inner);
        match values.get(&key).or_else(|| values.get(inner)) {
            Some(value) => value.clone(),
            None => {
                if !unresolved.contains(&key) {
                    unresolved.push(key);
                }
                caps[0].to_string()
            }
        }
    });

    if unresolved.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(WaymarkError::UnresolvedPlaceholders(unresolved))
    }
}
