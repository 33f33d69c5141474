//! Path expression parser.

use super::PathExpression;
use crate::error::{Result, WaymarkError};

/// Parse a raw placeholder string into a [`PathExpression`].
///
/// Surrounding whitespace is ignored. Braces are optional but must be
/// balanced: `{Town.Name}` and `Town.Name` parse to the same path, while
/// `{Town.Name` is rejected. Whitespace inside the braces is an invalid
/// character.
///
/// # Example
///
/// ```
/// use waymark::path::parse;
///
/// let path = parse("{District.Town.Name}").unwrap();
/// assert_eq!(path.full_path(), "District.Town.Name");
/// assert_eq!(path.depth(), 2);
/// ```
pub fn parse(raw: &str) -> Result<PathExpression> {
    parse_inner(raw, None)
}

/// Like [`parse`], additionally rejecting paths deeper than `max_depth`.
pub fn parse_with_max_depth(raw: &str, max_depth: usize) -> Result<PathExpression> {
    parse_inner(raw, Some(max_depth))
}

fn parse_inner(raw: &str, max_depth: Option<usize>) -> Result<PathExpression> {
    let body = strip_braces(raw)?;

    if body.is_empty() {
        return Err(WaymarkError::malformed(raw, "path is empty"));
    }

    if let Some(bad) = body
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.'))
    {
        return Err(WaymarkError::malformed(
            raw,
            format!("invalid character '{}'", bad),
        ));
    }

    let mut segments = Vec::new();
    for segment in body.split('.') {
        validate_segment(raw, segment)?;
        segments.push(segment.to_string());
    }

    if segments.is_empty() {
        return Err(WaymarkError::malformed(raw, "path has no segments"));
    }

    if let Some(max) = max_depth {
        let depth = segments.len() - 1;
        if depth > max {
            return Err(WaymarkError::malformed(
                raw,
                format!("depth {} exceeds the maximum of {}", depth, max),
            ));
        }
    }

    Ok(PathExpression::from_segments(segments))
}

fn strip_braces(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    let opens = trimmed.starts_with('{');
    let closes = trimmed.ends_with('}');

    match (opens, closes) {
        (true, true) if trimmed.len() >= 2 => Ok(&trimmed[1..trimmed.len() - 1]),
        (false, false) => Ok(trimmed),
        _ => Err(WaymarkError::malformed(raw, "unbalanced braces")),
    }
}

fn validate_segment(raw: &str, segment: &str) -> Result<()> {
    let mut chars = segment.chars();
    match chars.next() {
        None => Err(WaymarkError::malformed(raw, "empty path segment")),
        Some(first) if first.is_ascii_digit() => Err(WaymarkError::malformed(
            raw,
            format!("segment '{}' starts with a digit", segment),
        )),
        Some(_) => Ok(()),
    }
}
