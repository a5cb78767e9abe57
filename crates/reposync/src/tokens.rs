//! Splitting of comma/whitespace separated request lists.

use std::collections::HashSet;
use std::hash::Hash;

use crate::coordinate::{ArtifactCoordinate, CoordinateError, ExtraCoordinate};

/// Tokens separated by commas or runs of whitespace. Empty tokens are
/// dropped.
pub fn split_tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

/// Remove duplicates, keeping the first occurrence of each item in place.
pub fn dedup_preserving_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Parse a list such as `"g:a:1.0, g:b:jar:sources:2.0"`.
pub fn parse_artifacts(s: &str) -> Result<Vec<ArtifactCoordinate>, CoordinateError> {
    let parsed = split_tokens(s)
        .map(str::parse)
        .collect::<Result<Vec<ArtifactCoordinate>, _>>()?;
    Ok(dedup_preserving_order(parsed))
}

/// Parse a list such as `"jar:sources jar:javadoc"`.
pub fn parse_extras(s: &str) -> Result<Vec<ExtraCoordinate>, CoordinateError> {
    let parsed = split_tokens(s)
        .map(str::parse)
        .collect::<Result<Vec<ExtraCoordinate>, _>>()?;
    Ok(dedup_preserving_order(parsed))
}
