//! Placeholder extraction
//!
//! RimWorld strings carry brace-delimited placeholders such as `{0}` or
//! `{PAWN_nameDef}` that the game fills in at runtime. They have to survive
//! translation untouched, so every stage of the pipeline starts by finding
//! them.

use indexmap::IndexSet;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `{`, one or more non-`}` characters, `}`
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]+\}").expect("valid placeholder regex"));

/// Distinct placeholder tokens found in a string
///
/// Iteration follows first occurrence in the source string. A token that
/// appears several times is tracked once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderSet(IndexSet<String>);

impl PlaceholderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        self.0.insert(token.into())
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first token extracted, if any
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Tokens of this set that do not occur literally in `text`
    pub fn missing_from<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> {
        self.iter().filter(move |token| !text.contains(token))
    }

    /// True when every token occurs literally in `text`
    pub fn all_present_in(&self, text: &str) -> bool {
        self.missing_from(text).next().is_none()
    }
}

impl<S: Into<String>> FromIterator<S> for PlaceholderSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Extract the distinct placeholders of `text`
///
/// # Example
///
/// ```ignore
/// let set = extract_placeholders("{0} of {1}, then {0} again");
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.first(), Some("{0}"));
/// ```
pub fn extract_placeholders(text: &str) -> PlaceholderSet {
    PLACEHOLDER_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

pub fn has_placeholders(text: &str) -> bool {
    PLACEHOLDER_RE.is_match(text)
}

/// Replace every placeholder in `text` with `replacement`
pub fn strip_placeholders(text: &str, replacement: &str) -> String {
    PLACEHOLDER_RE
        .replace_all(text, NoExpand(replacement))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_numeric_and_named() {
        let set = extract_placeholders("Hello {name}, you found {0} items");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["{name}", "{0}"]);
    }

    #[test]
    fn test_extract_collapses_duplicates() {
        let set = extract_placeholders("{0} and {0} and {1} and {0}");
        assert_eq!(set.len(), 2);
        assert_eq!(set.first(), Some("{0}"));
        assert!(set.contains("{1}"));
    }

    #[test]
    fn test_extract_nothing() {
        assert!(extract_placeholders("plain text").is_empty());
        assert!(extract_placeholders("").is_empty());
    }

    #[test]
    fn test_empty_braces_are_not_placeholders() {
        assert!(extract_placeholders("{} and {}").is_empty());
    }

    #[test]
    fn test_nested_opening_brace_is_part_of_token() {
        let set = extract_placeholders("{{PAWN}}");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["{{PAWN}"]);
    }

    #[test]
    fn test_rimworld_style_tokens() {
        let set = extract_placeholders("{PAWN_nameDef} hits {1_labelShort}");
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec!["{PAWN_nameDef}", "{1_labelShort}"]
        );
    }

    #[test]
    fn test_missing_from() {
        let set = extract_placeholders("{0} {name}");
        assert_eq!(set.missing_from("{0} only").collect::<Vec<_>>(), vec!["{name}"]);
        assert!(set.all_present_in("{name} and {0}"));
    }

    #[test]
    fn test_strip_and_detect() {
        assert!(has_placeholders("a {x} b"));
        assert!(!has_placeholders("a b"));
        assert_eq!(strip_placeholders("a {x} b {y}", " "), "a   b  ");
    }

    #[test]
    fn test_serde_as_list() {
        let set = extract_placeholders("{0} {1}");
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["{0}","{1}"]"#);
        let back: PlaceholderSet = serde_json::from_str(r#"["{0}","{1}"]"#).unwrap();
        assert_eq!(back, set);
    }
}
