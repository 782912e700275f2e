//! Alternative translation candidates
//!
//! When the source looks like an identifier, the operator may want the
//! translation in the same shape: `fire_damage` → `daño_fuego`, or
//! `fireDamage` → `dañoFuego`. Candidates are built from the words of the
//! literal translation; nothing is ranked and the literal translation always
//! comes first.

use crate::masking::SentinelTable;
use crate::naming::NamingPattern;
use indexmap::IndexSet;
use regex::Regex;
use rimlang::placeholder::{PlaceholderSet, strip_placeholders};
use std::sync::LazyLock;

/// Anything that is neither a word character nor whitespace
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation regex"));

/// A translation and the other admissible spellings of it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationResult {
    /// Literal translation, with placeholders restored
    pub text: String,
    /// Pattern-preserving candidates in generation order
    pub alternatives: Vec<String>,
}

impl TranslationResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            alternatives: Vec::new(),
        }
    }

    /// Literal translation first, then the alternatives, without duplicates
    pub fn candidates(&self) -> Vec<&str> {
        let unique: IndexSet<&str> = std::iter::once(self.text.as_str())
            .chain(self.alternatives.iter().map(String::as_str))
            .collect();
        unique.into_iter().collect()
    }

    /// The default choice when the operator does not pick one
    pub fn preferred(&self) -> &str {
        &self.text
    }

    pub fn has_alternatives(&self) -> bool {
        self.candidates().len() > 1
    }
}

/// Append every placeholder missing from `translated` as ` ({p})`
///
/// A weak repair: the placeholder survives, but not where it belongs.
pub fn repair_placeholders(translated: &str, placeholders: &PlaceholderSet) -> String {
    let mut repaired = translated.to_string();
    for placeholder in placeholders.iter() {
        if !repaired.contains(placeholder) {
            repaired.push_str(&format!(" ({})", placeholder));
        }
    }
    repaired
}

fn trim_to_letters(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphabetic())
}

/// Usable words of a translation: punctuation becomes a break, each word is
/// trimmed to its outermost letters and words of one character are dropped
fn usable_words(text: &str) -> Vec<String> {
    PUNCTUATION_RE
        .replace_all(text, " ")
        .split_whitespace()
        .map(trim_to_letters)
        .filter(|word| word.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// First letter upper-cased, the rest lower-cased
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn snake_candidate(words: &[String], pattern: &NamingPattern) -> Option<String> {
    let wanted = pattern.parts.len();
    if words.len() < wanted {
        return None;
    }
    let parts: Vec<&str> = words[..wanted]
        .iter()
        .map(|word| trim_to_letters(word))
        .filter(|word| !word.is_empty())
        .collect();
    (parts.len() == wanted).then(|| parts.join("_"))
}

fn camel_candidate(words: &[String]) -> Option<String> {
    if words.len() < 2 {
        return None;
    }
    let mut joined = words[0].to_lowercase();
    for word in &words[1..] {
        joined.push_str(&capitalize(word));
    }
    Some(joined)
}

/// Build the pattern-preserving candidates for `translated`
///
/// Only sources with no placeholders, or with snake_case or CamelCase
/// structure, produce candidates. The result holds neither duplicates nor
/// blank strings; it may repeat the literal translation, which
/// [`TranslationResult::candidates`] folds away.
///
/// # Arguments
///
/// * `translated` - Literal translation, placeholders already restored
/// * `pattern` - Result of [`crate::naming::analyze`] on the source
/// * `placeholders` - Placeholders of the source
/// * `table` - Sentinel table used to restore leftover sentinel words
///
/// # Example
///
/// ```ignore
/// let pattern = naming::analyze("fire_damage");
/// let alternatives = generate_alternatives(
///     "daño por fuego",
///     &pattern,
///     &PlaceholderSet::new(),
///     &SentinelTable::standard(),
/// );
/// assert_eq!(alternatives, vec!["daño_por"]);
/// ```
pub fn generate_alternatives(
    translated: &str,
    pattern: &NamingPattern,
    placeholders: &PlaceholderSet,
    table: &SentinelTable,
) -> Vec<String> {
    let translated = if placeholders.all_present_in(translated) {
        translated.to_string()
    } else {
        repair_placeholders(translated, placeholders)
    };

    if !(placeholders.is_empty() || pattern.is_snake_case() || pattern.is_camel_case()) {
        return Vec::new();
    }

    let words = usable_words(&strip_placeholders(&translated, " "));
    if words.is_empty() {
        return Vec::new();
    }

    let mut alternatives: IndexSet<String> = IndexSet::new();
    if pattern.is_snake_case() {
        if let Some(candidate) = snake_candidate(&words, pattern) {
            alternatives.insert(table.unmask(&candidate, placeholders));
        }
    }
    if pattern.is_camel_case() {
        if let Some(candidate) = camel_candidate(&words) {
            alternatives.insert(table.unmask(&candidate, placeholders));
        }
    }

    alternatives
        .into_iter()
        .filter(|alternative| !alternative.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::analyze;
    use rimlang::placeholder::extract_placeholders;

    fn alternatives_for(original: &str, translated: &str) -> Vec<String> {
        generate_alternatives(
            translated,
            &analyze(original),
            &extract_placeholders(original),
            &SentinelTable::standard(),
        )
    }

    // ========== Snake Case Tests ==========

    #[test]
    fn test_snake_case_takes_leading_words() {
        assert_eq!(alternatives_for("fire_damage", "daño por fuego"), vec!["daño_por"]);
    }

    #[test]
    fn test_snake_case_needs_enough_words() {
        // "x" is too short, which leaves one usable word for two parts
        assert!(alternatives_for("fire_damage", "fuego x").is_empty());
    }

    #[test]
    fn test_snake_case_counts_empty_parts() {
        // `a__b` has three parts, so three usable words are needed
        assert_eq!(alternatives_for("a__b", "uno dos tres"), vec!["uno_dos_tres"]);
        assert!(alternatives_for("a__b", "uno dos").is_empty());
    }

    // ========== Camel Case Tests ==========

    #[test]
    fn test_camel_case_rejoin() {
        assert_eq!(
            alternatives_for("fireDamage", "Daño por FUEGO"),
            vec!["dañoPorFuego"]
        );
    }

    #[test]
    fn test_camel_case_single_word_has_no_candidate() {
        assert!(alternatives_for("fireDamage", "incendio").is_empty());
    }

    #[test]
    fn test_punctuation_and_short_tokens_dropped() {
        assert_eq!(
            alternatives_for("fireDamage", "¡daño, a fuego!"),
            vec!["dañoFuego"]
        );
    }

    // ========== Gating Tests ==========

    #[test]
    fn test_spaced_and_atomic_sources_have_no_candidates() {
        assert!(alternatives_for("Fire Damage", "daño por fuego").is_empty());
        assert!(alternatives_for("fire", "fuego").is_empty());
    }

    #[test]
    fn test_spaced_source_with_placeholders_is_skipped() {
        assert!(alternatives_for("Hello {name} there", "Hola {name} allí").is_empty());
    }

    #[test]
    fn test_snake_source_with_placeholders_strips_them() {
        assert_eq!(
            alternatives_for("{0}_fire_damage", "{0} daño fuego extra"),
            vec!["daño_fuego_extra"]
        );
    }

    // ========== Repair Tests ==========

    #[test]
    fn test_repair_appends_missing_placeholders() {
        let placeholders = extract_placeholders("{0} of {name}");
        assert_eq!(
            repair_placeholders("de {name}", &placeholders),
            "de {name} ({0})"
        );
        assert_eq!(repair_placeholders("{0} {name}", &placeholders), "{0} {name}");
    }

    // ========== TranslationResult Tests ==========

    #[test]
    fn test_candidates_literal_first_and_deduplicated() {
        let result = TranslationResult {
            text: "daño_fuego".to_string(),
            alternatives: vec!["daño_fuego".to_string(), "dañoFuego".to_string()],
        };
        assert_eq!(result.candidates(), vec!["daño_fuego", "dañoFuego"]);
        assert_eq!(result.preferred(), "daño_fuego");
        assert!(result.has_alternatives());
        assert!(!TranslationResult::new("x").has_alternatives());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("fUEGO"), "Fuego");
        assert_eq!(capitalize("ñandú"), "Ñandú");
        assert_eq!(capitalize(""), "");
    }
}
