//! Placeholder masking around a translation provider
//!
//! Providers mangle `{name}`-style placeholders: they translate the word
//! inside, drop the braces, or move them around. Before sending, each
//! well-known placeholder is swapped for an all-caps sentinel word that
//! translators leave alone (`{name}` → `NOMBRE`), and every other
//! placeholder becomes the generic sentinel `ELEMENTO`. After translation
//! the sentinels are swapped back.
//!
//! The generic sentinel is lossy: every `ELEMENTO` is restored as the
//! *first* placeholder of the source string, so a string with two unknown
//! placeholders comes back with the first one repeated.
//!
//! # Example
//!
//! ```ignore
//! let table = SentinelTable::standard();
//! let masked = table.mask("Hello {name}, you found {0} items");
//! assert_eq!(masked, "Hello  NOMBRE , you found  PRIMER_ELEMENTO  items");
//! ```

use crate::error::MtResult;
use crate::translator::MachineTranslator;
use async_trait::async_trait;
use rimlang::placeholder::{PlaceholderSet, extract_placeholders, strip_placeholders};
use std::sync::Arc;
use tracing::debug;

/// Sentinel for placeholders that are not in the table
pub const GENERIC_SENTINEL: &str = "ELEMENTO";

/// Restored in place of the generic sentinel when the source had no placeholders
pub const EMPTY_PLACEHOLDER: &str = "{}";

/// Longest masked text sent to the provider, in characters
pub const MAX_REQUEST_CHARS: usize = 4900;

const STANDARD_ENTRIES: &[(&str, &str)] = &[
    ("{0}", "PRIMER_ELEMENTO"),
    ("{1}", "SEGUNDO_ELEMENTO"),
    ("{2}", "TERCER_ELEMENTO"),
    ("{3}", "CUARTO_ELEMENTO"),
    ("{name}", "NOMBRE"),
    ("{pawn}", "PERSONAJE"),
    ("{item}", "OBJETO"),
    ("{number}", "NUMERO"),
    ("{amount}", "CANTIDAD"),
    ("{gender}", "GENERO"),
    ("{faction}", "FACCIÓN"),
    ("{location}", "UBICACIÓN"),
    ("{time}", "TIEMPO"),
];

const EXTENDED_ENTRIES: &[(&str, &str)] = &[
    ("{0}", "PRIMER_ELEMENTO"),
    ("{1}", "SEGUNDO_ELEMENTO"),
    ("{2}", "TERCER_ELEMENTO"),
    ("{3}", "CUARTO_ELEMENTO"),
    ("{name}", "NOMBRE"),
    ("{pawn}", "PERSONAJE"),
    ("{item}", "OBJETO"),
    ("{number}", "NUMERO"),
    ("{amount}", "CANTIDAD"),
    ("{gender}", "GENERO"),
    ("{faction}", "FACCIÓN"),
    ("{location}", "UBICACIÓN"),
    ("{time}", "TIEMPO"),
    ("{skill}", "HABILIDAD"),
    ("{bodypart}", "PARTE_CUERPO"),
    ("{animal}", "ANIMAL"),
    ("{weapon}", "ARMA"),
    ("{material}", "MATERIAL"),
];

/// Two-way mapping between well-known placeholders and sentinel words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelTable {
    entries: &'static [(&'static str, &'static str)],
}

impl Default for SentinelTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl SentinelTable {
    /// Positional `{0}`..`{3}` and the nine common named placeholders
    pub const fn standard() -> Self {
        Self {
            entries: STANDARD_ENTRIES,
        }
    }

    /// The standard table plus skill, body part, animal, weapon and material
    pub const fn extended() -> Self {
        Self {
            entries: EXTENDED_ENTRIES,
        }
    }

    /// `(placeholder, sentinel)` pairs in table order
    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        self.entries
    }

    pub fn sentinel_for(&self, placeholder: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(p, _)| *p == placeholder)
            .map(|(_, s)| *s)
    }

    pub fn placeholder_for(&self, sentinel: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, s)| *s == sentinel)
            .map(|(p, _)| *p)
    }

    /// Replace placeholders with space-padded sentinel words
    pub fn mask(&self, text: &str) -> String {
        let mut masked = text.to_string();
        for (placeholder, sentinel) in self.entries {
            if masked.contains(placeholder) {
                masked = masked.replace(placeholder, &format!(" {} ", sentinel));
            }
        }
        strip_placeholders(&masked, &format!(" {} ", GENERIC_SENTINEL))
    }

    /// Replace sentinel words with the placeholders they stand for
    ///
    /// Specific sentinels are restored first; whatever `ELEMENTO` remains
    /// becomes the first placeholder of `placeholders`, or `{}` if it is
    /// empty. Padding spaces added by [`SentinelTable::mask`] are kept.
    pub fn unmask(&self, text: &str, placeholders: &PlaceholderSet) -> String {
        let mut restored = text.to_string();
        for (placeholder, sentinel) in self.entries {
            if restored.contains(sentinel) {
                restored = restored.replace(sentinel, placeholder);
            }
        }
        let generic = placeholders.first().unwrap_or(EMPTY_PLACEHOLDER);
        restored.replace(GENERIC_SENTINEL, generic)
    }

    /// True if any sentinel word of this table, or the generic one, occurs in `text`
    pub fn contains_sentinel(&self, text: &str) -> bool {
        text.contains(GENERIC_SENTINEL) || self.entries.iter().any(|(_, s)| text.contains(s))
    }
}

/// The first `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Translator adapter that masks placeholders around another provider
///
/// Provider errors are passed through unchanged; retrying and rate
/// limiting are up to the caller.
#[derive(Clone)]
pub struct PlaceholderTranslator {
    inner: Arc<dyn MachineTranslator>,
    table: SentinelTable,
}

impl std::fmt::Debug for PlaceholderTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceholderTranslator")
            .field("inner", &self.inner.provider_name())
            .field("table", &self.table)
            .finish()
    }
}

impl PlaceholderTranslator {
    pub fn new(inner: Arc<dyn MachineTranslator>) -> Self {
        Self::with_table(inner, SentinelTable::standard())
    }

    pub fn with_table(inner: Arc<dyn MachineTranslator>, table: SentinelTable) -> Self {
        Self { inner, table }
    }

    pub fn table(&self) -> &SentinelTable {
        &self.table
    }

    pub fn inner(&self) -> &Arc<dyn MachineTranslator> {
        &self.inner
    }

    /// Text exactly as it will be sent to the provider
    pub fn prepare(&self, text: &str) -> String {
        let masked = self.table.mask(text);
        let truncated = truncate_chars(&masked, MAX_REQUEST_CHARS);
        if truncated.len() < masked.len() {
            debug!(
                "Truncated masked text from {} to {} characters",
                masked.chars().count(),
                MAX_REQUEST_CHARS
            );
        }
        truncated.to_string()
    }

    /// Mask, translate and unmask, restoring generics from `placeholders`
    ///
    /// The pipeline calls this with placeholder sets taken from the cache.
    pub async fn translate_with_placeholders(
        &self,
        text: &str,
        placeholders: &PlaceholderSet,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        let prepared = self.prepare(text);
        let translated = self
            .inner
            .translate(&prepared, source_locale, target_locale)
            .await?;
        Ok(self.table.unmask(&translated, placeholders))
    }

    /// Translate `text` with its placeholders kept intact
    pub async fn translate_preserving_placeholders(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        let placeholders = extract_placeholders(text);
        self.translate_with_placeholders(text, &placeholders, source_locale, target_locale)
            .await
    }
}

#[async_trait]
impl MachineTranslator for PlaceholderTranslator {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        self.translate_preserving_placeholders(text, source_locale, target_locale)
            .await
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        let prepared: Vec<String> = texts.iter().map(|t| self.prepare(t)).collect();
        let translated = self
            .inner
            .translate_batch(&prepared, source_locale, target_locale)
            .await?;
        Ok(texts
            .iter()
            .zip(translated)
            .map(|(source, translation)| {
                self.table
                    .unmask(&translation, &extract_placeholders(source))
            })
            .collect())
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}
