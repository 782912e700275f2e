//! Catalog of RimWorld language folders
//!
//! RimWorld identifies languages by folder name (`Spanish`,
//! `ChineseSimplified`, ...). Translation providers want a language code
//! instead, so each catalog entry carries both.

use crate::error::{ModError, ModResult};
use icu_locale::Locale;

/// A language the game ships with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    /// Folder name under `Languages/`
    pub folder: &'static str,
    /// Name in the language itself
    pub native_name: &'static str,
    /// Code understood by the translation provider
    pub code: &'static str,
}

impl LanguageInfo {
    pub fn label(&self) -> String {
        format!("{} ({})", self.folder, self.native_name)
    }
}

const fn lang(folder: &'static str, native_name: &'static str, code: &'static str) -> LanguageInfo {
    LanguageInfo {
        folder,
        native_name,
        code,
    }
}

/// Languages offered when creating a new language folder
pub const LANGUAGES: &[LanguageInfo] = &[
    lang("Catalan", "Català", "ca"),
    lang("ChineseSimplified", "简体中文", "zh-CN"),
    lang("ChineseTraditional", "繁體中文", "zh-TW"),
    lang("Czech", "Čeština", "cs"),
    lang("Danish", "Dansk", "da"),
    lang("Dutch", "Nederlands", "nl"),
    lang("Estonian", "Eesti", "et"),
    lang("Finnish", "Suomi", "fi"),
    lang("French", "Français", "fr"),
    lang("German", "Deutsch", "de"),
    lang("Greek", "Ελληνικά", "el"),
    lang("Hungarian", "Magyar", "hu"),
    lang("Italian", "Italiano", "it"),
    lang("Japanese", "日本語", "ja"),
    lang("Korean", "한국어", "ko"),
    lang("Norwegian", "Norsk Bokmål", "no"),
    lang("Polish", "Polski", "pl"),
    lang("Portuguese", "Português", "pt"),
    lang("PortugueseBrazilian", "Português Brasileiro", "pt-BR"),
    lang("Romanian", "Română", "ro"),
    lang("Russian", "Русский", "ru"),
    lang("Slovak", "Slovenčina", "sk"),
    lang("Spanish", "Español(Castellano)", "es"),
    lang("SpanishLatin", "Español(Latinoamérica)", "es-419"),
    lang("Swedish", "Svenska", "sv"),
    lang("Turkish", "Türkçe", "tr"),
    lang("Ukrainian", "Українська", "uk"),
    lang("Vietnamese", "tiếng Việt", "vi"),
    lang("English", "English", "en"),
];

/// Look up a catalog entry by folder name, ignoring case
pub fn find_language(folder: &str) -> Option<&'static LanguageInfo> {
    LANGUAGES
        .iter()
        .find(|info| info.folder.eq_ignore_ascii_case(folder))
}

/// Provider code for a language folder, e.g. `Spanish` → `es`
///
/// Folders with a suffix such as `Spanish (Español)` or `Russian_Mod`
/// resolve through their leading name.
pub fn target_code_for_folder(folder: &str) -> Option<&'static str> {
    if let Some(info) = find_language(folder.trim()) {
        return Some(info.code);
    }
    let stem = folder
        .split(|c: char| !c.is_ascii_alphabetic())
        .find(|part| !part.is_empty())?;
    find_language(stem).map(|info| info.code)
}

/// Parse a language code and return its canonical form
///
/// # Example
///
/// ```ignore
/// assert_eq!(validate_target_language("pt_br")?, "pt-BR");
/// ```
pub fn validate_target_language(code: &str) -> ModResult<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(ModError::InvalidLanguage("empty language code".to_string()));
    }
    let locale: Locale = trimmed
        .replace('_', "-")
        .parse()
        .map_err(|e| ModError::InvalidLanguage(format!("'{}': {}", code, e)))?;
    Ok(locale.to_string())
}
