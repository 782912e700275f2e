//! Mod folder discovery
//!
//! A RimWorld mod keeps its translations under `Languages/<Language>/`,
//! which may sit at the mod root, inside a game-version folder (`1.5/`),
//! or inside `Common/`. Each language folder holds XML files at any depth
//! (`Keyed/`, `DefInjected/ThingDef/`, ...).

use crate::error::{ModError, ModResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const LANGUAGES_DIR: &str = "Languages";

/// Game-version folders searched for a `Languages` folder, newest first
pub const VERSION_FOLDERS: &[&str] = &["1.6", "1.5", "1.4", "1.3", "1.2", "1.1", "1.0"];

/// A language folder that contains at least one XML file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageFolder {
    /// Folder name, e.g. `Spanish`
    pub folder: String,
    pub path: PathBuf,
    /// Human-readable name, e.g. `Spanish (Español)`
    pub display_name: String,
}

impl LanguageFolder {
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_name, self.folder)
    }
}

/// An XML file inside a language folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlFileEntry {
    pub full_path: PathBuf,
    /// Path relative to the language folder, `/`-separated
    pub relative_path: String,
    pub file_name: String,
}

/// Locate the `Languages` folder of a mod
///
/// Checks the usual places first, then falls back to the first
/// `Languages` directory found walking the tree in name order.
pub fn find_languages_dir(mod_root: &Path) -> Option<PathBuf> {
    let mut candidates = vec![mod_root.join(LANGUAGES_DIR)];
    candidates.extend(
        VERSION_FOLDERS
            .iter()
            .map(|version| mod_root.join(version).join(LANGUAGES_DIR)),
    );
    candidates.push(mod_root.join("Common").join(LANGUAGES_DIR));

    if let Some(found) = candidates.into_iter().find(|p| p.is_dir()) {
        return Some(found);
    }

    WalkDir::new(mod_root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_type().is_dir() && entry.file_name() == LANGUAGES_DIR)
        .map(|entry| entry.into_path())
}

/// Like [`find_languages_dir`], but an error when nothing is found
pub fn require_languages_dir(mod_root: &Path) -> ModResult<PathBuf> {
    find_languages_dir(mod_root)
        .ok_or_else(|| ModError::LanguagesFolderMissing(mod_root.to_path_buf()))
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// True if `dir` contains an XML file at any depth
pub fn has_xml_files(dir: &Path) -> bool {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .any(|entry| entry.file_type().is_file() && is_xml(entry.path()))
}

/// Language folders under `languages_dir` that hold XML files, by name
pub fn scan_languages(languages_dir: &Path) -> ModResult<Vec<LanguageFolder>> {
    let entries = fs::read_dir(languages_dir).map_err(|e| ModError::io(languages_dir, e))?;

    let mut languages = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ModError::io(languages_dir, e))?;
        let path = entry.path();
        if !path.is_dir() || !has_xml_files(&path) {
            continue;
        }
        let folder = entry.file_name().to_string_lossy().into_owned();
        languages.push(LanguageFolder {
            display_name: readable_language_name(&folder),
            folder,
            path,
        });
    }
    languages.sort_by(|a, b| a.folder.cmp(&b.folder));
    debug!(
        "Found {} languages in {}",
        languages.len(),
        languages_dir.display()
    );
    Ok(languages)
}

/// Every XML file of a language folder, sorted case-insensitively
pub fn list_xml_files(language_dir: &Path) -> ModResult<Vec<XmlFileEntry>> {
    if !language_dir.is_dir() {
        return Err(ModError::LanguageNotFound(language_dir.display().to_string()));
    }

    let mut files: Vec<XmlFileEntry> = WalkDir::new(language_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_xml(entry.path()))
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(language_dir).ok()?;
            let relative_path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some(XmlFileEntry {
                file_name: entry.file_name().to_string_lossy().into_owned(),
                relative_path,
                full_path: entry.into_path(),
            })
        })
        .collect();

    files.sort_by_key(|f| f.relative_path.to_lowercase());
    Ok(files)
}

/// Human-readable name for a language folder
///
/// Known folders get their English and native names; anything else is
/// title-cased.
pub fn readable_language_name(folder: &str) -> String {
    let normalized: String = folder
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();
    let known = match normalized.as_str() {
        "english" => Some("English"),
        "spanish" => Some("Spanish (Español)"),
        "french" => Some("French (Français)"),
        "german" => Some("German (Deutsch)"),
        "italian" => Some("Italian (Italiano)"),
        "portuguese" => Some("Portuguese (Português)"),
        "russian" => Some("Russian (Русский)"),
        "chinesesimplified" => Some("Chinese Simplified (简体中文)"),
        "chinesetraditional" => Some("Chinese Traditional (繁體中文)"),
        "japanese" => Some("Japanese (日本語)"),
        "korean" => Some("Korean (한국어)"),
        _ => None,
    };
    known.map(str::to_string).unwrap_or_else(|| title_case(folder))
}

/// Uppercase the first letter of each alphabetic run, lowercase the rest
fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }
    result
}
