//! Editing session state
//!
//! A [`Session`] holds everything an editor front end needs between user
//! actions: which mod is open, its languages and files, the rows of the
//! current file and the translations entered so far. Operations update the
//! state and the one-line status message together.

use crate::error::{ModError, ModResult};
use crate::layout::{LanguageFolder, XmlFileEntry, find_languages_dir};
use crate::placeholder::has_placeholders;
use crate::text::{SourceText, save_translations};
use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Translation state of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowStatus {
    #[default]
    Pending,
    Translated,
    /// Translated from the cache without calling the provider
    Cached,
    /// Typed in by hand
    Edited,
    Pasted,
    Failed,
}

impl RowStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RowStatus::Pending => "Pending",
            RowStatus::Translated => "Translated",
            RowStatus::Cached => "Translated (Cache)",
            RowStatus::Edited => "Edited",
            RowStatus::Pasted => "Pasted",
            RowStatus::Failed => "Failed",
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self, RowStatus::Translated | RowStatus::Cached)
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, RowStatus::Edited | RowStatus::Pasted)
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the current file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    pub source: SourceText,
    pub translation: String,
    pub status: RowStatus,
}

impl TextRow {
    pub fn new(source: SourceText) -> Self {
        Self {
            source,
            translation: String::new(),
            status: RowStatus::Pending,
        }
    }

    pub fn id(&self) -> &str {
        &self.source.id
    }

    pub fn has_placeholders(&self) -> bool {
        has_placeholders(&self.source.text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub mod_folder: Option<PathBuf>,
    pub languages_dir: Option<PathBuf>,
    pub languages: Vec<LanguageFolder>,
    pub selected_language: Option<LanguageFolder>,
    pub files: Vec<XmlFileEntry>,
    pub current_file: Option<PathBuf>,
    pub rows: Vec<TextRow>,
    /// Row id → translation, for every row that has one
    pub translations: IndexMap<String, String>,
    pub status: String,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything about the previous mod
    pub fn reset(&mut self) {
        *self = Self {
            status: std::mem::take(&mut self.status),
            ..Self::default()
        };
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        debug!("status: {}", self.status);
    }

    /// Start working on a mod folder
    ///
    /// Clears previous state and locates the `Languages` folder; the
    /// language list itself is filled later by [`Session::set_languages`].
    pub fn open_mod(&mut self, folder: &Path) -> ModResult<&Path> {
        self.reset();
        self.mod_folder = Some(folder.to_path_buf());
        match find_languages_dir(folder) {
            Some(dir) => {
                self.set_status(format!("Searching languages in {}", dir.display()));
                let dir = self.languages_dir.insert(dir);
                Ok(dir.as_path())
            }
            None => {
                self.set_status("No 'Languages' folder found");
                Err(ModError::LanguagesFolderMissing(folder.to_path_buf()))
            }
        }
    }

    pub fn set_languages(&mut self, languages: Vec<LanguageFolder>) {
        self.languages = languages;
        if self.languages.is_empty() {
            self.set_status("No languages with XML files found");
        } else {
            self.set_status(format!("{} languages found", self.languages.len()));
        }
    }

    /// Select a language by folder name, clearing file and row state
    pub fn select_language(&mut self, folder: &str) -> ModResult<&LanguageFolder> {
        let language = self
            .languages
            .iter()
            .find(|l| l.folder == folder)
            .cloned()
            .ok_or_else(|| ModError::LanguageNotFound(folder.to_string()))?;
        self.files.clear();
        self.current_file = None;
        self.rows.clear();
        self.translations.clear();
        self.set_status(format!("Loading files of {}...", language.display_name));
        Ok(&*self.selected_language.insert(language))
    }

    pub fn set_files(&mut self, files: Vec<XmlFileEntry>) {
        self.files = files;
        if self.files.is_empty() {
            self.set_status("No XML files found");
        } else {
            self.set_status(format!("{} XML files found", self.files.len()));
        }
    }

    /// Replace the rows with the units of a freshly loaded file
    pub fn set_loaded_file(&mut self, path: PathBuf, texts: Vec<SourceText>) {
        self.rows = texts.into_iter().map(TextRow::new).collect();
        self.translations.clear();
        self.current_file = Some(path);
        self.set_status(format!("{} texts loaded", self.rows.len()));
    }

    pub fn row_index(&self, id: &str) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == id)
    }

    /// Every row with this id
    ///
    /// Nested files may repeat an id; saving writes the same value to all of
    /// them, so status updates go to all of them too.
    pub fn row_indices(&self, id: &str) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.id() == id)
            .map(|(index, _)| index)
            .collect()
    }

    fn update_row(&mut self, index: usize, translation: &str, status: RowStatus) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        row.translation = translation.to_string();
        row.status = status;
        if translation.is_empty() {
            self.translations.shift_remove(&row.source.id);
        } else {
            self.translations
                .insert(row.source.id.clone(), translation.to_string());
        }
        true
    }

    /// Store a machine translation for a row
    pub fn record_translation(&mut self, index: usize, translation: &str, from_cache: bool) -> bool {
        let status = if from_cache {
            RowStatus::Cached
        } else {
            RowStatus::Translated
        };
        self.update_row(index, translation, status)
    }

    pub fn record_failure(&mut self, index: usize) -> bool {
        match self.rows.get_mut(index) {
            Some(row) if row.translation.is_empty() => {
                row.status = RowStatus::Failed;
                true
            }
            _ => false,
        }
    }

    /// Manual edit of a row's translation
    ///
    /// Clearing the text returns the row to pending.
    pub fn edit(&mut self, index: usize, translation: &str) -> bool {
        let translation = translation.trim();
        let status = if translation.is_empty() {
            RowStatus::Pending
        } else {
            RowStatus::Edited
        };
        self.update_row(index, translation, status)
    }

    pub fn paste(&mut self, index: usize, translation: &str) -> bool {
        let translation = translation.trim();
        if translation.is_empty() {
            return false;
        }
        self.update_row(index, translation, RowStatus::Pasted)
    }

    /// Write the current translations into the loaded file
    pub fn save_current_file(&mut self) -> ModResult<usize> {
        let path = self
            .current_file
            .clone()
            .ok_or_else(|| ModError::NotFound("no file loaded".to_string()))?;
        let written = save_translations(&path, &self.translations)?;
        self.set_status(format!(
            "{} translations saved to {}",
            written,
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
        Ok(written)
    }

    /// Counts of (translated, manual, pending-or-failed) rows
    pub fn progress(&self) -> (usize, usize, usize) {
        self.rows.iter().fold((0, 0, 0), |(t, m, p), row| {
            if row.status.is_translated() {
                (t + 1, m, p)
            } else if row.status.is_manual() {
                (t, m + 1, p)
            } else {
                (t, m, p + 1)
            }
        })
    }
}
