//! Creating a new language folder from an existing one

use crate::error::{ModError, ModResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// Outcome of [`create_language`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedLanguage {
    pub path: PathBuf,
    pub files_copied: usize,
    pub folders_created: usize,
}

/// Create `Languages/<new_name>` by copying the XML files of `base_name`
///
/// The base folder's directory structure is mirrored; only `.xml` files
/// are copied. Fails if the new folder already exists or the base folder
/// is missing.
pub fn create_language(
    languages_dir: &Path,
    new_name: &str,
    base_name: &str,
) -> ModResult<CreatedLanguage> {
    let new_name = new_name.trim();
    if new_name.is_empty() || new_name.contains(['/', '\\']) || new_name.starts_with('.') {
        return Err(ModError::InvalidLanguage(format!(
            "'{}' is not a valid folder name",
            new_name
        )));
    }

    let target = languages_dir.join(new_name);
    let base = languages_dir.join(base_name);

    if target.exists() {
        return Err(ModError::LanguageExists(new_name.to_string()));
    }
    if !base.is_dir() {
        return Err(ModError::LanguageNotFound(base_name.to_string()));
    }

    let mut files_copied = 0;
    let mut folders_created = 0;

    for entry in WalkDir::new(&base).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| base.clone());
            ModError::io(path, e.into())
        })?;
        let relative = entry
            .path()
            .strip_prefix(&base)
            .map_err(|e| ModError::NotFound(e.to_string()))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).map_err(|e| ModError::io(&destination, e))?;
            folders_created += 1;
        } else if entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            fs::copy(entry.path(), &destination).map_err(|e| ModError::io(entry.path(), e))?;
            files_copied += 1;
        }
    }

    info!(
        "Created language '{}' from '{}': {} files, {} folders",
        new_name, base_name, files_copied, folders_created
    );

    Ok(CreatedLanguage {
        path: target,
        files_copied,
        folders_created,
    })
}
