//! `About/About.xml` metadata editing
//!
//! RimWorld reads a mod's display name, author, package id, description,
//! icon and the game versions it supports from `About/About.xml`:
//!
//! ```xml
//! <ModMetaData>
//!   <name>My Mod</name>
//!   <packageId>me.mymod</packageId>
//!   <supportedVersions>
//!     <li>1.5</li>
//!   </supportedVersions>
//! </ModMetaData>
//! ```
//!
//! The Steam Workshop id lives next to it in `About/PublishedFileId.txt`.

use crate::error::{ModError, ModResult};
use crate::xml::{Document, Element};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const ABOUT_DIR: &str = "About";
pub const ABOUT_FILE: &str = "About.xml";
pub const PUBLISHED_ID_FILE: &str = "PublishedFileId.txt";

const WORKSHOP_URL: &str = "https://steamcommunity.com/sharedfiles/filedetails/?id=";

/// Game versions a mod can declare support for
pub const RIMWORLD_VERSIONS: &[&str] = &["1.0", "1.1", "1.2", "1.3", "1.4", "1.5", "1.6"];

const SUPPORTED_VERSIONS: &str = "supportedVersions";
const PREVIEW_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "dds"];

/// Editable fields of `About.xml`
///
/// Absent elements read as empty strings. On [`ModAbout::apply_to`] an
/// empty field removes its element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModAbout {
    pub name: String,
    pub author: String,
    pub package_id: String,
    pub description: String,
    /// `modIconPath`
    pub mod_icon_path: String,
    pub supported_versions: Vec<String>,
    /// Steam Workshop id from `PublishedFileId.txt`, not part of the XML
    pub workshop_id: String,
}

impl ModAbout {
    const FIELDS: [&'static str; 5] = ["name", "author", "packageId", "description", "modIconPath"];

    pub fn from_document(document: &Document) -> Self {
        let root = &document.root;
        let field = |name: &str| {
            root.child(name)
                .and_then(Element::text)
                .map(|t| t.trim().to_string())
                .unwrap_or_default()
        };
        let supported_versions = root
            .child(SUPPORTED_VERSIONS)
            .map(|versions| {
                versions
                    .children_named("li")
                    .filter_map(Element::text)
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name: field("name"),
            author: field("author"),
            package_id: field("packageId"),
            description: field("description"),
            mod_icon_path: field("modIconPath"),
            supported_versions,
            workshop_id: String::new(),
        }
    }

    fn value(&self, field: &str) -> &str {
        match field {
            "name" => &self.name,
            "author" => &self.author,
            "packageId" => &self.package_id,
            "modIconPath" => &self.mod_icon_path,
            _ => &self.description,
        }
    }

    /// Write these values into an `About.xml` tree
    pub fn apply_to(&self, document: &mut Document) {
        let root = &mut document.root;
        for field in Self::FIELDS {
            let value = self.value(field).trim();
            if value.is_empty() {
                root.remove_child(field);
            } else {
                root.ensure_path(field).set_text(value);
            }
        }

        let mut versions: Vec<&str> = self
            .supported_versions
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect();
        versions.sort_unstable();
        versions.dedup();

        if versions.is_empty() {
            root.remove_child(SUPPORTED_VERSIONS);
            return;
        }
        let list = root.ensure_path(SUPPORTED_VERSIONS);
        list.remove_children("li");
        for version in versions {
            let mut li = Element::new("li");
            li.set_text(version);
            list.push_element(li);
        }
    }

    /// Workshop page of the mod, if it has been published
    pub fn workshop_url(&self) -> Option<String> {
        let id = self.workshop_id.trim();
        (!id.is_empty()).then(|| format!("{}{}", WORKSHOP_URL, id))
    }

    pub fn supports(&self, version: &str) -> bool {
        self.supported_versions.iter().any(|v| v == version)
    }

    /// Add or remove a version from the supported list
    pub fn toggle_version(&mut self, version: &str, enabled: bool) {
        self.supported_versions.retain(|v| v != version);
        if enabled {
            self.supported_versions.push(version.to_string());
        }
    }
}

pub fn about_path(mod_root: &Path) -> PathBuf {
    mod_root.join(ABOUT_DIR).join(ABOUT_FILE)
}

pub fn published_id_path(mod_root: &Path) -> PathBuf {
    mod_root.join(ABOUT_DIR).join(PUBLISHED_ID_FILE)
}

/// Workshop id of a mod, empty if the file is missing or unreadable
fn read_workshop_id(mod_root: &Path) -> String {
    let path = published_id_path(mod_root);
    if !path.is_file() {
        return String::new();
    }
    match fs::read_to_string(&path) {
        Ok(id) => id.trim().to_string(),
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Write the workshop id, or delete the file when the id is empty
fn write_workshop_id(mod_root: &Path, id: &str) -> ModResult<()> {
    let path = published_id_path(mod_root);
    let id = id.trim();
    if !id.is_empty() {
        fs::write(&path, id).map_err(|e| ModError::io(&path, e))?;
    } else if path.exists() {
        fs::remove_file(&path).map_err(|e| ModError::io(&path, e))?;
        debug!("Removed {}", path.display());
    }
    Ok(())
}

/// Read `About/About.xml` and `About/PublishedFileId.txt` of a mod
pub fn load_about(mod_root: &Path) -> ModResult<ModAbout> {
    let document = Document::load(&about_path(mod_root))?;
    let mut about = ModAbout::from_document(&document);
    about.workshop_id = read_workshop_id(mod_root);
    Ok(about)
}

/// Apply `about` to the mod's `About.xml` and write it back, along with
/// the workshop id
///
/// Elements other than the editable fields are left untouched.
pub fn save_about(mod_root: &Path, about: &ModAbout) -> ModResult<()> {
    let path = about_path(mod_root);
    let mut document = Document::load(&path)?;
    about.apply_to(&mut document);
    document.save(&path)?;
    write_workshop_id(mod_root, &about.workshop_id)?;
    info!("Saved {}", path.display());
    Ok(())
}

/// Locate the mod's preview image in `About/`
///
/// `Preview.png`, `.jpg`, `.jpeg` and `.dds` are tried in that order, then
/// any file whose name starts with `preview` (any case).
pub fn find_preview_image(mod_root: &Path) -> Option<PathBuf> {
    let about_dir = mod_root.join(ABOUT_DIR);
    if !about_dir.is_dir() {
        return None;
    }

    for ext in PREVIEW_EXTENSIONS {
        let candidate = about_dir.join(format!("Preview.{}", ext));
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    let mut matches: Vec<PathBuf> = fs::read_dir(&about_dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .starts_with("preview")
        })
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    matches.sort();
    matches.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;

    const ABOUT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ModMetaData>
  <name>Better Guns</name>
  <author>Someone</author>
  <packageId>someone.betterguns</packageId>
  <modIconPath>UI/BetterGunsIcon</modIconPath>
  <supportedVersions>
    <li>1.5</li>
    <li>1.4</li>
  </supportedVersions>
  <modDependencies/>
</ModMetaData>
"#;

    #[test]
    fn test_read_fields() {
        let about = ModAbout::from_document(&Document::parse(ABOUT).unwrap());
        assert_eq!(about.name, "Better Guns");
        assert_eq!(about.package_id, "someone.betterguns");
        assert_eq!(about.description, "");
        assert_eq!(about.mod_icon_path, "UI/BetterGunsIcon");
        assert_eq!(about.workshop_id, "");
        assert_eq!(about.supported_versions, vec!["1.5", "1.4"]);
        assert!(about.supports("1.4"));
        assert!(!about.supports("1.6"));
    }

    #[test]
    fn test_apply_sets_and_removes() {
        let mut doc = Document::parse(ABOUT).unwrap();
        let mut about = ModAbout::from_document(&doc);
        about.author = String::new();
        about.description = "Guns, but better.".to_string();
        about.apply_to(&mut doc);

        assert!(doc.root.child("author").is_none());
        assert_eq!(
            doc.root.child("description").and_then(|e| e.text()),
            Some("Guns, but better.".to_string())
        );
        assert!(doc.root.child("modDependencies").is_some());
    }

    #[test]
    fn test_versions_written_sorted() {
        let mut doc = Document::parse(ABOUT).unwrap();
        let mut about = ModAbout::from_document(&doc);
        about.toggle_version("1.6", true);
        about.toggle_version("1.4", false);
        about.toggle_version("1.3", true);
        about.apply_to(&mut doc);

        let versions: Vec<String> = doc
            .root
            .child("supportedVersions")
            .unwrap()
            .children_named("li")
            .filter_map(|li| li.text())
            .collect();
        assert_eq!(versions, vec!["1.3", "1.5", "1.6"]);
    }

    #[test]
    fn test_no_versions_removes_element() {
        let mut doc = Document::parse(ABOUT).unwrap();
        let mut about = ModAbout::from_document(&doc);
        about.supported_versions.clear();
        about.apply_to(&mut doc);
        assert!(doc.root.child("supportedVersions").is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new("about-save");
        dir.write("About/About.xml", ABOUT);
        let mut about = load_about(dir.path()).unwrap();
        about.name = "Best Guns".to_string();
        save_about(dir.path(), &about).unwrap();
        assert_eq!(load_about(dir.path()).unwrap().name, "Best Guns");
    }

    #[test]
    fn test_icon_path_removed_when_empty() {
        let mut doc = Document::parse(ABOUT).unwrap();
        let mut about = ModAbout::from_document(&doc);
        about.mod_icon_path = String::new();
        about.apply_to(&mut doc);
        assert!(doc.root.child("modIconPath").is_none());

        about.mod_icon_path = "UI/NewIcon".to_string();
        about.apply_to(&mut doc);
        assert_eq!(
            doc.root.child("modIconPath").and_then(|e| e.text()),
            Some("UI/NewIcon".to_string())
        );
    }

    #[test]
    fn test_workshop_id_read_written_and_removed() {
        let dir = TempDir::new("about-workshop");
        dir.write("About/About.xml", ABOUT);
        dir.write("About/PublishedFileId.txt", " 123456789\n");

        let mut about = load_about(dir.path()).unwrap();
        assert_eq!(about.workshop_id, "123456789");
        assert_eq!(
            about.workshop_url().as_deref(),
            Some("https://steamcommunity.com/sharedfiles/filedetails/?id=123456789")
        );

        about.workshop_id = "987".to_string();
        save_about(dir.path(), &about).unwrap();
        assert_eq!(
            std::fs::read_to_string(published_id_path(dir.path())).unwrap(),
            "987"
        );

        about.workshop_id = String::new();
        save_about(dir.path(), &about).unwrap();
        assert!(!published_id_path(dir.path()).exists());
        assert_eq!(load_about(dir.path()).unwrap().workshop_url(), None);
    }

    #[test]
    fn test_missing_about() {
        let dir = TempDir::new("about-missing");
        assert!(load_about(dir.path()).is_err());
    }

    #[test]
    fn test_preview_by_extension_order() {
        let dir = TempDir::new("about-preview");
        dir.write("About/Preview.jpg", "");
        dir.write("About/Preview.dds", "");
        assert_eq!(
            find_preview_image(dir.path()),
            Some(dir.path().join("About").join("Preview.jpg"))
        );
    }

    #[test]
    fn test_preview_by_prefix() {
        let dir = TempDir::new("about-prefix");
        dir.write("About/preview_big.webp", "");
        dir.write("About/About.xml", ABOUT);
        assert_eq!(
            find_preview_image(dir.path()),
            Some(dir.path().join("About").join("preview_big.webp"))
        );
    }

    #[test]
    fn test_no_preview() {
        let dir = TempDir::new("about-nopreview");
        dir.write("About/About.xml", ABOUT);
        assert_eq!(find_preview_image(dir.path()), None);
    }
}
