//! Translatable text extraction and write-back
//!
//! Two XML shapes are understood:
//!
//! - **Keyed** files, whose root is `LanguageData`. Every direct child is a
//!   translation entry: the tag is the key, the text is the value.
//! - **Def-style** files with any other root. The whole tree is walked and
//!   every element text and every attribute value becomes a unit, with a
//!   synthetic id built from the tag path (`Defs/ThingDef/label`,
//!   `Defs/ThingDef@ParentName`).
//!
//! Ids are not guaranteed unique in def-style files; units that share an
//! id also share a translation on save.

use crate::error::{ModError, ModResult};
use crate::xml::{Document, Element};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Root tag of keyed translation files
pub const LANGUAGE_DATA: &str = "LanguageData";

/// Where a unit of text came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextOrigin {
    /// Direct child of a `LanguageData` root
    Keyed,
    /// Text of an element in a def-style tree
    Element,
    /// Value of the named attribute
    Attribute(String),
}

impl TextOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            TextOrigin::Keyed => "keyed",
            TextOrigin::Element => "element",
            TextOrigin::Attribute(_) => "attribute",
        }
    }
}

/// One translatable unit of a language file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub id: String,
    /// Trimmed source text
    pub text: String,
    pub origin: TextOrigin,
    /// Index path from the root to the owning element
    pub location: Vec<usize>,
}

/// Collect every translatable unit of a document
pub fn extract_texts(document: &Document) -> Vec<SourceText> {
    let root = &document.root;
    let mut texts = Vec::new();

    if root.name == LANGUAGE_DATA {
        for (index, node) in root.children.iter().enumerate() {
            let Some(entry) = node.as_element() else {
                continue;
            };
            if let Some(text) = trimmed_text(entry) {
                texts.push(SourceText {
                    id: entry.name.clone(),
                    text,
                    origin: TextOrigin::Keyed,
                    location: vec![index],
                });
            }
        }
    } else {
        let mut location = Vec::new();
        walk(root, "", &mut location, &mut texts);
    }

    texts
}

fn walk(element: &Element, parent_id: &str, location: &mut Vec<usize>, texts: &mut Vec<SourceText>) {
    let id = if parent_id.is_empty() {
        element.name.clone()
    } else {
        format!("{}/{}", parent_id, element.name)
    };

    if let Some(text) = trimmed_text(element) {
        texts.push(SourceText {
            id: id.clone(),
            text,
            origin: TextOrigin::Element,
            location: location.clone(),
        });
    }

    for (name, value) in &element.attributes {
        let value = value.trim();
        if value.chars().count() > 1 {
            texts.push(SourceText {
                id: format!("{}@{}", id, name),
                text: value.to_string(),
                origin: TextOrigin::Attribute(name.clone()),
                location: location.clone(),
            });
        }
    }

    for (index, node) in element.children.iter().enumerate() {
        if let Some(child) = node.as_element() {
            location.push(index);
            walk(child, &id, location, texts);
            location.pop();
        }
    }
}

fn trimmed_text(element: &Element) -> Option<String> {
    element
        .text()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Write `translations` (id → text) into `document`
///
/// Every unit whose id has a non-empty translation is updated. Returns
/// the number of units written.
pub fn apply_translations(
    document: &mut Document,
    texts: &[SourceText],
    translations: &IndexMap<String, String>,
) -> usize {
    let mut written = 0;
    for unit in texts {
        let Some(translation) = translations.get(&unit.id).filter(|t| !t.is_empty()) else {
            continue;
        };
        let Some(element) = document.root.element_at_mut(&unit.location) else {
            debug!("No element at {:?} for '{}'", unit.location, unit.id);
            continue;
        };
        match &unit.origin {
            TextOrigin::Keyed | TextOrigin::Element => element.set_text(translation),
            TextOrigin::Attribute(name) => element.set_attribute(name, translation),
        }
        written += 1;
    }
    written
}

/// A language file loaded for editing
#[derive(Debug, Clone)]
pub struct LanguageFile {
    pub path: PathBuf,
    pub document: Document,
    pub texts: Vec<SourceText>,
}

impl LanguageFile {
    /// Parse `path` and extract its units
    pub fn open(path: &Path) -> ModResult<Self> {
        let document = Document::load(path)?;
        let texts = extract_texts(&document);
        debug!("Extracted {} texts from {}", texts.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            document,
            texts,
        })
    }

    pub fn is_keyed(&self) -> bool {
        self.document.root.name == LANGUAGE_DATA
    }
}

/// Re-read `path`, apply `translations` and overwrite the file
///
/// The file is parsed again rather than reusing an in-memory tree, so
/// edits made on disk since loading are kept for units that are not
/// translated.
pub fn save_translations(
    path: &Path,
    translations: &IndexMap<String, String>,
) -> ModResult<usize> {
    if translations.is_empty() {
        return Err(ModError::NotFound("no translations to save".to_string()));
    }
    let mut document = Document::load(path)?;
    let texts = extract_texts(&document);
    let written = apply_translations(&mut document, &texts, translations);
    document.save(path)?;
    info!("Saved {} translations to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;

    const KEYED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<LanguageData>
  <GreetingMessage>Hello {name}, you found {0} items</GreetingMessage>
  <EmptyEntry>   </EmptyEntry>
  <FireDamage>fire damage</FireDamage>
  <!-- comment -->
</LanguageData>
"#;

    const DEF_INJECTED: &str = r#"<Defs>
  <ThingDef Name="BaseWeapon" Abstract="True" x="a">
    <label>weapon</label>
    <description>  A thing that hurts.  </description>
  </ThingDef>
</Defs>
"#;

    #[test]
    fn test_keyed_extraction() {
        let doc = Document::parse(KEYED).unwrap();
        let texts = extract_texts(&doc);
        let ids: Vec<&str> = texts.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["GreetingMessage", "FireDamage"]);
        assert!(texts.iter().all(|t| t.origin == TextOrigin::Keyed));
        assert_eq!(texts[1].text, "fire damage");
    }

    #[test]
    fn test_def_style_extraction() {
        let doc = Document::parse(DEF_INJECTED).unwrap();
        let texts = extract_texts(&doc);
        let pairs: Vec<(&str, &str)> = texts
            .iter()
            .map(|t| (t.id.as_str(), t.text.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Defs/ThingDef@Name", "BaseWeapon"),
                ("Defs/ThingDef@Abstract", "True"),
                ("Defs/ThingDef/label", "weapon"),
                ("Defs/ThingDef/description", "A thing that hurts."),
            ]
        );
        assert_eq!(texts[0].origin, TextOrigin::Attribute("Name".to_string()));
    }

    #[test]
    fn test_short_attributes_are_skipped() {
        let doc = Document::parse(DEF_INJECTED).unwrap();
        assert!(extract_texts(&doc).iter().all(|t| t.id != "Defs/ThingDef@x"));
    }

    #[test]
    fn test_apply_translations_to_keyed() {
        let mut doc = Document::parse(KEYED).unwrap();
        let texts = extract_texts(&doc);
        let mut translations = IndexMap::new();
        translations.insert("FireDamage".to_string(), "daño por fuego".to_string());
        translations.insert("Unknown".to_string(), "x".to_string());

        assert_eq!(apply_translations(&mut doc, &texts, &translations), 1);
        assert_eq!(
            doc.root.child("FireDamage").and_then(|e| e.text()),
            Some("daño por fuego".to_string())
        );
    }

    #[test]
    fn test_apply_translations_to_attribute() {
        let mut doc = Document::parse(DEF_INJECTED).unwrap();
        let texts = extract_texts(&doc);
        let mut translations = IndexMap::new();
        translations.insert("Defs/ThingDef@Name".to_string(), "ArmaBase".to_string());
        translations.insert("Defs/ThingDef/label".to_string(), String::new());

        assert_eq!(apply_translations(&mut doc, &texts, &translations), 1);
        let thing = doc.root.child("ThingDef").unwrap();
        assert_eq!(thing.attribute("Name"), Some("ArmaBase"));
        assert_eq!(thing.child("label").and_then(|e| e.text()), Some("weapon".to_string()));
    }

    #[test]
    fn test_open_and_save_round_trip() {
        let dir = TempDir::new("text-save");
        let path = dir.write("Keyed/Misc.xml", KEYED);

        let file = LanguageFile::open(&path).unwrap();
        assert!(file.is_keyed());
        assert_eq!(file.texts.len(), 2);

        let mut translations = IndexMap::new();
        translations.insert(
            "GreetingMessage".to_string(),
            "Hola {name}, encontraste {0} objetos".to_string(),
        );
        assert_eq!(save_translations(&path, &translations).unwrap(), 1);

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("<?xml"));
        assert!(saved.contains("<GreetingMessage>Hola {name}, encontraste {0} objetos</GreetingMessage>"));
        assert!(saved.contains("<FireDamage>fire damage</FireDamage>"));
    }

    #[test]
    fn test_save_without_translations_is_rejected() {
        let dir = TempDir::new("text-empty");
        let path = dir.write("a.xml", KEYED);
        assert!(save_translations(&path, &IndexMap::new()).is_err());
    }

    #[test]
    fn test_open_malformed_file() {
        let dir = TempDir::new("text-bad");
        let path = dir.write("bad.xml", "<LanguageData><a></LanguageData>");
        match LanguageFile::open(&path) {
            Err(ModError::Xml { .. }) => {}
            other => panic!("Expected Xml error, got {:?}", other),
        }
    }
}
