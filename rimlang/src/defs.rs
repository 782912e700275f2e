//! Editing `ThingDef` and `StatDef` entries under a mod's `Defs/` folder

use crate::error::{ModError, ModResult};
use crate::layout::{XmlFileEntry, list_xml_files};
use crate::xml::{Document, Element};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFS_DIR: &str = "Defs";

/// Fields whose text is natural language and can be machine translated
pub const TRANSLATABLE_FIELDS: &[&str] = &["label", "description"];

/// The def types the editor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKind {
    ThingDef,
    StatDef,
}

impl DefKind {
    pub const ALL: [DefKind; 2] = [DefKind::ThingDef, DefKind::StatDef];

    pub fn tag(&self) -> &'static str {
        match self {
            DefKind::ThingDef => "ThingDef",
            DefKind::StatDef => "StatDef",
        }
    }

    /// Editable field paths, relative to the def element
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            DefKind::ThingDef => &["label", "description", "graphicData/texPath", "uiIconPath"],
            DefKind::StatDef => &["label", "description"],
        }
    }
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A def with a non-blank `defName`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefEntry {
    pub kind: DefKind,
    pub def_name: String,
    location: Vec<usize>,
}

/// Every XML file under `<mod>/Defs`
pub fn list_def_files(mod_root: &Path) -> ModResult<Vec<XmlFileEntry>> {
    let defs_dir = mod_root.join(DEFS_DIR);
    if !defs_dir.is_dir() {
        return Err(ModError::NotFound(format!(
            "no '{}' folder in {}",
            DEFS_DIR,
            mod_root.display()
        )));
    }
    list_xml_files(&defs_dir)
}

/// A defs file opened for editing
#[derive(Debug, Clone)]
pub struct DefsFile {
    pub path: PathBuf,
    pub document: Document,
    /// ThingDefs first, then StatDefs, each in document order
    pub entries: Vec<DefEntry>,
}

impl DefsFile {
    pub fn open(path: &Path) -> ModResult<Self> {
        let document = Document::load(path)?;
        let entries = collect_defs(&document.root);
        debug!("Found {} defs in {}", entries.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            document,
            entries,
        })
    }

    pub fn find(&self, def_name: &str) -> Option<&DefEntry> {
        self.entries.iter().find(|e| e.def_name == def_name)
    }

    fn element(&self, entry: &DefEntry) -> Option<&Element> {
        self.document.root.element_at(&entry.location)
    }

    /// Trimmed text of a field, `None` when absent or blank
    pub fn field(&self, entry: &DefEntry, field: &str) -> Option<String> {
        self.element(entry)?
            .find_path(field)?
            .text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Set a field, creating missing path segments
    ///
    /// An empty value removes the field element. Returns whether the
    /// document changed.
    pub fn set_field(&mut self, entry: &DefEntry, field: &str, value: &str) -> bool {
        let value = value.trim();
        if self.field(entry, field).as_deref().unwrap_or("") == value {
            return false;
        }
        let Some(def) = self.document.root.element_at_mut(&entry.location) else {
            return false;
        };

        if !value.is_empty() {
            def.ensure_path(field).set_text(value);
            return true;
        }

        let (parent, name) = match field.rsplit_once('/') {
            Some((parent_path, name)) => match def.find_path_mut(parent_path) {
                Some(parent) => (parent, name),
                None => return false,
            },
            None => (def, field),
        };
        parent.remove_child(name).is_some()
    }

    /// Translatable fields of a def that have text longer than one character
    pub fn translatable_fields(&self, entry: &DefEntry) -> Vec<(&'static str, String)> {
        TRANSLATABLE_FIELDS
            .iter()
            .filter_map(|field| {
                self.field(entry, field)
                    .filter(|text| text.chars().count() > 1)
                    .map(|text| (*field, text))
            })
            .collect()
    }

    pub fn save(&self) -> ModResult<()> {
        self.document.save(&self.path)?;
        info!("Saved {}", self.path.display());
        Ok(())
    }
}

fn collect_defs(root: &Element) -> Vec<DefEntry> {
    let mut entries = Vec::new();
    for kind in DefKind::ALL {
        for location in root.descendant_paths(kind.tag()) {
            let def_name = root
                .element_at(&location)
                .and_then(|def| def.child("defName"))
                .and_then(Element::text)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
            if let Some(def_name) = def_name {
                entries.push(DefEntry {
                    kind,
                    def_name,
                    location,
                });
            }
        }
    }
    entries
}
