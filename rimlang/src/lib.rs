//! Browse and edit the language files of a RimWorld mod
//!
//! The crate covers everything that happens on disk: finding the
//! `Languages` folder, listing languages and their XML files, extracting
//! translatable text, writing translations back, creating new language
//! folders, and editing `About.xml` and `Defs`. Machine translation lives
//! in the `rimlang-mt` crate.

pub mod about;
pub mod config;
pub mod create;
pub mod defs;
pub mod error;
pub mod filter;
pub mod languages;
pub mod layout;
pub mod placeholder;
pub mod session;
pub mod text;
pub mod xml;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use about::{
    ModAbout, RIMWORLD_VERSIONS, find_preview_image, load_about, published_id_path, save_about,
};
pub use config::{AppConfig, cache_path_in, config_dir, default_cache_path};
pub use create::{CreatedLanguage, create_language};
pub use defs::{DefEntry, DefKind, DefsFile, list_def_files};
pub use error::{ModError, ModResult};
pub use filter::{RowFilter, StatusFilter, TypeFilter};
pub use languages::{LANGUAGES, LanguageInfo, target_code_for_folder, validate_target_language};
pub use layout::{
    LanguageFolder, XmlFileEntry, find_languages_dir, list_xml_files, require_languages_dir,
    scan_languages,
};
pub use placeholder::{PlaceholderSet, extract_placeholders, has_placeholders};
pub use session::{RowStatus, Session, TextRow};
pub use text::{LanguageFile, SourceText, TextOrigin, extract_texts, save_translations};
pub use xml::{Document, Element, Node};
