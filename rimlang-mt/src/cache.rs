//! On-disk translation cache
//!
//! Maps a normalized source string (trimmed, lower-cased) to its
//! translation and to the placeholders extracted from it. The whole cache
//! is one JSON document, read fully at startup and rewritten wholesale on
//! save:
//!
//! ```json
//! {
//!   "target": "es",
//!   "translations": { "fire damage": "daño por fuego" },
//!   "placeholders": { "hello {name}": ["{name}"] },
//!   "timestamp": "2024-05-01T12:00:00+02:00"
//! }
//! ```
//!
//! Strings that differ only in case or surrounding whitespace share a slot.
//!
//! Keys carry no target language, so a cache holds translations into one
//! language only. The first pipeline to use a cache binds it to its target;
//! a pipeline with another target empties it first. Keep one file per
//! target (see `rimlang::config::default_cache_path`).

use crate::error::{MtError, MtResult};
use indexmap::IndexMap;
use rimlang::placeholder::PlaceholderSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Size above which [`TranslationCache::save`] evicts
pub const MAX_ENTRIES: usize = 1000;

/// Number of translations kept after eviction
pub const RETAINED_ENTRIES: usize = 800;

/// Cache key for a source string
pub fn normalize_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// In-memory translation cache
///
/// Insertion order is the only recency signal: eviction drops the oldest
/// inserted translations no matter how often they were read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationCache {
    /// Target language of the cached translations, empty until bound
    #[serde(default)]
    target: String,
    #[serde(default, alias = "traducciones")]
    translations: IndexMap<String, String>,
    #[serde(default)]
    placeholders: IndexMap<String, PlaceholderSet>,
    #[serde(default)]
    timestamp: String,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cache already bound to `target`
    pub fn for_target(target: &str) -> Self {
        Self {
            target: target.to_string(),
            ..Self::default()
        }
    }

    /// Target language of the cached translations, empty if not bound yet
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Bind the cache to `target`
    ///
    /// An unbound cache takes the target as is. A cache bound to another
    /// target loses its translations; placeholder sets do not depend on the
    /// target and are kept. Returns true if translations were dropped.
    pub fn bind_target(&mut self, target: &str) -> bool {
        if self.target == target {
            return false;
        }
        let previous = std::mem::replace(&mut self.target, target.to_string());
        if previous.is_empty() {
            return false;
        }
        warn!(
            "Dropping {} cached translations into '{}': now translating into '{}'",
            self.translations.len(),
            previous,
            target
        );
        self.translations.clear();
        true
    }

    pub fn get(&self, text: &str) -> Option<&str> {
        self.translations
            .get(&normalize_key(text))
            .map(String::as_str)
    }

    /// Store a translation
    ///
    /// Overwriting an existing key keeps its original insertion position.
    pub fn put(&mut self, text: &str, translation: impl Into<String>) {
        self.translations
            .insert(normalize_key(text), translation.into());
    }

    pub fn get_placeholders(&self, text: &str) -> Option<&PlaceholderSet> {
        self.placeholders.get(&normalize_key(text))
    }

    pub fn put_placeholders(&mut self, text: &str, placeholders: PlaceholderSet) {
        self.placeholders.insert(normalize_key(text), placeholders);
    }

    /// Number of cached translations
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Time of the last save, RFC 3339, empty if never saved
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Cached `(key, translation)` pairs, oldest first
    pub fn translations(&self) -> impl Iterator<Item = (&str, &str)> {
        self.translations
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Keep only the `RETAINED_ENTRIES` most recently inserted translations
    /// once there are more than `MAX_ENTRIES`
    ///
    /// Returns the number of translations dropped. Placeholder sets are
    /// left alone.
    pub fn evict(&mut self) -> usize {
        if self.translations.len() <= MAX_ENTRIES {
            return 0;
        }
        let dropped = self.translations.len() - RETAINED_ENTRIES;
        self.translations.drain(..dropped);
        dropped
    }

    /// Read the cache at `path`
    ///
    /// A missing file gives an empty cache. An unreadable or corrupt file is
    /// an error; callers log it and carry on with an empty cache.
    pub fn load(path: &Path) -> MtResult<Self> {
        if !path.exists() {
            debug!("No translation cache at {}", path.display());
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| MtError::CacheError(format!("{}: {}", path.display(), e)))?;
        let cache: Self = serde_json::from_str(&contents)
            .map_err(|e| MtError::CacheError(format!("{}: {}", path.display(), e)))?;
        debug!(
            "Loaded {} cached translations from {}",
            cache.len(),
            path.display()
        );
        Ok(cache)
    }

    /// [`TranslationCache::load`], then bind the result to `target`
    pub fn load_for(path: &Path, target: &str) -> MtResult<Self> {
        let mut cache = Self::load(path)?;
        cache.bind_target(target);
        Ok(cache)
    }

    /// Evict, stamp and write the cache to `path`, creating parent folders
    pub fn save(&mut self, path: &Path) -> MtResult<()> {
        let dropped = self.evict();
        if dropped > 0 {
            info!("Evicted {} old translations from the cache", dropped);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| MtError::CacheError(format!("{}: {}", parent.display(), e)))?;
        }
        self.timestamp = chrono::Local::now().to_rfc3339();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MtError::CacheError(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| MtError::CacheError(format!("{}: {}", path.display(), e)))?;
        debug!("Saved {} translations to {}", self.len(), path.display());
        Ok(())
    }
}
