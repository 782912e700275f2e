//! Persisted user settings
//!
//! Settings live in `config.json` inside the per-user directory
//! `~/.rimworld_editor`, next to the translation cache. Set
//! `RIMLANG_CONFIG_DIR` to use another directory.

use crate::error::{ModError, ModResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CONFIG_DIR_ENV: &str = "RIMLANG_CONFIG_DIR";
pub const CONFIG_FILE: &str = "config.json";
const CACHE_FILE_STEM: &str = "cache_traducciones";

const DEFAULT_DIR_NAME: &str = ".rimworld_editor";

/// Directory holding the config file and the translation cache
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Translation cache file for one target language inside `dir`
///
/// Each target has its own file (`cache_traducciones_de.json`), since
/// cache keys are source strings only.
pub fn cache_path_in(dir: &Path, target: &str) -> PathBuf {
    dir.join(format!("{}_{}.json", CACHE_FILE_STEM, target.trim()))
}

/// Default location of the translation cache for `target`
pub fn default_cache_path(target: &str) -> PathBuf {
    cache_path_in(&config_dir(), target)
}

fn default_theme_dark() -> bool {
    true
}

fn default_target_language() -> String {
    "es".to_string()
}

/// Application settings
///
/// Older config files used Spanish keys; those are still accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_theme_dark", alias = "tema_oscuro")]
    pub theme_dark: bool,
    #[serde(default, alias = "carpeta_mod_reciente")]
    pub recent_mod_folder: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme_dark: default_theme_dark(),
            recent_mod_folder: String::new(),
            target_language: default_target_language(),
            timestamp: String::new(),
        }
    }
}

impl AppConfig {
    /// Load from the default directory, see [`AppConfig::load_from`]
    pub fn load() -> Self {
        Self::load_from(&config_dir())
    }

    /// Load `config.json` from `dir`
    ///
    /// A missing file gives the defaults. So does an unreadable or corrupt
    /// one, after logging a warning.
    pub fn load_from(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::read(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config: {}", e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> ModResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| ModError::io(path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| ModError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&mut self) -> ModResult<()> {
        self.save_to(&config_dir())
    }

    /// Write `config.json` into `dir`, stamping the current time
    pub fn save_to(&mut self, dir: &Path) -> ModResult<()> {
        fs::create_dir_all(dir).map_err(|e| ModError::io(dir, e))?;
        self.timestamp = chrono::Local::now().to_rfc3339();
        let path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ModError::Config(e.to_string()))?;
        fs::write(&path, json).map_err(|e| ModError::io(&path, e))?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// The recent mod folder, if it is set and still exists
    pub fn recent_mod_folder(&self) -> Option<PathBuf> {
        Some(PathBuf::from(&self.recent_mod_folder))
            .filter(|p| !self.recent_mod_folder.is_empty() && p.is_dir())
    }
}
