//! Error types for mod folder, XML and configuration operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing a RimWorld mod on disk
#[derive(Debug, Error)]
pub enum ModError {
    /// Filesystem error, with the path that caused it
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Malformed XML, or a failure while serializing it back
    #[error("XML error in '{path}': {message}")]
    Xml { path: PathBuf, message: String },
    /// No `Languages` folder anywhere under the mod root
    #[error("No 'Languages' folder found under '{0}'")]
    LanguagesFolderMissing(PathBuf),
    /// Target language folder is already present
    #[error("Language '{0}' already exists")]
    LanguageExists(String),
    /// Referenced language folder does not exist
    #[error("Language '{0}' not found")]
    LanguageNotFound(String),
    /// Language code that cannot be parsed as a locale
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),
    /// A file or element the caller asked for is missing
    #[error("Not found: {0}")]
    NotFound(String),
    /// Configuration file could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ModError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ModError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ModError::Xml {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for mod operations
pub type ModResult<T> = Result<T, ModError>;
