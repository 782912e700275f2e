use rimlang::ModError;
use thiserror::Error;

/// Error types for machine translation
#[derive(Debug, Error)]
pub enum MtError {
    /// The provider rejected or failed a translation
    #[error("Translation error: {0}")]
    TranslationError(String),
    /// Missing or invalid provider configuration (API key, client setup)
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Transport failure talking to the provider
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Locale code the provider cannot accept
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Translation cache could not be read or written
    #[error("Cache error: {0}")]
    CacheError(String),
    /// A batch translation is already running
    #[error("A batch translation is already in progress")]
    BatchInProgress,
    /// Failure in the mod files themselves
    #[error(transparent)]
    Mod(#[from] ModError),
}

impl From<reqwest::Error> for MtError {
    fn from(error: reqwest::Error) -> Self {
        MtError::NetworkError(error.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
