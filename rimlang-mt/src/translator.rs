//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction,
//! so the pipeline can run against Google Translate, the mock provider, or
//! the placeholder-masking adapter that wraps either of them.
//!
//! # Example
//!
//! ```ignore
//! use rimlang_mt::{GoogleTranslateProvider, MachineTranslator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::keyless()?;
//!
//!     // Source "auto" lets the provider detect the language
//!     let result = provider.translate("fire damage", "auto", "es").await?;
//!     println!("{}", result); // "daño por fuego"
//!
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use async_trait::async_trait;

/// Source locale that asks the provider to detect the language
pub const AUTO_DETECT: &str = "auto";

/// Generic trait for machine translation providers
///
/// Implementations of this trait handle the actual translation work,
/// whether through an API (Google Translate) or deterministic logic (Mock).
///
/// All methods are async to support I/O-bound operations like network requests.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string from source to target locale
    ///
    /// # Arguments
    ///
    /// * `text` - The text to translate
    /// * `source_locale` - Source language code, or `"auto"`
    /// * `target_locale` - Target language code (e.g., "es", "zh-CN")
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(MtError)` - If translation fails
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String>;

    /// Translate multiple strings in a single batch operation
    ///
    /// Output order and length match the input. Implementations may chunk
    /// large batches internally.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>>;

    /// Name of this provider, for logs and status messages
    fn provider_name(&self) -> &str;
}

/// Normalize a locale code to what translation providers expect
///
/// Region and script subtags are dropped, except for Chinese where the
/// region selects the script:
/// - `en-US` → `en`
/// - `pt_BR` → `pt`
/// - `zh-cn` → `zh-CN`
/// - `auto` → `auto`
///
/// # Example
///
/// ```ignore
/// assert_eq!(normalize_locale("es-419"), "es");
/// assert_eq!(normalize_locale("zh-TW"), "zh-TW");
/// ```
pub fn normalize_locale(locale: &str) -> String {
    let mut parts = locale.split(['-', '_']);
    let language = parts.next().unwrap_or(locale).to_lowercase();
    if language == "zh" {
        if let Some(region) = parts.next().filter(|r| r.len() == 2) {
            return format!("zh-{}", region.to_uppercase());
        }
    }
    language
}

/// Validate that a locale code is in acceptable format
///
/// Checks that the locale code contains only alphanumeric characters,
/// hyphens, and underscores. `"auto"` is accepted.
///
/// # Example
///
/// ```ignore
/// validate_locale("es")?; // OK
/// validate_locale("auto")?; // OK
/// validate_locale("invalid@code").unwrap_err(); // Error
/// ```
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    Ok(())
}
