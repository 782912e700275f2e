//! Google Translate provider
//!
//! Two endpoints are supported:
//!
//! - The Cloud Translation API v2, authenticated with an API key read from
//!   the `GOOGLE_TRANSLATE_API_KEY` environment variable. Obtain a key from
//!   https://console.cloud.google.com/
//! - The keyless web endpoint (`translate_a/single?client=gtx`) used by the
//!   browser widget. No account is needed, but it takes one string per
//!   request and may throttle heavy use.
//!
//! # Example
//!
//! ```ignore
//! use rimlang_mt::{GoogleTranslateProvider, MachineTranslator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key if set, keyless endpoint otherwise
//!     let provider = GoogleTranslateProvider::from_env_or_keyless()?;
//!
//!     let result = provider.translate("Hello, world!", "auto", "es").await?;
//!     println!("{}", result);
//!
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::translator::{AUTO_DETECT, MachineTranslator, normalize_locale, validate_locale};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{Value, json};
use tracing::debug;

pub const API_KEY_ENV: &str = "GOOGLE_TRANSLATE_API_KEY";

const CLOUD_URL: &str = "https://translation.googleapis.com/language/translate/v2";
const WEB_URL: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Clone)]
enum Endpoint {
    Cloud { api_key: String },
    Web,
}

/// Google Translate provider
///
/// The Cloud endpoint translates batches with automatic request chunking;
/// the web endpoint sends one request per string.
#[derive(Clone)]
pub struct GoogleTranslateProvider {
    endpoint: Endpoint,
    /// HTTP client for async requests
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateProvider {
    /// Maximum number of texts per API request
    /// Google Translate v2 API accepts up to 128 texts per request
    const MAX_BATCH_SIZE: usize = 128;

    /// Maximum characters per string (30KB per Google Translate API limits)
    const MAX_CHARS_PER_STRING: usize = 30_000;

    /// Maximum characters per string on the web endpoint, which takes the
    /// text in the query string
    const MAX_WEB_CHARS: usize = 5_000;

    fn http_client() -> MtResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| MtError::NetworkError(format!("Failed to create HTTP client: {}", e)))
    }

    /// Create a provider for the Cloud Translation API
    ///
    /// # Arguments
    ///
    /// * `api_key` - Google Translate API key
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(MtError)` - If API key is empty or HTTP client creation fails
    pub fn new(api_key: String) -> MtResult<Self> {
        if api_key.trim().is_empty() {
            return Err(MtError::ConfigError("API key cannot be empty".to_string()));
        }

        Ok(Self {
            endpoint: Endpoint::Cloud { api_key },
            client: Self::http_client()?,
            base_url: CLOUD_URL.to_string(),
        })
    }

    /// Create a provider for the keyless web endpoint
    pub fn keyless() -> MtResult<Self> {
        Ok(Self {
            endpoint: Endpoint::Web,
            client: Self::http_client()?,
            base_url: WEB_URL.to_string(),
        })
    }

    /// Create a Cloud provider from the `GOOGLE_TRANSLATE_API_KEY` environment variable
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New provider instance
    /// * `Err(MtError)` - If environment variable is not set or creation fails
    pub fn from_env() -> MtResult<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            MtError::ConfigError(format!("{} environment variable not set", API_KEY_ENV))
        })?;

        Self::new(api_key)
    }

    /// Cloud provider if an API key is configured, keyless otherwise
    pub fn from_env_or_keyless() -> MtResult<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Self::new(key),
            _ => {
                debug!("{} not set, using the keyless endpoint", API_KEY_ENV);
                Self::keyless()
            }
        }
    }

    pub fn is_keyless(&self) -> bool {
        matches!(self.endpoint, Endpoint::Web)
    }

    fn max_chars(&self) -> usize {
        match self.endpoint {
            Endpoint::Cloud { .. } => Self::MAX_CHARS_PER_STRING,
            Endpoint::Web => Self::MAX_WEB_CHARS,
        }
    }

    /// Chunk a batch of texts into API-safe sizes
    ///
    /// Google Translate API has a limit of 128 texts per request.
    fn chunk_batch(texts: &[String]) -> Vec<&[String]> {
        texts.chunks(Self::MAX_BATCH_SIZE).collect()
    }

    /// Turn a non-success HTTP response into an error
    async fn check_status(response: reqwest::Response) -> MtResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(if status.is_client_error() {
            MtError::ConfigError(format!("API client error ({}): {}", status, error_text))
        } else {
            MtError::TranslationError(format!("API server error ({}): {}", status, error_text))
        })
    }

    /// Translate a single chunk of texts via the Cloud API
    async fn translate_chunk(
        &self,
        api_key: &str,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        let url = Url::parse_with_params(&self.base_url, &[("key", api_key)])
            .map_err(|e| MtError::ConfigError(format!("Invalid API URL: {}", e)))?;

        let mut body = json!({
            "q": texts,
            "target": normalize_locale(target_locale),
            "format": "text"
        });
        if source_locale != AUTO_DETECT {
            body["source"] = json!(normalize_locale(source_locale));
        }

        let response = self.client.post(url).json(&body).send().await?;
        let response = Self::check_status(response).await?;

        let json: Value = response.json().await.map_err(|e| {
            MtError::TranslationError(format!("Failed to parse API response: {}", e))
        })?;

        parse_cloud_response(&json)
    }

    /// Translate one string via the keyless endpoint
    async fn translate_web(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        let source = normalize_locale(source_locale);
        let target = normalize_locale(target_locale);
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("client", "gtx"),
                ("sl", source.as_str()),
                ("tl", target.as_str()),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .map_err(|e| MtError::ConfigError(format!("Invalid API URL: {}", e)))?;

        let response = self.client.get(url).send().await?;
        let response = Self::check_status(response).await?;

        let json: Value = response.json().await.map_err(|e| {
            MtError::TranslationError(format!("Failed to parse API response: {}", e))
        })?;

        parse_web_response(&json)
    }
}

/// Extract `data.translations[].translatedText` from a Cloud API response
fn parse_cloud_response(json: &Value) -> MtResult<Vec<String>> {
    let translations = json["data"]["translations"].as_array().ok_or_else(|| {
        MtError::TranslationError(
            "Invalid API response: missing 'data.translations' array".to_string(),
        )
    })?;

    translations
        .iter()
        .map(|t| {
            t["translatedText"]
                .as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| {
                    MtError::TranslationError(
                        "Invalid API response: missing 'translatedText' field".to_string(),
                    )
                })
        })
        .collect()
}

/// Join the translated sentence segments of a web endpoint response
///
/// The body looks like `[[["Hola. ", "Hello. ", ...], ["Adiós", "Bye", ...]], null, "en"]`.
fn parse_web_response(json: &Value) -> MtResult<String> {
    let segments = json
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            MtError::TranslationError("Invalid API response: missing segment array".to_string())
        })?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let api_key = match self.endpoint {
            Endpoint::Cloud { .. } => "***",
            Endpoint::Web => "none",
        };
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &api_key)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        if text.is_empty() {
            return Ok(String::new());
        }

        if text.chars().count() > self.max_chars() {
            return Err(MtError::TranslationError(format!(
                "Text exceeds maximum length of {} characters",
                self.max_chars()
            )));
        }

        match &self.endpoint {
            Endpoint::Cloud { api_key } => {
                let results = self
                    .translate_chunk(api_key, &[text.to_string()], source_locale, target_locale)
                    .await?;
                results.into_iter().next().ok_or_else(|| {
                    MtError::TranslationError("API returned no translations".to_string())
                })
            }
            Endpoint::Web => self.translate_web(text, source_locale, target_locale).await,
        }
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        for (i, text) in texts.iter().enumerate() {
            if text.chars().count() > self.max_chars() {
                return Err(MtError::TranslationError(format!(
                    "Text at index {} exceeds maximum length of {} characters",
                    i,
                    self.max_chars()
                )));
            }
        }

        let mut all_results = Vec::with_capacity(texts.len());
        match &self.endpoint {
            Endpoint::Cloud { api_key } => {
                for chunk in Self::chunk_batch(texts) {
                    let chunk_results = self
                        .translate_chunk(api_key, chunk, source_locale, target_locale)
                        .await?;
                    all_results.extend(chunk_results);
                }
            }
            Endpoint::Web => {
                for text in texts {
                    all_results.push(self.translate(text, source_locale, target_locale).await?);
                }
            }
        }

        if all_results.len() != texts.len() {
            return Err(MtError::TranslationError(format!(
                "Expected {} translations, got {}",
                texts.len(),
                all_results.len()
            )));
        }

        Ok(all_results)
    }

    fn provider_name(&self) -> &str {
        match self.endpoint {
            Endpoint::Cloud { .. } => "Google Translate",
            Endpoint::Web => "Google Translate (web)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Initialization Tests ==========

    #[test]
    fn test_new_with_valid_key() {
        let provider = GoogleTranslateProvider::new("test-api-key".to_string());
        assert!(provider.is_ok());
        let provider = provider.unwrap();
        assert_eq!(provider.provider_name(), "Google Translate");
        assert!(!provider.is_keyless());
    }

    #[test]
    fn test_new_with_empty_key() {
        let result = GoogleTranslateProvider::new("".to_string());
        match result {
            Err(MtError::ConfigError(msg)) => assert!(msg.contains("empty")),
            _ => panic!("Expected ConfigError"),
        }
    }

    #[test]
    fn test_new_with_whitespace_key() {
        let result = GoogleTranslateProvider::new("   ".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_keyless() {
        let provider = GoogleTranslateProvider::keyless().unwrap();
        assert!(provider.is_keyless());
        assert_eq!(provider.provider_name(), "Google Translate (web)");
    }

    #[test]
    fn test_env_fallbacks() {
        // Both env assertions live in one test so parallel tests cannot race
        unsafe {
            std::env::remove_var(API_KEY_ENV);
        }
        match GoogleTranslateProvider::from_env() {
            Err(MtError::ConfigError(msg)) => assert!(msg.contains("not set")),
            _ => panic!("Expected ConfigError"),
        }
        assert!(GoogleTranslateProvider::from_env_or_keyless().unwrap().is_keyless());
    }

    // ========== Chunking Tests ==========

    #[test]
    fn test_chunk_under_limit() {
        let texts = vec!["hello".to_string(), "world".to_string()];
        let chunks = GoogleTranslateProvider::chunk_batch(&texts);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 2);
    }

    #[test]
    fn test_chunk_partial_chunk() {
        let texts = (0..200).map(|i| format!("text{}", i)).collect::<Vec<_>>();
        let chunks = GoogleTranslateProvider::chunk_batch(&texts);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 128);
        assert_eq!(chunks[1].len(), 72);
    }

    #[test]
    fn test_chunk_empty() {
        let texts: Vec<String> = vec![];
        assert!(GoogleTranslateProvider::chunk_batch(&texts).is_empty());
    }

    // ========== Response Parsing Tests ==========

    #[test]
    fn test_parse_cloud_response() {
        let json = json!({
            "data": {"translations": [
                {"translatedText": "Hola"},
                {"translatedText": "Adiós", "detectedSourceLanguage": "en"}
            ]}
        });
        assert_eq!(parse_cloud_response(&json).unwrap(), vec!["Hola", "Adiós"]);
    }

    #[test]
    fn test_parse_cloud_response_missing_field() {
        let json = json!({"data": {"translations": [{"text": "Hola"}]}});
        assert!(parse_cloud_response(&json).is_err());
        assert!(parse_cloud_response(&json!({"error": {}})).is_err());
    }

    #[test]
    fn test_parse_web_response_joins_segments() {
        let json = json!([
            [
                ["Hola  NOMBRE . ", "Hello  NOMBRE . ", null, null, 10],
                ["Adiós.", "Bye.", null, null, 10]
            ],
            null,
            "en"
        ]);
        assert_eq!(parse_web_response(&json).unwrap(), "Hola  NOMBRE . Adiós.");
    }

    #[test]
    fn test_parse_web_response_invalid() {
        assert!(parse_web_response(&json!({"error": "x"})).is_err());
        assert!(parse_web_response(&json!([null, null, "en"])).is_err());
    }

    // ========== Validation Tests ==========

    #[tokio::test]
    async fn test_translate_empty_text() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        let result = provider.translate("", "en", "fr").await.unwrap();
        assert_eq!(result, "");
    }

    #[tokio::test]
    async fn test_translate_invalid_locales() {
        let provider = GoogleTranslateProvider::keyless().unwrap();
        assert!(provider.translate("hello", "invalid@code", "es").await.is_err());
        assert!(provider.translate("hello", "auto", "invalid#code").await.is_err());
    }

    #[tokio::test]
    async fn test_translate_text_too_long() {
        let provider = GoogleTranslateProvider::keyless().unwrap();
        let long_text = "x".repeat(GoogleTranslateProvider::MAX_WEB_CHARS + 1);
        match provider.translate(&long_text, "auto", "es").await {
            Err(MtError::TranslationError(msg)) => assert!(msg.contains("exceeds maximum")),
            _ => panic!("Expected TranslationError"),
        }
    }

    #[tokio::test]
    async fn test_batch_empty() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        let results = provider.translate_batch(&[], "en", "fr").await.unwrap();
        assert!(results.is_empty());
    }

    // ========== Debug Implementation Test ==========

    #[test]
    fn test_debug_output() {
        let provider = GoogleTranslateProvider::new("test-key".to_string()).unwrap();
        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains("test-key"));
    }

    // ========== Integration Tests (hit the network) ==========

    #[tokio::test]
    #[ignore] // Run with: cargo test --ignored
    async fn test_real_api_single_translation() {
        if std::env::var(API_KEY_ENV).is_err() {
            eprintln!("Skipping: {} not set", API_KEY_ENV);
            return;
        }

        let provider = GoogleTranslateProvider::from_env().unwrap();
        let result = provider.translate("Hello", "en", "es").await.unwrap();
        println!("Translation: {} → {}", "Hello", result);
        assert!(!result.is_empty());
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test --ignored
    async fn test_real_keyless_keeps_sentinels() {
        let provider = GoogleTranslateProvider::keyless().unwrap();
        let text = "Hello  NOMBRE , you found  PRIMER_ELEMENTO  items";
        let result = provider.translate(text, "auto", "es").await.unwrap();

        println!("Original: {}", text);
        println!("Translated: {}", result);
        assert!(result.contains("NOMBRE"));
        assert!(result.contains("PRIMER_ELEMENTO"));
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test --ignored
    async fn test_real_api_invalid_key() {
        let provider = GoogleTranslateProvider::new("invalid-key-xyz".to_string()).unwrap();
        let result = provider.translate("hello", "en", "fr").await;
        match result {
            Err(MtError::ConfigError(_)) | Err(MtError::TranslationError(_)) => {}
            _ => panic!("Expected error from invalid API key"),
        }
    }
}
