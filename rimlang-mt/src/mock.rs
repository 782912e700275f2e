//! Mock Machine Translator for testing
//!
//! A deterministic, network-free provider for exercising the pipeline
//! without API keys. Every request is recorded, so tests can check what
//! text actually reached the provider (for instance, the masked form of a
//! string with placeholders).
//!
//! # Example
//!
//! ```ignore
//! use rimlang_mt::{MachineTranslator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hello", "auto", "es").await.unwrap();
//!     assert_eq!(result, "hello_es");
//!     assert_eq!(mock.calls(), 1);
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "hello" → "hello_es"
    /// Sentinel words pass through untouched
    Suffix,

    /// Predefined source → translation pairs, suffix mode for anything else
    Mappings(HashMap<String, String>),

    /// Reverse the order of whitespace-separated words
    Reorder,

    /// Fail every request with this message
    Error(String),

    /// Fail requests whose text contains this substring, suffix the rest
    FailMatching(String),

    /// Return an empty string, as a provider does for text it cannot handle
    Empty,

    /// No-op: return input unchanged
    NoOp,
}

/// Mock translator that simulates various translation scenarios
///
/// Clones share the call counter and request log, so a clone handed to a
/// background task can still be inspected by the test that created it.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockTranslator::new(MockMode::Suffix);
    /// ```
    pub fn new(mode: MockMode) -> Self {
        Self::with_delay(mode, 0)
    }

    /// Create a MockTranslator with simulated network delay
    ///
    /// # Arguments
    ///
    /// * `mode` - The translation mode
    /// * `delay_ms` - Simulated delay in milliseconds
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            mode,
            delay_ms,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mappings mode from `(source, translation)` pairs
    pub fn with_mappings<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let map = pairs
            .into_iter()
            .map(|(source, translation)| (source.to_string(), translation.to_string()))
            .collect();
        Self::new(MockMode::Mappings(map))
    }

    /// Number of texts translated so far, failed requests included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every text received, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn record(&self, text: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(text.to_string());
        }
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        self.record(text);

        let suffixed = || format!("{}_{}", text, target);
        match &self.mode {
            MockMode::Suffix => Ok(suffixed()),
            MockMode::Mappings(map) => Ok(map.get(text).cloned().unwrap_or_else(suffixed)),
            MockMode::Reorder => Ok(text.split_whitespace().rev().collect::<Vec<_>>().join(" ")),
            MockMode::Error(msg) => Err(MtError::TranslationError(msg.clone())),
            MockMode::FailMatching(needle) if text.contains(needle.as_str()) => Err(
                MtError::TranslationError(format!("mock failure for '{}'", text)),
            ),
            MockMode::FailMatching(_) => Ok(suffixed()),
            MockMode::Empty => Ok(String::new()),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        self.apply_delay().await;
        self.apply_translation(text, target_locale)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_locale: &str,
        target_locale: &str,
    ) -> MtResult<Vec<String>> {
        // Simulated delay is per batch, not per string
        self.apply_delay().await;

        texts
            .iter()
            .map(|text| self.apply_translation(text, target_locale))
            .collect()
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
