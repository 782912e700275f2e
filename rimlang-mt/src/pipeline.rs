//! Cached, placeholder-safe translation of mod texts
//!
//! [`TranslationPipeline`] ties the pieces together: cache lookup,
//! placeholder masking around the provider, cache store, and a throttled
//! batch loop that never aborts on a single failed item.
//!
//! # Example
//!
//! ```ignore
//! use rimlang_mt::{GoogleTranslateProvider, TranslationCache, TranslationPipeline, BatchItem};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Arc::new(GoogleTranslateProvider::from_env_or_keyless()?);
//!     let pipeline = TranslationPipeline::new(provider, "es")?
//!         .with_cache_path(rimlang::default_cache_path("es"));
//!
//!     let mut cache = TranslationCache::load_for(&rimlang::default_cache_path("es"), "es")?;
//!     let items = vec![BatchItem::new("GreetingMessage", "Hello {name}")];
//!     let report = pipeline.translate_batch(&mut cache, &items).await;
//!     println!("{}", report.status()); // "1/1 translated"
//!     Ok(())
//! }
//! ```

use crate::alternatives::{TranslationResult, generate_alternatives};
use crate::cache::TranslationCache;
use crate::error::{MtError, MtResult};
use crate::masking::{PlaceholderTranslator, SentinelTable};
use crate::naming;
use crate::translator::{AUTO_DETECT, MachineTranslator, normalize_locale, validate_locale};
use rimlang::about::ModAbout;
use rimlang::defs::DefsFile;
use rimlang::placeholder::extract_placeholders;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause after each provider call in a batch
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(200);

/// Pause after each provider call when translating defs
pub const DEFAULT_DEFS_DELAY: Duration = Duration::from_millis(100);

/// A translation and whether it came from the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTranslation {
    pub text: String,
    pub from_cache: bool,
}

/// One text of a batch, in selection order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    pub id: String,
    pub text: String,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// What happened to one batch item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Translated(String),
    Cached(String),
    /// Blank or single-character text, never sent
    Skipped,
    /// Provider error or empty translation
    Failed(String),
}

impl ItemOutcome {
    pub fn translation(&self) -> Option<&str> {
        match self {
            ItemOutcome::Translated(text) | ItemOutcome::Cached(text) => Some(text),
            ItemOutcome::Skipped | ItemOutcome::Failed(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.translation().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub id: String,
    pub outcome: ItemOutcome,
}

/// Summary of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub translated: usize,
    pub from_cache: usize,
    /// Skipped items count as failures
    pub failed: usize,
    pub results: Vec<ItemResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.translated + self.from_cache
    }

    /// `X/Y translated`, with ` (Z failures)` when anything failed
    pub fn status(&self) -> String {
        let mut status = format!("{}/{} translated", self.succeeded(), self.total);
        if self.failed > 0 {
            status.push_str(&format!(" ({} failures)", self.failed));
        }
        status
    }

    fn record(&mut self, result: ItemResult) {
        match &result.outcome {
            ItemOutcome::Translated(_) => self.translated += 1,
            ItemOutcome::Cached(_) => self.from_cache += 1,
            ItemOutcome::Skipped | ItemOutcome::Failed(_) => self.failed += 1,
        }
        self.results.push(result);
    }
}

/// Summary of a defs translation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefsReport {
    pub total: usize,
    /// Defs with at least one field changed
    pub translated: usize,
    pub fields_changed: usize,
}

impl DefsReport {
    pub fn status(&self) -> String {
        format!("{} of {} defs translated", self.translated, self.total)
    }
}

/// Translation settings shared by every operation of a session
#[derive(Debug, Clone)]
pub struct TranslationPipeline {
    translator: PlaceholderTranslator,
    source_locale: String,
    target_locale: String,
    delay: Duration,
    defs_delay: Duration,
    cache_path: Option<PathBuf>,
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

impl TranslationPipeline {
    /// Pipeline translating from an auto-detected language into `target_locale`
    ///
    /// # Arguments
    ///
    /// * `provider` - Translation provider, wrapped in the masking adapter
    /// * `target_locale` - Target language code (e.g., "es", "zh-CN")
    ///
    /// # Returns
    ///
    /// * `Err(MtError::InvalidLocale)` - If the target code is malformed
    pub fn new(provider: Arc<dyn MachineTranslator>, target_locale: &str) -> MtResult<Self> {
        validate_locale(target_locale)?;
        Ok(Self {
            translator: PlaceholderTranslator::new(provider),
            source_locale: AUTO_DETECT.to_string(),
            target_locale: normalize_locale(target_locale),
            delay: DEFAULT_BATCH_DELAY,
            defs_delay: DEFAULT_DEFS_DELAY,
            cache_path: None,
        })
    }

    pub fn with_source_locale(mut self, source_locale: &str) -> MtResult<Self> {
        validate_locale(source_locale)?;
        self.source_locale = normalize_locale(source_locale);
        Ok(self)
    }

    pub fn with_table(mut self, table: SentinelTable) -> Self {
        self.translator = PlaceholderTranslator::with_table(self.translator.inner().clone(), table);
        self
    }

    /// Pause after each provider call of a batch
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_defs_delay(mut self, delay: Duration) -> Self {
        self.defs_delay = delay;
        self
    }

    /// Save the cache here when a batch completes
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Where batches save the cache, if anywhere
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    pub fn target_locale(&self) -> &str {
        &self.target_locale
    }

    pub fn source_locale(&self) -> &str {
        &self.source_locale
    }

    pub fn provider_name(&self) -> &str {
        self.translator.provider_name()
    }

    pub fn translator(&self) -> &PlaceholderTranslator {
        &self.translator
    }

    /// Translate one text through the cache
    ///
    /// The cache is bound to the target language first, which empties a
    /// cache holding another language. A cache hit returns without calling
    /// the provider. Otherwise the placeholders are taken from the cache
    /// (or extracted and recorded), the text is masked, translated and unmasked, and the result is
    /// cached if it still contains every placeholder.
    pub async fn translate_text(
        &self,
        cache: &mut TranslationCache,
        text: &str,
    ) -> MtResult<CachedTranslation> {
        cache.bind_target(&self.target_locale);
        if let Some(hit) = cache.get(text) {
            debug!("Cache hit for '{}'", text);
            return Ok(CachedTranslation {
                text: hit.to_string(),
                from_cache: true,
            });
        }

        let placeholders = match cache.get_placeholders(text) {
            Some(placeholders) => placeholders.clone(),
            None => {
                let placeholders = extract_placeholders(text);
                cache.put_placeholders(text, placeholders.clone());
                placeholders
            }
        };

        let translated = self
            .translator
            .translate_with_placeholders(
                text,
                &placeholders,
                &self.source_locale,
                &self.target_locale,
            )
            .await?;

        if translated.trim().is_empty() {
            return Err(MtError::TranslationError(format!(
                "{} returned an empty translation",
                self.provider_name()
            )));
        }

        if placeholders.all_present_in(&translated) {
            cache.put(text, translated.clone());
        } else {
            warn!(
                "Not caching translation of '{}': placeholders lost ({})",
                text,
                placeholders.missing_from(&translated).collect::<Vec<_>>().join(", ")
            );
        }

        Ok(CachedTranslation {
            text: translated,
            from_cache: false,
        })
    }

    /// Translate one text and offer pattern-preserving alternatives
    ///
    /// Alternatives are only generated for texts without placeholders.
    pub async fn translate_with_alternatives(
        &self,
        cache: &mut TranslationCache,
        text: &str,
    ) -> MtResult<TranslationResult> {
        let translated = self.translate_text(cache, text).await?;
        let mut result = TranslationResult::new(translated.text);

        let placeholders = extract_placeholders(text);
        if placeholders.is_empty() {
            let pattern = naming::analyze(text);
            result.alternatives = generate_alternatives(
                &result.text,
                &pattern,
                &placeholders,
                self.translator.table(),
            );
        }
        Ok(result)
    }

    /// Translate a batch, see [`TranslationPipeline::translate_batch_with`]
    pub async fn translate_batch(
        &self,
        cache: &mut TranslationCache,
        items: &[BatchItem],
    ) -> BatchReport {
        self.translate_batch_with(cache, items, |_| {}).await
    }

    /// Translate `items` in order, reporting each result to `on_item`
    ///
    /// Items of one character or less are skipped and counted as failures.
    /// Provider errors are logged and counted; the batch goes on. After
    /// each provider call the pipeline pauses for the configured delay;
    /// cache hits do not pause. When a cache path is set the cache is saved
    /// at the end, and a failed save is only logged.
    pub async fn translate_batch_with<F>(
        &self,
        cache: &mut TranslationCache,
        items: &[BatchItem],
        mut on_item: F,
    ) -> BatchReport
    where
        F: FnMut(&ItemResult) + Send,
    {
        let mut report = BatchReport {
            total: items.len(),
            ..BatchReport::default()
        };
        info!(
            "Translating {} texts with {} into {}",
            items.len(),
            self.provider_name(),
            self.target_locale
        );

        for item in items {
            let outcome = if item.text.trim().chars().count() <= 1 {
                debug!("Skipping '{}': nothing to translate", item.id);
                ItemOutcome::Skipped
            } else {
                match self.translate_text(cache, &item.text).await {
                    Ok(CachedTranslation {
                        text,
                        from_cache: true,
                    }) => ItemOutcome::Cached(text),
                    Ok(CachedTranslation { text, .. }) => {
                        pause(self.delay).await;
                        ItemOutcome::Translated(text)
                    }
                    Err(e) => {
                        warn!("Error translating {}: {}", item.id, e);
                        pause(self.delay).await;
                        ItemOutcome::Failed(e.to_string())
                    }
                }
            };

            let result = ItemResult {
                id: item.id.clone(),
                outcome,
            };
            on_item(&result);
            report.record(result);
        }

        if let Some(path) = &self.cache_path {
            if let Err(e) = cache.save(path) {
                warn!("Could not save translation cache: {}", e);
            }
        }
        info!("{}", report.status());
        report
    }

    /// Translate the label and description of defs in place
    ///
    /// Only fields longer than one character are sent. A field changes
    /// when the provider returns a non-empty text that differs from the
    /// original; errors skip the field. `def_names` limits the run to the
    /// named defs. The file is not saved.
    pub async fn translate_defs(
        &self,
        defs: &mut DefsFile,
        def_names: Option<&[String]>,
    ) -> DefsReport {
        let entries: Vec<_> = defs
            .entries
            .iter()
            .filter(|entry| def_names.is_none_or(|names| names.contains(&entry.def_name)))
            .cloned()
            .collect();
        let mut report = DefsReport {
            total: entries.len(),
            ..DefsReport::default()
        };

        for entry in &entries {
            let mut changed = false;
            for (field, text) in defs.translatable_fields(entry) {
                match self
                    .translator
                    .translate_preserving_placeholders(
                        &text,
                        &self.source_locale,
                        &self.target_locale,
                    )
                    .await
                {
                    Ok(translated) => {
                        let translated = translated.trim();
                        if !translated.is_empty()
                            && translated != text
                            && defs.set_field(entry, field, translated)
                        {
                            report.fields_changed += 1;
                            changed = true;
                        }
                        pause(self.defs_delay).await;
                    }
                    Err(e) => warn!("Error translating {}/{}: {}", entry.def_name, field, e),
                }
            }
            if changed {
                report.translated += 1;
            }
        }

        info!("{}", report.status());
        report
    }

    /// Machine-translate the description of a mod in place
    ///
    /// Goes through the masking adapter without the cache. A blank
    /// description is left alone and gives `Ok(false)`; an empty
    /// translation is an error. The About file is not saved.
    pub async fn translate_description(&self, about: &mut ModAbout) -> MtResult<bool> {
        let description = about.description.trim();
        if description.is_empty() {
            debug!("No description to translate");
            return Ok(false);
        }

        let translated = self
            .translator
            .translate_preserving_placeholders(
                description,
                &self.source_locale,
                &self.target_locale,
            )
            .await?;
        let translated = translated.trim();
        if translated.is_empty() {
            return Err(MtError::TranslationError(
                "Could not translate the description".to_string(),
            ));
        }

        let changed = translated != description;
        about.description = translated.to_string();
        info!("Description translated into {}", self.target_locale);
        Ok(changed)
    }
}
