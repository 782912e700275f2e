//! Placeholder-safe machine translation for RimWorld mods
//!
//! This crate translates the texts extracted by `rimlang` without breaking
//! the `{placeholders}` the game substitutes at runtime.
//! # Workflow Example
//!
//! ```ignore
//! use rimlang_mt::{
//!     BatchItem, GoogleTranslateProvider, TranslationCache, TranslationPipeline,
//! };
//! use rimlang::text::LanguageFile;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Load a language file
//!     let file = LanguageFile::open("Languages/English/Keyed/Main.xml".as_ref())?;
//!
//!     // 2. Build a pipeline: provider, masking adapter, target language
//!     let provider = Arc::new(GoogleTranslateProvider::from_env_or_keyless()?);
//!     let cache_path = rimlang::default_cache_path("es");
//!     let pipeline = TranslationPipeline::new(provider, "es")?.with_cache_path(&cache_path);
//!
//!     // 3. Translate every text, reusing cached translations
//!     let mut cache = TranslationCache::load_for(&cache_path, "es").unwrap_or_default();
//!     let items: Vec<BatchItem> = file
//!         .texts
//!         .iter()
//!         .map(|t| BatchItem::new(&t.id, &t.text))
//!         .collect();
//!     let report = pipeline.translate_batch(&mut cache, &items).await;
//!
//!     println!("{}", report.status()); // "12/12 translated"
//!     Ok(())
//! }
//! ```

pub mod alternatives;
pub mod cache;
pub mod error;
pub mod google_translate;
pub mod masking;
pub mod mock;
pub mod naming;
pub mod pipeline;
pub mod translator;
pub mod workbench;


// Re-export main types for convenient access
pub use alternatives::{TranslationResult, generate_alternatives, repair_placeholders};
pub use cache::{TranslationCache, normalize_key};
pub use error::{MtError, MtResult};
pub use google_translate::GoogleTranslateProvider;
pub use masking::{PlaceholderTranslator, SentinelTable};
pub use mock::{MockMode, MockTranslator};
pub use naming::{NamingPattern, NamingStyle, analyze as analyze_naming};
pub use pipeline::{
    BatchItem, BatchReport, CachedTranslation, DefsReport, ItemOutcome, ItemResult,
    TranslationPipeline,
};
pub use translator::{AUTO_DETECT, MachineTranslator, normalize_locale, validate_locale};
pub use workbench::{Command, Event, Workbench};
