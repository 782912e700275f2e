//! Command queue driving a [`Session`] from background tasks
//!
//! Slow work (scanning folders, parsing files, translating) runs on tokio
//! tasks. Each task posts an [`Event`] to a channel when it is done, and
//! the owner of the [`Workbench`] drains the channel with
//! [`Workbench::apply`], so session state is only ever touched from one
//! place and in arrival order.
//!
//! Only one batch translation runs at a time. The translation cache moves
//! into the batch task and comes back with [`Event::BatchFinished`]; while
//! it is away, another batch is refused with [`MtError::BatchInProgress`].
//!
//! Dropping the workbench while tasks are running is fine: their events
//! are discarded. A task that panics still posts an event
//! ([`Event::TaskFailed`] or [`Event::BatchAborted`]), so
//! [`Workbench::settle`] returns and a lost cache is reloaded.
//!
//! # Example
//!
//! ```ignore
//! let mut workbench = Workbench::new(Arc::new(pipeline), TranslationCache::new());
//! workbench.submit(Command::OpenMod(mod_folder))?;
//! workbench.settle().await;
//! println!("{}", workbench.session().status); // "2 languages found"
//! ```

use crate::cache::TranslationCache;
use crate::error::{MtError, MtResult};
use crate::pipeline::{BatchItem, BatchReport, ItemOutcome, ItemResult, TranslationPipeline};
use rimlang::create::{CreatedLanguage, create_language};
use rimlang::error::{ModError, ModResult};
use rimlang::layout::{LanguageFolder, XmlFileEntry, list_xml_files, scan_languages};
use rimlang::session::Session;
use rimlang::text::{LanguageFile, SourceText};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, warn};

/// Something the operator asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a mod folder and scan its languages
    OpenMod(PathBuf),
    /// Select a language folder by name and list its XML files
    SelectLanguage(String),
    /// Parse a language file into rows
    LoadFile(PathBuf),
    /// Machine-translate rows of the current file
    ///
    /// `None` translates every row that is pending or failed.
    Translate(Option<Vec<String>>),
    /// Copy the XML files of `base` into a new language folder
    CreateLanguage { name: String, base: String },
}

/// Completion notice posted by a background task
#[derive(Debug)]
pub enum Event {
    LanguagesScanned(ModResult<Vec<LanguageFolder>>),
    FilesListed(ModResult<Vec<XmlFileEntry>>),
    FileLoaded {
        path: PathBuf,
        result: ModResult<Vec<SourceText>>,
    },
    /// One batch item is done
    RowTranslated(ItemResult),
    BatchFinished {
        report: BatchReport,
        cache: TranslationCache,
    },
    LanguageCreated {
        name: String,
        result: ModResult<CreatedLanguage>,
    },
    /// A background task panicked before posting its result
    TaskFailed(String),
    /// The batch task panicked; its cache is gone
    BatchAborted(String),
}

impl Event {
    /// True for the last event a task posts
    fn ends_task(&self) -> bool {
        !matches!(self, Event::RowTranslated(_))
    }
}

pub struct Workbench {
    session: Session,
    pipeline: Arc<TranslationPipeline>,
    /// `None` while a batch task holds it
    cache: Option<TranslationCache>,
    /// File the running batch was started on
    batch_file: Option<PathBuf>,
    pending_tasks: usize,
    sender: UnboundedSender<Event>,
    receiver: UnboundedReceiver<Event>,
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Workbench {
    pub fn new(pipeline: Arc<TranslationPipeline>, cache: TranslationCache) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            session: Session::new(),
            pipeline,
            cache: Some(cache),
            batch_file: None,
            pending_tasks: 0,
            sender,
            receiver,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Direct access for edits that need no background work
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn pipeline(&self) -> &TranslationPipeline {
        &self.pipeline
    }

    /// The cache, unless a batch is using it
    pub fn cache(&self) -> Option<&TranslationCache> {
        self.cache.as_ref()
    }

    pub fn is_batch_running(&self) -> bool {
        self.cache.is_none()
    }

    /// Tasks started and not yet finished
    pub fn pending_tasks(&self) -> usize {
        self.pending_tasks
    }

    /// Give back the session and cache, once no batch is running
    pub fn into_parts(self) -> MtResult<(Session, TranslationCache)> {
        match self.cache {
            Some(cache) => Ok((self.session, cache)),
            None => Err(MtError::BatchInProgress),
        }
    }

    fn spawn_blocking<F>(&mut self, work: F)
    where
        F: FnOnce() -> Event + Send + 'static,
    {
        let sender = self.sender.clone();
        self.pending_tasks += 1;
        let handle = tokio::task::spawn_blocking(work);
        tokio::spawn(async move {
            let event = handle
                .await
                .unwrap_or_else(|e| Event::TaskFailed(e.to_string()));
            // The receiver is gone once the workbench is dropped
            let _ = sender.send(event);
        });
    }

    /// Cache to use after a batch task took the previous one down with it
    fn reload_cache(&self) -> TranslationCache {
        let target = self.pipeline.target_locale();
        match self.pipeline.cache_path() {
            Some(path) => TranslationCache::load_for(path, target).unwrap_or_else(|e| {
                warn!("Starting with an empty cache: {}", e);
                TranslationCache::for_target(target)
            }),
            None => TranslationCache::for_target(target),
        }
    }

    /// Start a command
    ///
    /// Validation happens right away and may fail; the work itself runs in
    /// the background and reports through [`Workbench::apply`].
    pub fn submit(&mut self, command: Command) -> MtResult<()> {
        debug!("Command: {:?}", command);
        match command {
            Command::OpenMod(folder) => {
                let languages_dir = self.session.open_mod(&folder)?.to_path_buf();
                self.spawn_blocking(move || Event::LanguagesScanned(scan_languages(&languages_dir)));
            }
            Command::SelectLanguage(folder) => {
                let language_dir = self.session.select_language(&folder)?.path.clone();
                self.spawn_blocking(move || Event::FilesListed(list_xml_files(&language_dir)));
            }
            Command::LoadFile(path) => {
                self.session
                    .set_status(format!("Loading {}...", file_label(&path)));
                self.spawn_blocking(move || {
                    let result = LanguageFile::open(&path).map(|file| file.texts);
                    Event::FileLoaded { path, result }
                });
            }
            Command::Translate(ids) => self.start_batch(ids)?,
            Command::CreateLanguage { name, base } => {
                let languages_dir = self.session.languages_dir.clone().ok_or_else(|| {
                    ModError::LanguagesFolderMissing(
                        self.session.mod_folder.clone().unwrap_or_default(),
                    )
                })?;
                self.session
                    .set_status(format!("Creating language '{}'...", name.trim()));
                self.spawn_blocking(move || {
                    let result = create_language(&languages_dir, &name, &base);
                    Event::LanguageCreated { name, result }
                });
            }
        }
        Ok(())
    }

    fn batch_items(&self, ids: Option<&[String]>) -> Vec<BatchItem> {
        let rows = &self.session.rows;
        match ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| self.session.row_index(id))
                .map(|index| BatchItem::new(rows[index].id(), &rows[index].source.text))
                .collect(),
            None => rows
                .iter()
                .filter(|row| !row.status.is_translated() && !row.status.is_manual())
                .map(|row| BatchItem::new(row.id(), &row.source.text))
                .collect(),
        }
    }

    fn start_batch(&mut self, ids: Option<Vec<String>>) -> MtResult<()> {
        if self.cache.is_none() {
            return Err(MtError::BatchInProgress);
        }
        let items = self.batch_items(ids.as_deref());
        if items.is_empty() {
            self.session.set_status("No texts to translate");
            return Ok(());
        }
        let Some(mut cache) = self.cache.take() else {
            return Err(MtError::BatchInProgress);
        };

        self.session
            .set_status(format!("Translating {} texts...", items.len()));
        self.batch_file = self.session.current_file.clone();
        self.pending_tasks += 1;

        let pipeline = Arc::clone(&self.pipeline);
        let row_sender = self.sender.clone();
        let done_sender = self.sender.clone();
        let batch = tokio::spawn(async move {
            let report = pipeline
                .translate_batch_with(&mut cache, &items, move |result| {
                    let _ = row_sender.send(Event::RowTranslated(result.clone()));
                })
                .await;
            (report, cache)
        });
        tokio::spawn(async move {
            let event = match batch.await {
                Ok((report, cache)) => Event::BatchFinished { report, cache },
                Err(e) => Event::BatchAborted(e.to_string()),
            };
            let _ = done_sender.send(event);
        });
        Ok(())
    }

    /// Fold one event into the session
    pub fn apply(&mut self, event: Event) {
        if event.ends_task() {
            self.pending_tasks = self.pending_tasks.saturating_sub(1);
        }
        match event {
            Event::LanguagesScanned(Ok(languages)) => self.session.set_languages(languages),
            Event::LanguagesScanned(Err(e)) => {
                self.session.set_status(format!("Error scanning languages: {}", e))
            }
            Event::FilesListed(Ok(files)) => self.session.set_files(files),
            Event::FilesListed(Err(e)) => {
                self.session.set_status(format!("Error listing files: {}", e))
            }
            Event::FileLoaded {
                path,
                result: Ok(texts),
            } => self.session.set_loaded_file(path, texts),
            Event::FileLoaded {
                path,
                result: Err(e),
            } => {
                warn!("Could not load {}: {}", path.display(), e);
                let label = file_label(&path);
                self.session.set_loaded_file(path, Vec::new());
                self.session
                    .set_status(format!("Error loading {}: {}", label, e));
            }
            Event::RowTranslated(result) => self.apply_row(result),
            Event::BatchFinished { report, cache } => {
                self.cache = Some(cache);
                self.batch_file = None;
                self.session.set_status(report.status());
            }
            Event::LanguageCreated {
                name,
                result: Ok(created),
            } => {
                let status = format!(
                    "Language '{}' created ({} files copied)",
                    name.trim(),
                    created.files_copied
                );
                self.rescan_languages();
                self.session.set_status(status);
            }
            Event::LanguageCreated {
                name,
                result: Err(e),
            } => self
                .session
                .set_status(format!("Could not create language '{}': {}", name.trim(), e)),
            Event::TaskFailed(message) => {
                warn!("Background task failed: {}", message);
                self.session.set_status(format!("Task failed: {}", message));
            }
            Event::BatchAborted(message) => {
                warn!("Translation batch failed: {}", message);
                self.cache = Some(self.reload_cache());
                self.batch_file = None;
                self.session
                    .set_status(format!("Translation stopped: {}", message));
            }
        }
    }

    fn apply_row(&mut self, result: ItemResult) {
        if self.batch_file != self.session.current_file {
            debug!("Dropping result for {}: another file is loaded", result.id);
            return;
        }
        for index in self.session.row_indices(&result.id) {
            match &result.outcome {
                ItemOutcome::Translated(text) => {
                    self.session.record_translation(index, text, false);
                }
                ItemOutcome::Cached(text) => {
                    self.session.record_translation(index, text, true);
                }
                ItemOutcome::Skipped | ItemOutcome::Failed(_) => {
                    self.session.record_failure(index);
                }
            }
        }
    }

    fn rescan_languages(&mut self) {
        if let Some(languages_dir) = self.session.languages_dir.clone() {
            self.spawn_blocking(move || Event::LanguagesScanned(scan_languages(&languages_dir)));
        }
    }

    /// Wait for the next event, without applying it
    pub async fn next_event(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Apply every event already queued; returns how many were applied
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply events until every started task has finished
    pub async fn settle(&mut self) {
        while self.pending_tasks > 0 {
            match self.receiver.recv().await {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockMode, MockTranslator};
    use rimlang::session::RowStatus;
    use rimlang::test_support::TempDir;
    use std::time::Duration;

    const KEYED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<LanguageData>
  <Greeting>Hello {name}</Greeting>
  <Fire>fire damage</Fire>
  <Tiny>x</Tiny>
</LanguageData>
"#;

    fn mod_tree() -> TempDir {
        let dir = TempDir::new("workbench");
        dir.write("Languages/English/Keyed/Main.xml", KEYED);
        dir.write("Languages/German/Keyed/Main.xml", KEYED);
        dir.mkdir("Languages/Empty");
        dir
    }

    fn workbench(mock: &MockTranslator) -> Workbench {
        let pipeline = TranslationPipeline::new(Arc::new(mock.clone()), "es")
            .unwrap()
            .with_delay(Duration::ZERO);
        Workbench::new(Arc::new(pipeline), TranslationCache::new())
    }

    async fn load_english(workbench: &mut Workbench, dir: &TempDir) {
        workbench
            .submit(Command::OpenMod(dir.path().to_path_buf()))
            .unwrap();
        workbench.settle().await;
        workbench
            .submit(Command::SelectLanguage("English".to_string()))
            .unwrap();
        workbench.settle().await;
        let file = workbench.session().files[0].full_path.clone();
        workbench.submit(Command::LoadFile(file)).unwrap();
        workbench.settle().await;
    }

    // ========== Navigation Tests ==========

    #[tokio::test]
    async fn test_open_select_load() {
        let dir = mod_tree();
        let mut workbench = workbench(&MockTranslator::new(MockMode::Suffix));

        workbench
            .submit(Command::OpenMod(dir.path().to_path_buf()))
            .unwrap();
        workbench.settle().await;
        let folders: Vec<_> = workbench
            .session()
            .languages
            .iter()
            .map(|l| l.folder.as_str())
            .collect();
        assert_eq!(folders, vec!["English", "German"]);
        assert_eq!(workbench.session().status, "2 languages found");

        workbench
            .submit(Command::SelectLanguage("English".to_string()))
            .unwrap();
        workbench.settle().await;
        assert_eq!(workbench.session().status, "1 XML files found");

        let file = workbench.session().files[0].full_path.clone();
        workbench.submit(Command::LoadFile(file)).unwrap();
        workbench.settle().await;
        assert_eq!(workbench.session().rows.len(), 3);
        assert_eq!(workbench.session().status, "3 texts loaded");
        assert_eq!(workbench.pending_tasks(), 0);
    }

    #[tokio::test]
    async fn test_open_mod_without_languages() {
        let dir = TempDir::new("workbench");
        let mut workbench = workbench(&MockTranslator::new(MockMode::Suffix));
        let result = workbench.submit(Command::OpenMod(dir.path().to_path_buf()));
        assert!(matches!(
            result,
            Err(MtError::Mod(ModError::LanguagesFolderMissing(_)))
        ));
        assert_eq!(workbench.session().status, "No 'Languages' folder found");
    }

    #[tokio::test]
    async fn test_malformed_file_gives_empty_rows() {
        let dir = mod_tree();
        let broken = dir.write("Languages/English/Keyed/Broken.xml", "<LanguageData><a>");
        let mut workbench = workbench(&MockTranslator::new(MockMode::Suffix));
        workbench
            .submit(Command::OpenMod(dir.path().to_path_buf()))
            .unwrap();
        workbench.settle().await;

        workbench.submit(Command::LoadFile(broken)).unwrap();
        workbench.settle().await;
        assert!(workbench.session().rows.is_empty());
        assert!(workbench.session().status.starts_with("Error loading Broken.xml"));
    }

    // ========== Batch Tests ==========

    #[tokio::test]
    async fn test_batch_updates_rows_and_returns_cache() {
        let dir = mod_tree();
        let mock = MockTranslator::new(MockMode::Suffix);
        let mut workbench = workbench(&mock);
        load_english(&mut workbench, &dir).await;

        workbench.submit(Command::Translate(None)).unwrap();
        assert!(workbench.is_batch_running());
        workbench.settle().await;

        assert!(!workbench.is_batch_running());
        assert_eq!(workbench.session().status, "2/3 translated (1 failures)");
        let session = workbench.session();
        assert_eq!(session.rows[0].status, RowStatus::Translated);
        assert!(session.rows[0].translation.contains("{name}"));
        assert_eq!(session.rows[1].translation, "fire damage_es");
        assert_eq!(session.rows[2].status, RowStatus::Failed);
        assert_eq!(session.translations.len(), 2);
        assert_eq!(workbench.cache().unwrap().get("fire damage"), Some("fire damage_es"));
    }

    #[tokio::test]
    async fn test_second_batch_rejected() {
        let dir = mod_tree();
        let mock = MockTranslator::with_delay(MockMode::Suffix, 30);
        let mut workbench = workbench(&mock);
        load_english(&mut workbench, &dir).await;

        workbench.submit(Command::Translate(None)).unwrap();
        assert!(matches!(
            workbench.submit(Command::Translate(None)),
            Err(MtError::BatchInProgress)
        ));
        assert!(matches!(workbench.into_parts(), Err(MtError::BatchInProgress)));
    }

    #[tokio::test]
    async fn test_batch_selected_ids_and_cache_hits() {
        let dir = mod_tree();
        let mock = MockTranslator::new(MockMode::Suffix);
        let mut workbench = workbench(&mock);
        load_english(&mut workbench, &dir).await;

        workbench
            .submit(Command::Translate(Some(vec!["Fire".to_string()])))
            .unwrap();
        workbench.settle().await;
        assert_eq!(workbench.session().status, "1/1 translated");

        // Reloading clears rows; the cache answers the second time
        let file = workbench.session().current_file.clone().unwrap();
        workbench.submit(Command::LoadFile(file)).unwrap();
        workbench.settle().await;
        workbench
            .submit(Command::Translate(Some(vec!["Fire".to_string()])))
            .unwrap();
        workbench.settle().await;

        assert_eq!(mock.calls(), 1);
        let index = workbench.session().row_index("Fire").unwrap();
        assert_eq!(workbench.session().rows[index].status, RowStatus::Cached);
    }

    #[tokio::test]
    async fn test_nothing_to_translate() {
        let mut workbench = workbench(&MockTranslator::new(MockMode::Suffix));
        workbench.submit(Command::Translate(None)).unwrap();
        assert_eq!(workbench.session().status, "No texts to translate");
        assert!(!workbench.is_batch_running());
    }

    #[tokio::test]
    async fn test_drop_while_batch_running() {
        let dir = mod_tree();
        let mock = MockTranslator::with_delay(MockMode::Suffix, 20);
        let mut workbench = workbench(&mock);
        load_english(&mut workbench, &dir).await;

        workbench.submit(Command::Translate(None)).unwrap();
        drop(workbench);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_repeated_ids_update_every_row() {
        let dir = mod_tree();
        let defs = dir.write(
            "Languages/English/DefInjected/Things.xml",
            "<Defs><ThingDef><label>gun</label></ThingDef><ThingDef><label>gun</label></ThingDef></Defs>",
        );
        let mut workbench = workbench(&MockTranslator::new(MockMode::Suffix));
        workbench
            .submit(Command::OpenMod(dir.path().to_path_buf()))
            .unwrap();
        workbench.settle().await;
        workbench.submit(Command::LoadFile(defs)).unwrap();
        workbench.settle().await;

        let id = workbench.session().rows[0].id().to_string();
        assert_eq!(workbench.session().row_indices(&id), vec![0, 1]);

        workbench.submit(Command::Translate(Some(vec![id]))).unwrap();
        workbench.settle().await;
        assert_eq!(workbench.session().status, "1/1 translated");
        for row in &workbench.session().rows {
            assert_eq!(row.status, RowStatus::Translated);
            assert_eq!(row.translation, "gun_es");
        }
    }

    // ========== Task Failure Tests ==========

    /// Provider that panics on every call
    struct PanickingTranslator;

    #[async_trait::async_trait]
    impl crate::translator::MachineTranslator for PanickingTranslator {
        async fn translate(&self, _text: &str, _source: &str, _target: &str) -> MtResult<String> {
            panic!("provider crashed");
        }

        async fn translate_batch(
            &self,
            _texts: &[String],
            _source: &str,
            _target: &str,
        ) -> MtResult<Vec<String>> {
            panic!("provider crashed");
        }

        fn provider_name(&self) -> &str {
            "Panicking"
        }
    }

    #[tokio::test]
    async fn test_panicking_batch_releases_the_cache() {
        let dir = mod_tree();
        let cache_path = dir.path().join("cache.json");
        let mut stored = TranslationCache::for_target("es");
        stored.put("fire damage", "daño por fuego");
        stored.save(&cache_path).unwrap();

        let pipeline = TranslationPipeline::new(Arc::new(PanickingTranslator), "es")
            .unwrap()
            .with_delay(Duration::ZERO)
            .with_cache_path(&cache_path);
        let mut workbench = Workbench::new(Arc::new(pipeline), TranslationCache::new());
        load_english(&mut workbench, &dir).await;

        workbench.submit(Command::Translate(None)).unwrap();
        workbench.settle().await;

        assert_eq!(workbench.pending_tasks(), 0);
        assert!(!workbench.is_batch_running());
        assert!(workbench.session().status.starts_with("Translation stopped"));
        // The cache comes back from disk and the next batch can start
        assert_eq!(workbench.cache().unwrap().get("fire damage"), Some("daño por fuego"));
        assert!(workbench.submit(Command::Translate(None)).is_ok());
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_hang_settle() {
        let mut workbench = workbench(&MockTranslator::new(MockMode::Suffix));
        workbench.spawn_blocking(|| panic!("scan crashed"));
        workbench.settle().await;

        assert_eq!(workbench.pending_tasks(), 0);
        assert!(workbench.session().status.starts_with("Task failed"));
    }

    // ========== Language Creation Tests ==========

    #[tokio::test]
    async fn test_create_language_rescans() {
        let dir = mod_tree();
        let mut workbench = workbench(&MockTranslator::new(MockMode::Suffix));
        workbench
            .submit(Command::OpenMod(dir.path().to_path_buf()))
            .unwrap();
        workbench.settle().await;

        workbench
            .submit(Command::CreateLanguage {
                name: "Spanish".to_string(),
                base: "English".to_string(),
            })
            .unwrap();
        workbench.settle().await;

        assert!(dir.path().join("Languages/Spanish/Keyed/Main.xml").is_file());
        assert_eq!(workbench.session().languages.len(), 3);
        assert_eq!(workbench.session().status, "3 languages found");
    }

    #[tokio::test]
    async fn test_create_existing_language_fails() {
        let dir = mod_tree();
        let mut workbench = workbench(&MockTranslator::new(MockMode::Suffix));
        workbench
            .submit(Command::OpenMod(dir.path().to_path_buf()))
            .unwrap();
        workbench.settle().await;

        workbench
            .submit(Command::CreateLanguage {
                name: "German".to_string(),
                base: "English".to_string(),
            })
            .unwrap();
        workbench.settle().await;
        assert!(
            workbench
                .session()
                .status
                .starts_with("Could not create language 'German'")
        );
    }

    #[test]
    fn test_create_language_needs_open_mod() {
        let mut workbench = workbench(&MockTranslator::new(MockMode::Suffix));
        assert!(
            workbench
                .submit(Command::CreateLanguage {
                    name: "Spanish".to_string(),
                    base: "English".to_string(),
                })
                .is_err()
        );
    }
}
