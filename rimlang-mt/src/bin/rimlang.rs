use clap::{Arg, ArgAction, ArgMatches, Command};
use rimlang::filter::{RowFilter, filter_status};
use rimlang::session::TextRow;
use rimlang::text::LanguageFile;
use rimlang::{
    AppConfig, DefsFile, ModAbout, RIMWORLD_VERSIONS, default_cache_path, find_preview_image,
    list_def_files, list_xml_files, load_about, require_languages_dir, save_about,
    scan_languages, target_code_for_folder, validate_target_language,
};
use rimlang_mt::naming::describe_format;
use rimlang_mt::workbench::Command as WorkbenchCommand;
use rimlang_mt::{
    GoogleTranslateProvider, MachineTranslator, MockMode, MockTranslator, SentinelTable,
    TranslationCache, TranslationPipeline, Workbench,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn mod_arg() -> Arg {
    Arg::new("mod")
        .long("mod")
        .short('d')
        .help("Mod folder (default: the most recently used one)")
}

fn target_arg() -> Arg {
    Arg::new("target")
        .long("target")
        .short('t')
        .help("Target language code (default: from the language folder or config)")
}

fn mock_arg() -> Arg {
    Arg::new("mock")
        .long("mock")
        .short('m')
        .help("Use mock translator instead of Google Translate (cache is not saved)")
        .action(ArgAction::SetTrue)
}

fn dry_run_arg() -> Arg {
    Arg::new("dry-run")
        .long("dry-run")
        .short('n')
        .help("Translate but do not write any file")
        .action(ArgAction::SetTrue)
}

fn cli() -> Command {
    Command::new("rimlang")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Browse, machine-translate and edit the language files of RimWorld mods")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show debug logs")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("languages")
                .about("List the language folders that contain XML files")
                .arg(mod_arg()),
        )
        .subcommand(
            Command::new("files")
                .about("List the XML files of a language")
                .arg(Arg::new("language").help("Language folder, e.g. English").required(true))
                .arg(mod_arg()),
        )
        .subcommand(
            Command::new("texts")
                .about("Show the translatable texts of a language file")
                .arg(Arg::new("file").help("Path to the XML file").required(true))
                .arg(
                    Arg::new("status")
                        .long("status")
                        .help("all, pending, translated or edited")
                        .default_value("all"),
                )
                .arg(
                    Arg::new("type")
                        .long("type")
                        .help("all, with-placeholders or without-placeholders")
                        .default_value("all"),
                )
                .arg(Arg::new("search").long("search").short('s').help("Text to look for"))
                .arg(target_arg())
                .arg(
                    Arg::new("cache")
                        .long("cache")
                        .help("Translation cache file (default: one per target in ~/.rimworld_editor)"),
                ),
        )
        .subcommand(
            Command::new("translate")
                .about("Machine-translate a language file in place")
                .arg(Arg::new("language").help("Language folder, e.g. Spanish").required(true))
                .arg(
                    Arg::new("file")
                        .help("File path relative to the language folder, e.g. Keyed/Main.xml")
                        .required(true),
                )
                .arg(
                    Arg::new("ids")
                        .help("Only translate these text ids")
                        .num_args(0..),
                )
                .arg(mod_arg())
                .arg(target_arg())
                .arg(mock_arg())
                .arg(dry_run_arg())
                .arg(
                    Arg::new("cache")
                        .long("cache")
                        .help("Translation cache file (default: one per target in ~/.rimworld_editor)"),
                )
                .arg(
                    Arg::new("delay")
                        .long("delay")
                        .help("Pause after each provider call, in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("200"),
                )
                .arg(
                    Arg::new("extended")
                        .long("extended")
                        .help("Also protect {skill}, {bodypart}, {animal}, {weapon} and {material}")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("text")
                .about("Translate one string and show the alternative spellings")
                .arg(Arg::new("text").help("Source text").required(true))
                .arg(target_arg())
                .arg(mock_arg()),
        )
        .subcommand(
            Command::new("create-language")
                .about("Create a language folder by copying the XML files of another")
                .arg(Arg::new("name").help("New language folder, e.g. Spanish").required(true))
                .arg(
                    Arg::new("base")
                        .long("base")
                        .short('b')
                        .help("Language folder to copy")
                        .default_value("English"),
                )
                .arg(mod_arg()),
        )
        .subcommand(
            Command::new("about")
                .about("Show or edit About/About.xml")
                .arg(mod_arg())
                .arg(Arg::new("name").long("name").help("Mod name"))
                .arg(Arg::new("author").long("author").help("Author"))
                .arg(Arg::new("package-id").long("package-id").help("Package id"))
                .arg(Arg::new("description").long("description").help("Description"))
                .arg(Arg::new("icon").long("icon").help("modIconPath (empty to remove)"))
                .arg(
                    Arg::new("workshop-id")
                        .long("workshop-id")
                        .help("Steam Workshop id (empty to remove PublishedFileId.txt)"),
                )
                .arg(
                    Arg::new("translate-description")
                        .long("translate-description")
                        .help("Machine-translate the description")
                        .action(ArgAction::SetTrue),
                )
                .arg(target_arg())
                .arg(mock_arg())
                .arg(
                    Arg::new("add-version")
                        .long("add-version")
                        .help("Add a supported game version")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("remove-version")
                        .long("remove-version")
                        .help("Remove a supported game version")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("defs")
                .about("List ThingDefs and StatDefs, optionally machine-translating them")
                .arg(mod_arg())
                .arg(
                    Arg::new("translate")
                        .long("translate")
                        .help("Translate label and description")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("def")
                        .long("def")
                        .help("Only these defs (by defName)")
                        .action(ArgAction::Append),
                )
                .arg(target_arg())
                .arg(mock_arg())
                .arg(dry_run_arg()),
        )
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> CliResult<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("missing argument <{}>", name).into())
}

/// The `--mod` folder, or the one remembered in the config
fn mod_folder(matches: &ArgMatches, config: &mut AppConfig) -> CliResult<PathBuf> {
    let folder = match matches.get_one::<String>("mod") {
        Some(folder) => PathBuf::from(folder),
        None => config
            .recent_mod_folder()
            .ok_or("no mod folder given and none used recently; pass --mod")?,
    };
    if !folder.is_dir() {
        return Err(format!("{} is not a folder", folder.display()).into());
    }
    let absolute = folder.canonicalize().unwrap_or(folder);
    config.recent_mod_folder = absolute.display().to_string();
    if let Err(e) = config.save() {
        warn!("Could not save config: {}", e);
    }
    Ok(absolute)
}

/// `--target`, else the code of the language folder, else the configured one
fn target_language(
    matches: &ArgMatches,
    language_folder: Option<&str>,
    config: &AppConfig,
) -> CliResult<String> {
    let code = matches
        .get_one::<String>("target")
        .map(String::as_str)
        .or_else(|| language_folder.and_then(target_code_for_folder).filter(|c| *c != "en"))
        .unwrap_or(&config.target_language);
    Ok(validate_target_language(code)?)
}

fn provider(matches: &ArgMatches) -> CliResult<Arc<dyn MachineTranslator>> {
    if matches.get_flag("mock") {
        return Ok(Arc::new(MockTranslator::new(MockMode::Suffix)));
    }
    Ok(Arc::new(GoogleTranslateProvider::from_env_or_keyless()?))
}

fn uses_mock(matches: &ArgMatches) -> bool {
    matches!(matches.try_get_one::<bool>("mock"), Ok(Some(true)))
}

/// Cache file for `target`: `--cache`, else one file per target language
///
/// Mock runs get `None`, so their output never reaches a cache on disk.
fn cache_location(matches: &ArgMatches, target: &str) -> Option<PathBuf> {
    if uses_mock(matches) {
        return None;
    }
    let explicit = matches.try_get_one::<String>("cache").ok().flatten();
    Some(
        explicit
            .map(PathBuf::from)
            .unwrap_or_else(|| default_cache_path(target)),
    )
}

/// Load the cache for `target`, starting empty if there is no file or it
/// cannot be read
fn load_cache(location: Option<&Path>, target: &str) -> TranslationCache {
    let Some(path) = location else {
        return TranslationCache::for_target(target);
    };
    TranslationCache::load_for(path, target).unwrap_or_else(|e| {
        warn!("Starting with an empty cache: {}", e);
        TranslationCache::for_target(target)
    })
}

fn print_rows(rows: &[TextRow], indices: &[usize]) {
    for &index in indices {
        let row = &rows[index];
        println!("{}\t[{}]", row.id(), row.status);
        println!("    {}", row.source.text);
        if !row.translation.is_empty() {
            println!("  → {}", row.translation);
        }
    }
}

fn run_languages(matches: &ArgMatches, config: &mut AppConfig) -> CliResult<()> {
    let folder = mod_folder(matches, config)?;
    let languages_dir = require_languages_dir(&folder)?;
    let languages = scan_languages(&languages_dir)?;
    println!("📁 {}", languages_dir.display());
    for language in &languages {
        println!("  {}", language.label());
    }
    println!("{} languages found", languages.len());
    Ok(())
}

fn run_files(matches: &ArgMatches, config: &mut AppConfig) -> CliResult<()> {
    let folder = mod_folder(matches, config)?;
    let language = required(matches, "language")?;
    let languages_dir = require_languages_dir(&folder)?;
    let files = list_xml_files(&languages_dir.join(language))?;
    for file in &files {
        println!("  {}", file.relative_path);
    }
    println!("{} XML files found", files.len());
    Ok(())
}

fn run_texts(matches: &ArgMatches, config: &AppConfig) -> CliResult<()> {
    let file = LanguageFile::open(Path::new(required(matches, "file")?))?;
    let target = target_language(matches, None, config)?;
    let cache = load_cache(cache_location(matches, &target).as_deref(), &target);

    let filter = RowFilter {
        status: required(matches, "status")?.parse()?,
        kind: required(matches, "type")?.parse()?,
        search: matches.get_one::<String>("search").cloned().unwrap_or_default(),
    };

    let rows: Vec<TextRow> = file
        .texts
        .into_iter()
        .map(|source| {
            let mut row = TextRow::new(source);
            if let Some(cached) = cache.get(&row.source.text) {
                row.translation = cached.to_string();
                row.status = rimlang::RowStatus::Cached;
            }
            row
        })
        .collect();

    let shown = filter.apply(&rows);
    print_rows(&rows, &shown);
    if filter.is_empty() {
        println!("{} texts", rows.len());
    } else {
        println!("{}", filter_status(shown.len()));
    }
    Ok(())
}

async fn run_translate(matches: &ArgMatches, config: &mut AppConfig) -> CliResult<()> {
    let folder = mod_folder(matches, config)?;
    let language = required(matches, "language")?;
    let relative = required(matches, "file")?.replace('\\', "/");
    let target = target_language(matches, Some(language), config)?;
    let cache_path = cache_location(matches, &target);
    let delay = matches.get_one::<u64>("delay").copied().unwrap_or(200);

    let provider = provider(matches)?;
    println!("🌍 {} → {} ({})", language, target, provider.provider_name());
    let mut pipeline = TranslationPipeline::new(provider, &target)?
        .with_delay(Duration::from_millis(delay));
    if matches.get_flag("extended") {
        pipeline = pipeline.with_table(SentinelTable::extended());
    }
    if let Some(path) = cache_path.as_ref().filter(|_| !matches.get_flag("dry-run")) {
        pipeline = pipeline.with_cache_path(path);
    }

    let cache = load_cache(cache_path.as_deref(), &target);
    let mut workbench = Workbench::new(Arc::new(pipeline), cache);
    workbench.submit(WorkbenchCommand::OpenMod(folder))?;
    workbench.settle().await;
    workbench.submit(WorkbenchCommand::SelectLanguage(language.to_string()))?;
    workbench.settle().await;

    let file = workbench
        .session()
        .files
        .iter()
        .find(|f| f.relative_path.eq_ignore_ascii_case(&relative))
        .map(|f| f.full_path.clone())
        .ok_or_else(|| format!("{} has no file {}", language, relative))?;
    workbench.submit(WorkbenchCommand::LoadFile(file))?;
    workbench.settle().await;

    let ids: Option<Vec<String>> = matches
        .get_many::<String>("ids")
        .map(|ids| ids.cloned().collect());
    workbench.submit(WorkbenchCommand::Translate(ids))?;
    workbench.settle().await;
    let status = workbench.session().status.clone();

    let session = workbench.session();
    let all: Vec<usize> = (0..session.rows.len()).collect();
    print_rows(&session.rows, &all);
    println!("{}", status);

    if matches.get_flag("dry-run") {
        println!("Dry run: nothing written");
    } else if !workbench.session().translations.is_empty() {
        workbench.session_mut().save_current_file()?;
        println!("{}", workbench.session().status);
    }
    Ok(())
}

async fn run_text(matches: &ArgMatches, config: &AppConfig) -> CliResult<()> {
    let text = required(matches, "text")?;
    let target = target_language(matches, None, config)?;
    let cache_path = cache_location(matches, &target);
    let pipeline = TranslationPipeline::new(provider(matches)?, &target)?;

    let mut cache = load_cache(cache_path.as_deref(), &target);
    let result = pipeline.translate_with_alternatives(&mut cache, text).await?;
    if let Some(path) = &cache_path {
        if let Err(e) = cache.save(path) {
            warn!("Could not save translation cache: {}", e);
        }
    }

    println!("📝 {} ({})", text, describe_format(text));
    for (index, candidate) in result.candidates().iter().enumerate() {
        println!("  [{}] {} ({})", index + 1, candidate, describe_format(candidate));
    }
    Ok(())
}

async fn run_create_language(matches: &ArgMatches, config: &mut AppConfig) -> CliResult<()> {
    let folder = mod_folder(matches, config)?;
    let name = required(matches, "name")?;
    let base = required(matches, "base")?;

    // Creation does no translation; any provider will do
    let pipeline = TranslationPipeline::new(Arc::new(MockTranslator::new(MockMode::NoOp)), "en")?;
    let mut workbench = Workbench::new(Arc::new(pipeline), TranslationCache::new());
    workbench.submit(WorkbenchCommand::OpenMod(folder))?;
    workbench.settle().await;
    workbench.submit(WorkbenchCommand::CreateLanguage {
        name: name.to_string(),
        base: base.to_string(),
    })?;

    // Stop at the creation result; the rescan that follows is not needed
    while let Some(event) = workbench.next_event().await {
        let created = matches!(event, rimlang_mt::Event::LanguageCreated { .. });
        workbench.apply(event);
        if created {
            break;
        }
    }
    println!("{}", workbench.session().status);
    if workbench.session().status.starts_with("Could not") {
        return Err(workbench.session().status.clone().into());
    }
    Ok(())
}

fn print_about(about: &ModAbout) {
    println!("Name:        {}", about.name);
    println!("Author:      {}", about.author);
    println!("Package id:  {}", about.package_id);
    println!("Icon:        {}", about.mod_icon_path);
    match about.workshop_url() {
        Some(url) => println!("Workshop:    {} ({})", about.workshop_id, url),
        None => println!("Workshop:    (not published)"),
    }
    let versions: Vec<String> = RIMWORLD_VERSIONS
        .iter()
        .map(|v| format!("[{}] {}", if about.supports(v) { "x" } else { " " }, v))
        .collect();
    println!("Versions:    {}", versions.join("  "));
    println!("Description:\n{}", about.description);
}

async fn run_about(matches: &ArgMatches, config: &mut AppConfig) -> CliResult<()> {
    let folder = mod_folder(matches, config)?;
    let mut about = load_about(&folder)?;
    let mut changed = false;

    for (arg, field) in [
        ("name", &mut about.name),
        ("author", &mut about.author),
        ("package-id", &mut about.package_id),
        ("description", &mut about.description),
        ("icon", &mut about.mod_icon_path),
        ("workshop-id", &mut about.workshop_id),
    ] {
        if let Some(value) = matches.get_one::<String>(arg) {
            *field = value.trim().to_string();
            changed = true;
        }
    }
    for version in matches.get_many::<String>("add-version").into_iter().flatten() {
        about.toggle_version(version, true);
        changed = true;
    }
    for version in matches.get_many::<String>("remove-version").into_iter().flatten() {
        about.toggle_version(version, false);
        changed = true;
    }
    if matches.get_flag("translate-description") {
        let target = target_language(matches, None, config)?;
        let pipeline = TranslationPipeline::new(provider(matches)?, &target)?;
        if pipeline.translate_description(&mut about).await? {
            println!("🌍 Description translated into {}", target);
            changed = true;
        } else {
            println!("Description unchanged");
        }
    }

    if changed {
        save_about(&folder, &about)?;
        println!("✅ About.xml saved");
    }
    print_about(&about);
    match find_preview_image(&folder) {
        Some(image) => println!("Preview:     {}", image.display()),
        None => println!("Preview:     (none)"),
    }
    Ok(())
}

async fn run_defs(matches: &ArgMatches, config: &mut AppConfig) -> CliResult<()> {
    let folder = mod_folder(matches, config)?;
    let selected: Option<Vec<String>> = matches
        .get_many::<String>("def")
        .map(|defs| defs.cloned().collect());

    let pipeline = if matches.get_flag("translate") {
        let target = target_language(matches, None, config)?;
        Some(TranslationPipeline::new(provider(matches)?, &target)?)
    } else {
        None
    };

    for file in list_def_files(&folder)? {
        let mut defs = DefsFile::open(&file.full_path)?;
        if defs.entries.is_empty() {
            continue;
        }
        println!("📄 {}", file.relative_path);

        if let Some(pipeline) = &pipeline {
            let report = pipeline.translate_defs(&mut defs, selected.as_deref()).await;
            println!("  {}", report.status());
            if report.fields_changed > 0 && !matches.get_flag("dry-run") {
                defs.save()?;
            }
        }

        for entry in &defs.entries {
            if selected
                .as_ref()
                .is_some_and(|names| !names.contains(&entry.def_name))
            {
                continue;
            }
            let label = defs.field(entry, "label").unwrap_or_default();
            println!("  {:<9} {:<30} {}", entry.kind.tag(), entry.def_name, label);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let default_level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load();

    match matches.subcommand() {
        Some(("languages", sub)) => run_languages(sub, &mut config),
        Some(("files", sub)) => run_files(sub, &mut config),
        Some(("texts", sub)) => run_texts(sub, &config),
        Some(("translate", sub)) => run_translate(sub, &mut config).await,
        Some(("text", sub)) => run_text(sub, &config).await,
        Some(("create-language", sub)) => run_create_language(sub, &mut config).await,
        Some(("about", sub)) => run_about(sub, &mut config).await,
        Some(("defs", sub)) => run_defs(sub, &mut config).await,
        _ => Err("unknown command".into()),
    }
}
