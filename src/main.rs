// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tabiyaku::app_config::{self, Config};
use tabiyaku::cms::DirectoryStore;
use tabiyaku::errors::{AppError, EngineError, ProviderError};
use tabiyaku::language_utils::get_language_name;
use tabiyaku::providers::deepl::DeepL;
use tabiyaku::translation::storage::open_configured;
use tabiyaku::translation::{
    ProgressCallback, ProgressEvent, TranslatedPayload, TranslationCache, TranslationClient, TranslationEngine,
    TranslationReport, TranslationRequest,
};

/// Exit code for invalid input, configuration or documents
const EXIT_VALIDATION: i32 = 2;
/// Exit code for failed translations
const EXIT_TRANSLATION: i32 = 3;
/// Exit code for unreachable provider, store or cache
const EXIT_CONNECTIVITY: i32 = 4;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate an article into target languages
    Translate(TranslateArgs),

    /// Show character counts, translation status and estimated cost
    Stats {
        /// Id of the source article
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Show provider character usage
    Usage,

    /// Inspect or maintain the translation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Generate shell completions for tabiyaku
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Show entry counts
    Stats,
    /// Remove every entry
    Clear,
    /// Remove expired entries
    Cleanup,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Id of the source article
    #[arg(value_name = "ID")]
    id: String,

    /// Target languages, comma separated (default: all supported)
    #[arg(short = 'L', long, value_delimiter = ',')]
    languages: Vec<String>,

    /// Translate even when a translation already exists
    #[arg(short, long)]
    force: bool,

    /// Translate without writing translated articles
    #[arg(long)]
    dry_run: bool,

    /// Abort the run after this many seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,
}

/// tabiyaku - travel article translation
///
/// Translates Japanese travel articles stored as JSON documents into
/// other languages with DeepL.
#[derive(Parser, Debug)]
#[command(name = "tabiyaku")]
#[command(version)]
#[command(about = "Machine translation for Japanese travel articles")]
#[command(long_about = "tabiyaku translates Japanese travel articles into up to 19 languages.

EXAMPLES:
    tabiyaku translate kyoto-momiji -L en,fr     # Translate into English and French
    tabiyaku translate kyoto-momiji --force      # Retranslate every supported language
    tabiyaku translate kyoto-momiji --dry-run    # Translate without writing documents
    tabiyaku stats kyoto-momiji                  # Show status and estimated cost
    tabiyaku usage                               # Show DeepL character usage
    tabiyaku cache cleanup                       # Drop expired cache entries
    tabiyaku completions bash > tabiyaku.bash    # Generate bash completions

CONFIGURATION:
    Configuration is read from conf.json by default. You can specify a different
    file with --config-path. If the file doesn't exist, defaults are used.
    The DeepL key can be given with --api-key or the DEEPL_API_KEY variable.

EXIT CODES:
    0  success
    2  invalid input, configuration or document
    3  translation failed for at least one language
    4  provider, store or cache unreachable")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Directory holding one `<id>.json` file per article
    #[arg(short = 'd', long, default_value = "content", global = true)]
    content_dir: PathBuf,

    /// DeepL authentication key
    #[arg(long, env = "DEEPL_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Colored stderr logger
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger; the level can be lowered later with `log::set_max_level`
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌"),
            Level::Warn => ("1;33", "🚧"),
            Level::Info => ("1;32", "·"),
            Level::Debug => ("1;36", "🔍"),
            Level::Trace => ("1;35", "📋"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.target().starts_with("tabiyaku")
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, marker) = Self::style_for_level(record.level());
        let _ = writeln!(
            std::io::stderr(),
            "\x1B[{}m{} {} {}\x1B[0m",
            color,
            now,
            marker,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            exit_code_for(&e)
        }
    };

    std::process::exit(code);
}

async fn run(cli: CommandLineOptions) -> Result<i32, AppError> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "tabiyaku", &mut std::io::stdout());
        return Ok(0);
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Translate(args) => run_translate(&config, &cli.content_dir, args).await,
        Commands::Stats { id } => run_stats(&config, &cli.content_dir, &id).await,
        Commands::Usage => run_usage(&config).await,
        Commands::Cache { action } => run_cache(&config, action),
        Commands::Completions { .. } => Ok(0),
    }
}

/// Load the config file (or defaults), apply CLI overrides and validate
fn load_config(cli: &CommandLineOptions) -> Result<Config, AppError> {
    let mut config = if Path::new(&cli.config_path).exists() {
        Config::from_file(&cli.config_path).map_err(|e| AppError::Config(format!("{:#}", e)))?
    } else {
        warn!("Config file not found at '{}', using defaults.", cli.config_path);
        Config::default()
    };

    if let Some(api_key) = &cli.api_key {
        config.provider.api_key = api_key.clone();
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    config
        .validate()
        .map_err(|e| AppError::Config(format!("Configuration validation failed: {:#}", e)))?;

    Ok(config)
}

fn require_api_key(config: &Config) -> Result<(), AppError> {
    if config.provider.api_key.trim().is_empty() {
        return Err(AppError::Config(
            "DeepL API key missing: set provider.api_key, --api-key or DEEPL_API_KEY".to_string(),
        ));
    }
    Ok(())
}

fn open_document_cache(config: &Config) -> Result<TranslationCache<TranslatedPayload>, AppError> {
    let storage = open_configured(&config.cache)?;
    Ok(TranslationCache::load(Arc::from(storage), config.cache.ttl()))
}

fn build_engine(config: &Config, content_dir: &Path) -> Result<TranslationEngine, AppError> {
    let store = DirectoryStore::open(content_dir).map_err(|e| AppError::File(format!("{:#}", e)))?;
    let client = TranslationClient::new(Arc::new(DeepL::from_config(&config.provider)?), config);
    let engine = TranslationEngine::new(client, Arc::new(store), config.clone());

    if config.cache.enabled {
        Ok(engine.with_document_cache(TranslationCache::open_or_in_memory(&config.cache)))
    } else {
        Ok(engine)
    }
}

fn progress_bar() -> ProgressBar {
    let progress_bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} languages {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar
}

async fn run_translate(config: &Config, content_dir: &Path, args: TranslateArgs) -> Result<i32, AppError> {
    require_api_key(config)?;

    let bar = progress_bar();
    let listener = bar.clone();
    let progress: ProgressCallback = Arc::new(move |event: &ProgressEvent| match event {
        ProgressEvent::Started { language, total, .. } => {
            listener.set_length(*total as u64);
            listener.set_message(language.clone());
        }
        ProgressEvent::Finished { .. } => listener.inc(1),
    });

    let engine = build_engine(config, content_dir)?.with_progress(progress);

    let mut request = TranslationRequest::new(args.id, args.languages)
        .with_force(args.force)
        .with_dry_run(args.dry_run);
    if let Some(seconds) = args.timeout {
        request = request.with_deadline(Duration::from_secs(seconds));
    }

    let report = engine.translate(&request).await;
    bar.finish_and_clear();
    let report = report?;

    print_report(&report, engine.client().session_characters());

    if report.success {
        Ok(0)
    } else {
        Ok(EXIT_TRANSLATION)
    }
}

fn print_report(report: &TranslationReport, session_characters: u64) {
    for outcome in &report.results {
        println!(
            "✅ {:<6} {} ({} chars{})",
            outcome.language,
            outcome.document.id,
            outcome.characters,
            if outcome.used_cache { ", cached" } else { "" }
        );
    }
    for language in &report.skipped {
        println!("⏭  {:<6} already translated", language);
    }
    for error in &report.errors {
        println!("❌ {}", error);
    }
    if let Some(persisted) = &report.persisted {
        println!(
            "Stored: {} created, {} skipped, {} failed",
            persisted.success_count, persisted.skip_count, persisted.fail_count
        );
    }

    println!("Characters translated: {} (session: {})", report.total_characters, session_characters);
    match &report.quota {
        Some(quota) => println!(
            "Quota: {}/{} ({:.1}% used, {} remaining)",
            quota.character_count, quota.character_limit, quota.percent_used, quota.remaining
        ),
        None => println!("Quota: unavailable"),
    }
}

async fn run_stats(config: &Config, content_dir: &Path, id: &str) -> Result<i32, AppError> {
    let engine = build_engine(config, content_dir)?;
    let stats = engine.get_stats(id).await?;

    println!("{} [{}] {}", stats.document_id, stats.language, stats.title);
    println!("Characters per language: {}", stats.character_count);
    for error in &stats.validation.errors {
        println!("  error: {}", error);
    }
    for warning in &stats.validation.warnings {
        println!("  warning: {}", warning);
    }

    let existing = stats.translations.iter().filter(|s| s.exists).count();
    println!("Translations: {}/{}", existing, stats.translations.len());
    for status in &stats.translations {
        let name = get_language_name(&status.language).unwrap_or_else(|_| status.language.clone());
        println!(
            "  {:<6} {:<24} {} {}",
            status.language,
            name,
            if status.exists { "✅" } else { "-" },
            status.derived_id
        );
    }
    println!(
        "Estimated: {} characters, {:.2} cost units",
        stats.estimated_characters, stats.estimated_cost
    );

    Ok(0)
}

async fn run_usage(config: &Config) -> Result<i32, AppError> {
    require_api_key(config)?;

    let client = TranslationClient::new(Arc::new(DeepL::from_config(&config.provider)?), config);
    let quota = client.get_usage().await?;
    println!(
        "{}/{} characters used ({:.1}%), {} remaining",
        quota.character_count, quota.character_limit, quota.percent_used, quota.remaining
    );
    Ok(0)
}

fn run_cache(config: &Config, action: CacheAction) -> Result<i32, AppError> {
    let cache = open_document_cache(config)?;

    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!("Documents: {}", stats.total_entries);
            println!("Translations: {}", stats.total_translations);
            match stats.oldest_entry {
                Some(oldest) => println!("Oldest entry: {}", oldest.to_rfc3339()),
                None => println!("Oldest entry: -"),
            }
        }
        CacheAction::Clear => {
            let count = cache.len();
            cache.clear();
            cache.save()?;
            println!("Removed {} entries", count);
        }
        CacheAction::Cleanup => {
            let removed = cache.cleanup();
            cache.save()?;
            println!("Removed {} expired entries", removed);
        }
    }

    Ok(0)
}

/// Map an error to the process exit code
fn exit_code_for(error: &AppError) -> i32 {
    match error {
        AppError::Config(_) => EXIT_VALIDATION,
        AppError::Engine(e) if e.is_validation() => EXIT_VALIDATION,
        AppError::Engine(EngineError::Store(_) | EngineError::Timeout(_)) => EXIT_CONNECTIVITY,
        AppError::Engine(_) => EXIT_TRANSLATION,
        AppError::Provider(
            ProviderError::ConnectionError(_)
            | ProviderError::AuthenticationError(_)
            | ProviderError::UsageUnavailable(_)
            | ProviderError::RequestFailed(_),
        ) => EXIT_CONNECTIVITY,
        AppError::Provider(_) => EXIT_TRANSLATION,
        AppError::Cache(_) | AppError::File(_) => EXIT_CONNECTIVITY,
        AppError::Unknown(_) => EXIT_TRANSLATION,
    }
}
