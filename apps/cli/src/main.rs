//! Command-line front end for the translation pipeline.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use i18n_translator_core::ai::ArkClient;
use i18n_translator_core::config::{self, TranslatorConfig};
use i18n_translator_core::context::SourceFileContext;
use i18n_translator_core::jobs::{
    run_translation, CancelFlag, JobStatus, LanguageOutcome, ProgressEvent, ProgressSink,
};
use i18n_translator_core::scanner::LocaleScanner;
use i18n_translator_core::selection::SelectionContent;

#[derive(Parser, Debug)]
#[command(name = "i18n-translator")]
#[command(version)]
#[command(about = "Translate locale file selections into every configured language", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./i18n-translate.config.json, then
    /// the per-user file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a selection taken from a source locale file
    Translate {
        /// Source-language file the selection was taken from
        #[arg(long)]
        file: PathBuf,

        /// File holding the selected text; reads stdin when omitted
        #[arg(long)]
        selection: Option<PathBuf>,

        /// Override the configured target languages (repeatable)
        #[arg(long = "language", value_name = "CODE")]
        languages: Vec<String>,
    },
    /// List the locale directories found under a project root
    Scan {
        /// Project root (defaults to the configured translate dir, then
        /// the current directory)
        root: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store credentials and target languages in the configuration
    Setup {
        #[arg(long)]
        api_key: String,

        #[arg(long)]
        endpoint_id: String,

        /// Comma-separated target language codes
        #[arg(long, value_delimiter = ',')]
        target_languages: Vec<String>,
    },
    /// Write a starter configuration file into the current directory
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Translate {
            file,
            selection,
            languages,
        } => translate(cli.config, file, selection, languages).await,
        Command::Scan { root, json } => scan(cli.config, root, json),
        Command::Setup {
            api_key,
            endpoint_id,
            target_languages,
        } => setup(cli.config, api_key, endpoint_id, target_languages),
        Command::Init => init(cli.config),
    }
}

fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

struct LogSink;

impl ProgressSink for LogSink {
    fn emit(&self, event: ProgressEvent) {
        tracing::info!(
            language = %event.language,
            completed = event.completed,
            total = event.total,
            "language finished"
        );
    }
}

async fn translate(
    config_path: Option<PathBuf>,
    file: PathBuf,
    selection_path: Option<PathBuf>,
    languages: Vec<String>,
) -> anyhow::Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if !languages.is_empty() {
        config.target_languages = languages;
    }

    let file = absolutize(&file)?;
    let ctx = SourceFileContext::new(&file, &config.source_lang)?;
    if !ctx.is_source_language_file() {
        bail!(
            "{} does not look like a {} source file",
            file.display(),
            config.source_lang
        );
    }

    let raw = match &selection_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read selection from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read selection from stdin")?;
            buffer
        }
    };
    let selection = SelectionContent::from_text(&raw, ctx.kind)?;
    tracing::debug!(selection = selection.raw_text(), "selection captured");
    tracing::info!(keys = selection.key_count(), "selection parsed");

    let translator = ArkClient::new(&config.api_key, &config.endpoint_id)?;
    let cancel = CancelFlag::new();
    let ctrl_c_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("cancellation requested, finishing the current language");
            ctrl_c_flag.cancel();
        }
    });

    let summary =
        run_translation(&selection, &ctx, &config, &translator, &LogSink, &cancel).await?;

    for report in &summary.reports {
        match &report.outcome {
            LanguageOutcome::Written { path, keys_merged } => {
                println!(
                    "{}: wrote {} ({} keys)",
                    report.language,
                    path.display(),
                    keys_merged
                );
            }
            LanguageOutcome::Failed { message } => {
                println!("{}: failed: {}", report.language, message);
            }
        }
    }
    match summary.status {
        JobStatus::Cancelled => {
            println!("run cancelled after {} language(s)", summary.reports.len())
        }
        _ => println!(
            "done: {} succeeded, {} failed",
            summary.succeeded(),
            summary.failed()
        ),
    }

    if !summary.reports.is_empty() && summary.succeeded() == 0 {
        bail!("no language could be translated");
    }
    Ok(())
}

fn scan(config_path: Option<PathBuf>, root: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let root = match root {
        Some(root) => absolutize(&root)?,
        None => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            match try_load_config(config_path.as_deref())? {
                Some(config) => config.scan_root(&cwd),
                None => cwd,
            }
        }
    };
    let found = LocaleScanner::default()
        .scan(&root)
        .with_context(|| format!("failed to scan {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("no locale directories found under {}", root.display());
        return Ok(());
    }
    for directory in found {
        println!("{}", directory.path.display());
        for file in directory.files {
            println!("  {:<8} {}", file.language, file.path.display());
        }
    }
    Ok(())
}

fn setup(
    config_path: Option<PathBuf>,
    api_key: String,
    endpoint_id: String,
    target_languages: Vec<String>,
) -> anyhow::Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => config::user_config_path()
            .context("no user configuration directory available on this platform")?,
    };

    let mut config = TranslatorConfig::load_or_default(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    config.api_key = api_key;
    config.endpoint_id = endpoint_id;
    if !target_languages.is_empty() {
        config.target_languages = target_languages;
    }
    config.save(&path)?;
    println!("configuration written to {}", path.display());
    Ok(())
}

fn init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match config_path {
        Some(path) => path,
        None => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            config::default_config_path(&cwd)
        }
    };
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    TranslatorConfig::template().save(&path)?;
    println!("wrote starter configuration to {}", path.display());
    Ok(())
}

fn try_load_config(explicit: Option<&Path>) -> anyhow::Result<Option<TranslatorConfig>> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            config::locate_config(&cwd)
        }
    };
    let Some(path) = path else {
        return Ok(None);
    };
    let config = TranslatorConfig::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    Ok(Some(config))
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<TranslatorConfig> {
    match try_load_config(explicit)? {
        Some(config) => Ok(config),
        None => bail!("no configuration found; run `i18n-translator init` or `i18n-translator setup` first"),
    }
}

fn absolutize(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let cwd = std::env::current_dir().context("cannot determine current directory")?;
        Ok(cwd.join(path))
    }
}
