//! Entry point for the terminal speed reader.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments (a document, or `--resume` with a saved
//!   progress record).
//! - Load configuration from `conf/config.toml` (writing the defaults there
//!   when it is missing) and the saved settings.
//! - Extract and tokenize the document, then hand it to the terminal loop.
//! - Persist settings on the way out.

mod terminal;

use anyhow::{Context, Result, anyhow};
use speedread_core::cancellation::CancellationToken;
use speedread_core::config::{AppConfig, load_config, save_config};
use speedread_core::extract::extract_paragraphs;
use speedread_core::progress::{list_progress_records, load_progress, resolve_source};
use speedread_core::scheduler::DeadlineScheduler;
use speedread_core::settings::{load_settings, save_settings};
use speedread_core::ReaderSession;
use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const CONFIG_PATH: &str = "conf/config.toml";
const USAGE: &str = "Usage: speedread <document.txt|docx|pdf> | speedread --resume [progress.json]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Launch {
    Open(PathBuf),
    /// `None` resumes the newest saved record.
    Resume(Option<PathBuf>),
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let launch = parse_args(env::args().skip(1))?;
    let config_path = Path::new(CONFIG_PATH);
    if !config_path.exists() {
        if let Err(err) = save_config(config_path, &AppConfig::default()) {
            warn!(path = %config_path.display(), "Failed to write default config: {err}");
        }
    }
    let config = load_config(config_path);
    set_log_level(reload_handle, config.log_level.as_filter_str());

    let settings_path = config.settings_path();
    let settings = load_settings(&settings_path);
    info!(
        level = %config.log_level,
        pace = settings.reading_pace,
        data_dir = %config.data_path().display(),
        "Starting speed reader"
    );

    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel);

    let (source, resume_index) = resolve_launch(launch, &config)?;
    let extracted = extract_paragraphs(&source, &config.extraction_config(), Some(&cancel))
        .with_context(|| format!("Failed to extract text from {}", source.display()))?;
    let mut session = ReaderSession::with_config(DeadlineScheduler::new(), settings, &config);
    session
        .load_extracted(&source, &extracted, &config.tokenizer_options(), resume_index)
        .with_context(|| format!("Nothing to read in {}", source.display()))?;

    terminal::run_reader(&mut session, &config.progress_path(), &cancel)
        .context("Terminal reader stopped unexpectedly")?;

    save_settings(&settings_path, session.settings())
        .with_context(|| format!("Failed to save settings to {}", settings_path.display()))?;
    Ok(())
}

fn parse_args<I>(mut args: I) -> Result<Launch>
where
    I: Iterator<Item = String>,
{
    let first = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let launch = if first == "--resume" {
        Launch::Resume(args.next().map(PathBuf::from))
    } else {
        let path = PathBuf::from(first);
        if !path.exists() {
            return Err(anyhow!("File not found: {}", path.display()));
        }
        Launch::Open(path)
    };
    if let Some(extra) = args.next() {
        return Err(anyhow!("Unexpected argument {extra:?}\n{USAGE}"));
    }
    Ok(launch)
}

/// Source document and starting word for the launch mode.
fn resolve_launch(launch: Launch, config: &AppConfig) -> Result<(PathBuf, usize)> {
    let record_path = match launch {
        Launch::Open(path) => return Ok((path, 0)),
        Launch::Resume(Some(path)) => path,
        Launch::Resume(None) => {
            let dir = config.progress_path();
            list_progress_records(&dir)
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("No saved progress in {}", dir.display()))?
        }
    };

    let record = load_progress(&record_path)
        .with_context(|| format!("Failed to load progress from {}", record_path.display()))?;
    let source = resolve_source(&record, ask_for_replacement)
        .context("Cannot resume without the source document")?;
    info!(
        source = %source.display(),
        index = record.word_index,
        "Resuming saved progress"
    );
    Ok((source, record.word_index))
}

fn ask_for_replacement(missing: &Path) -> Option<PathBuf> {
    eprint!(
        "{} is missing. Enter its new location (empty to abort): ",
        missing.display()
    );
    let _ = io::stderr().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let trimmed = line.trim();
            (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
        }
    }
}

fn install_interrupt_handler(cancel: &CancellationToken) {
    let token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C; stopping after the current step");
        token.cancel();
    }) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
