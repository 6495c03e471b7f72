//! StudyCards CLI - summaries and flashcards from notes, PDFs and recordings
//!
//! Usage: studycards [OPTIONS] <COMMAND>
//!
//! The last generated summary is kept in the local store and shown again by
//! `studycards show`. Supports JSON output for scripting.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use studycards_lib::{
    ai_client::GeminiClient,
    app_state::AppState,
    commands,
    record::SummaryRecord,
    settings,
    storage::{FileStore, KeyValueStore},
    StudyError,
    transcribe::TranscriptionClient,
    utils,
};
use std::io::{Read as _, Write};
use std::path::{Path, PathBuf};
use chrono::{Datelike, Local, Timelike};

// ============================================================================
// Logging Infrastructure
// ============================================================================

use std::fs::{self, File, OpenOptions};
use std::sync::Mutex;

pub(crate) static LOG_FILE: Mutex<Option<File>> = Mutex::new(None);

/// Days of log files to keep
const LOG_RETENTION_DAYS: i64 = 7;

/// Initialize logging - creates log file and cleans old logs
fn init_logging(data_dir: &Path) -> Option<PathBuf> {
    let log_dir = data_dir.join("logs");

    if fs::create_dir_all(&log_dir).is_err() {
        return None;
    }

    // Clean old logs
    if let Ok(entries) = fs::read_dir(&log_dir) {
        let cutoff = Local::now() - chrono::Duration::days(LOG_RETENTION_DAYS);
        for entry in entries.flatten() {
            let path = entry.path();
            // Parse date from filename: studycards-YYYY-MM-DD.log
            let date = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix("studycards-"))
                .and_then(|s| s.strip_suffix(".log"))
                .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
            if let Some(date) = date {
                if date < cutoff.date_naive() {
                    let _ = fs::remove_file(&path);
                }
            }
        }
    }

    // Create today's log file
    let today = Local::now();
    let log_filename = format!("studycards-{:04}-{:02}-{:02}.log", today.year(), today.month(), today.day());
    let log_path = log_dir.join(&log_filename);

    let file = OpenOptions::new().create(true).append(true).open(&log_path).ok()?;
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(file);
    }
    Some(log_path)
}

fn write_log_line(level: &str, msg: &str) {
    let now = Local::now();
    let timestamp = format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second());

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "{} {}{}", timestamp, level, msg);
        }
    }
}

/// Log to both terminal and file
pub(crate) fn log_both(msg: &str) {
    println!("{}", msg);
    write_log_line("", msg);
}

/// Log error to both terminal and file
pub(crate) fn elog_both(msg: &str) {
    eprintln!("{}", msg);
    write_log_line("[ERROR] ", msg);
}

/// Notice to stderr and file (stdout stays clean for --json)
pub(crate) fn nlog_both(msg: &str) {
    eprintln!("{}", msg);
    write_log_line("[NOTICE] ", msg);
}

/// Macro for logging to both terminal and file
macro_rules! log {
    ($($arg:tt)*) => {
        log_both(&format!($($arg)*))
    };
}

/// Macro for error logging to both terminal and file
macro_rules! elog {
    ($($arg:tt)*) => {
        elog_both(&format!($($arg)*))
    };
}

// ============================================================================
// Main CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "studycards")]
#[command(version, about = "Bullet summaries and flashcards from your study material", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory for settings, the local store and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Suppress progress notices
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Detailed logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize text from an argument, a text file or stdin
    Summarize {
        /// Content to summarize (reads stdin when neither this nor --file is given)
        text: Option<String>,
        /// Read content from a text file
        #[arg(long, short)]
        file: Option<PathBuf>,
        /// Reading level (default: from settings)
        #[arg(long, short)]
        level: Option<String>,
        /// Gemini API key (default: GEMINI_API_KEY or settings)
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Extract text from a PDF and summarize it when a Gemini key is available
    Pdf {
        path: PathBuf,
        #[arg(long, short)]
        level: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        /// Print the extracted text
        #[arg(long)]
        print_text: bool,
    },
    /// Transcribe an audio or video file
    Transcribe {
        path: PathBuf,
        /// OpenAI API key (default: OPENAI_API_KEY or settings)
        #[arg(long)]
        openai_key: Option<String>,
        /// Summarize the transcript afterwards
        #[arg(long)]
        summarize: bool,
        #[arg(long, short)]
        level: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Parse a raw model response (file or stdin), show it and store it
    Parse {
        path: Option<PathBuf>,
    },
    /// Show the last stored summary
    Show {
        /// Show the back of the key-points card
        #[arg(long)]
        back: bool,
    },
    /// Export the last stored summary as smart-summary.txt
    Export {
        /// Output directory (default: current directory)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Save what is currently shown back into the local store
    Save,
    /// Configuration settings
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// List all settings
    List,
    /// Get a setting value
    Get {
        /// Setting key
        key: String,
    },
    /// Set a setting value
    Set {
        /// Setting key
        key: String,
        /// Setting value
        value: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    // Ignore SIGPIPE so piping through head doesn't kill the process.
    #[cfg(unix)]
    unsafe { libc::signal(libc::SIGPIPE, libc::SIG_IGN); }

    // println! panics on a closed pipe even with SIGPIPE ignored; exit quietly instead.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe") {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    if let Err(e) = run_cli(cli).await {
        if !e.is_empty() {
            elog!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("studycards"))
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn run_cli(cli: Cli) -> Result<(), String> {
    // Handle completions first (no data dir needed)
    if let Commands::Completions { shell } = &cli.command {
        generate(*shell, &mut Cli::command(), "studycards", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    settings::init(data_dir.clone());

    if let Some(log_path) = init_logging(&data_dir) {
        if cli.verbose {
            eprintln!("[verbose] Logging to: {}", log_path.display());
        }
    }
    if cli.verbose {
        eprintln!("[verbose] Data directory: {}", data_dir.display());
    }

    let store = FileStore::in_dir(&data_dir);
    let mut state = AppState::new(store);
    let out = Output { json: cli.json, quiet: cli.quiet, verbose: cli.verbose };

    let result = match cli.command {
        Commands::Summarize { text, file, level, api_key } => {
            handle_summarize(&mut state, &out, text, file, level, api_key).await
        }
        Commands::Pdf { path, level, api_key, print_text } => {
            handle_pdf(&mut state, &out, &path, level, api_key, print_text).await
        }
        Commands::Transcribe { path, openai_key, summarize, level, api_key } => {
            handle_transcribe(&mut state, &out, &path, openai_key, summarize, level, api_key).await
        }
        Commands::Parse { path } => handle_parse(&mut state, &out, path),
        Commands::Show { back } => handle_show(&mut state, &out, back),
        Commands::Export { out: dir } => handle_export(&mut state, &out, dir),
        Commands::Save => handle_save(&mut state, &out),
        Commands::Config { cmd } => handle_config(cmd, cli.json),
        Commands::Completions { .. } => Ok(()),
    };

    out.flush_notices(&mut state);
    result
}

// ============================================================================
// Output helpers
// ============================================================================

struct Output {
    json: bool,
    quiet: bool,
    verbose: bool,
}

impl Output {
    /// Print pending notices. --quiet only hides progress ("...") notices.
    fn flush_notices<S: KeyValueStore>(&self, state: &mut AppState<S>) {
        for notice in state.drain_notices() {
            if self.quiet && notice.ends_with("...") {
                write_log_line("[NOTICE] ", &notice);
                continue;
            }
            nlog_both(&notice);
        }
    }

    fn print_view<S: KeyValueStore>(&self, state: &AppState<S>, record: &SummaryRecord) -> Result<(), String> {
        if self.json {
            let json = serde_json::to_string_pretty(record)
                .map_err(|e| format!("Failed to serialize summary: {}", e))?;
            println!("{}", json);
        } else {
            print!("{}", state.view.to_terminal());
        }
        Ok(())
    }
}

fn resolve_level(level: Option<String>) -> String {
    level
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(settings::get_reading_level)
}

/// Flow errors are already on screen as notices; exit non-zero without repeating them
fn reported(e: StudyError) -> String {
    write_log_line("[ERROR] ", &e.to_string());
    String::new()
}

fn read_stdin() -> Result<String, String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("Failed to read stdin: {}", e))?;
    Ok(buf)
}

// ============================================================================
// Command handlers
// ============================================================================

async fn handle_summarize(
    state: &mut AppState<FileStore>,
    out: &Output,
    text: Option<String>,
    file: Option<PathBuf>,
    level: Option<String>,
    api_key: Option<String>,
) -> Result<(), String> {
    let content = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        (None, None) => read_stdin()?,
    };
    let level = resolve_level(level);
    let api_key = commands::resolve_gemini_key(api_key.as_deref()).unwrap_or_default();
    let client = GeminiClient::from_settings(&settings::current());

    if out.verbose {
        eprintln!("[verbose] Level: {}, content: {}", level, utils::one_line_preview(&content, 80));
    }

    let record = commands::submit_content(state, &client, &content, &level, &api_key)
        .await
        .map_err(reported)?;
    out.flush_notices(state);
    out.print_view(state, &record)
}

async fn handle_pdf(
    state: &mut AppState<FileStore>,
    out: &Output,
    path: &Path,
    level: Option<String>,
    api_key: Option<String>,
    print_text: bool,
) -> Result<(), String> {
    let bytes = fs::read(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let level = resolve_level(level);
    let api_key = commands::resolve_gemini_key(api_key.as_deref());
    let client = GeminiClient::from_settings(&settings::current());

    let outcome = commands::summarize_pdf(state, &client, &bytes, &level, api_key.as_deref())
        .await
        .map_err(reported)?;
    out.flush_notices(state);

    if out.verbose {
        eprintln!("[verbose] Extracted {} chars", outcome.text.chars().count());
    }
    match &outcome.record {
        Some(record) => {
            if print_text {
                println!("{}", outcome.text);
            }
            out.print_view(state, record)?;
        }
        None if out.json => println!("{}", serde_json::json!({ "text": outcome.text })),
        None => println!("{}", outcome.text),
    }
    match outcome.summary_error {
        Some(e) => Err(reported(e)),
        None => Ok(()),
    }
}

async fn handle_transcribe(
    state: &mut AppState<FileStore>,
    out: &Output,
    path: &Path,
    openai_key: Option<String>,
    summarize: bool,
    level: Option<String>,
    api_key: Option<String>,
) -> Result<(), String> {
    let openai_key = commands::resolve_openai_key(openai_key.as_deref()).unwrap_or_default();
    let current = settings::current();
    let transcriber = TranscriptionClient::from_settings(&current);

    let transcript = commands::transcribe_media(state, &transcriber, Some(path), &openai_key)
        .await
        .map_err(reported)?;
    out.flush_notices(state);

    if !summarize {
        if out.json {
            println!("{}", serde_json::json!({ "transcript": transcript }));
        } else {
            println!("{}", transcript);
        }
        return Ok(());
    }

    let level = resolve_level(level);
    let api_key = commands::resolve_gemini_key(api_key.as_deref()).unwrap_or_default();
    let client = GeminiClient::from_settings(&current);
    let record = commands::submit_content(state, &client, &transcript, &level, &api_key)
        .await
        .map_err(reported)?;
    out.flush_notices(state);
    out.print_view(state, &record)
}

fn handle_parse(state: &mut AppState<FileStore>, out: &Output, path: Option<PathBuf>) -> Result<(), String> {
    let response_text = match path {
        Some(path) => fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        None => read_stdin()?,
    };

    let record = state.apply_response(&response_text);
    if out.verbose {
        eprintln!(
            "[verbose] {} points, {} flashcards",
            record.summary_points.len(),
            record.flashcards.len()
        );
    }
    out.flush_notices(state);
    out.print_view(state, &record)
}

fn handle_show(state: &mut AppState<FileStore>, out: &Output, back: bool) -> Result<(), String> {
    let Some(record) = state.restore() else {
        if out.json {
            println!("null");
        } else {
            log!("No saved summary.");
        }
        return Ok(());
    };
    if back {
        state.view.flip_key_points();
    }
    out.print_view(state, &record)
}

fn handle_export(state: &mut AppState<FileStore>, out: &Output, dir: Option<PathBuf>) -> Result<(), String> {
    if state.restore().is_none() {
        return Err("No saved summary to export".to_string());
    }
    let dir = dir.unwrap_or_else(|| PathBuf::from("."));
    let path = state.write_export(&dir)?;

    if out.json {
        println!("{}", serde_json::json!({ "path": path.display().to_string() }));
    } else {
        log!("Exported to {}", path.display());
    }
    Ok(())
}

fn handle_save(state: &mut AppState<FileStore>, out: &Output) -> Result<(), String> {
    if state.restore().is_none() {
        return Err("Nothing is shown; generate or parse a summary first".to_string());
    }
    if !state.manual_save() {
        out.flush_notices(state);
        return Err("Save failed".to_string());
    }
    Ok(())
}

fn handle_config(cmd: ConfigCommands, json: bool) -> Result<(), String> {
    match cmd {
        ConfigCommands::List => {
            let gemini = commands::get_gemini_key_status();
            let openai = commands::get_openai_key_status();
            let current = settings::current();

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "gemini_api_key": gemini,
                        "openai_api_key": openai,
                        "reading_level": current.reading_level,
                        "gemini_model": current.gemini_model,
                        "gemini_base_url": current.gemini_base_url,
                        "openai_base_url": current.openai_base_url,
                        "transcription_model": current.transcription_model,
                    })
                );
            } else {
                println!("gemini-api-key:      {} ({})", gemini.masked_key.as_deref().unwrap_or("not set"), gemini.source);
                println!("openai-api-key:      {} ({})", openai.masked_key.as_deref().unwrap_or("not set"), openai.source);
                println!("reading-level:       {}", current.reading_level);
                println!("gemini-model:        {}", current.gemini_model);
                println!("gemini-base-url:     {}", current.gemini_base_url);
                println!("openai-base-url:     {}", current.openai_base_url);
                println!("transcription-model: {}", current.transcription_model);
            }
        }
        ConfigCommands::Get { key } => {
            let current = settings::current();
            let value: String = match key.as_str() {
                "gemini-api-key" => settings::get_masked_gemini_api_key().unwrap_or_else(|| "not set".to_string()),
                "openai-api-key" => settings::get_masked_openai_api_key().unwrap_or_else(|| "not set".to_string()),
                "reading-level" => current.reading_level,
                "gemini-model" => current.gemini_model,
                "gemini-base-url" => current.gemini_base_url,
                "openai-base-url" => current.openai_base_url,
                "transcription-model" => current.transcription_model,
                _ => return Err(format!("Unknown config key: {}", key)),
            };

            if json {
                let mut obj = serde_json::Map::new();
                obj.insert(key, serde_json::Value::String(value));
                println!("{}", serde_json::Value::Object(obj));
            } else {
                println!("{}", value);
            }
        }
        ConfigCommands::Set { key, value } => {
            match key.as_str() {
                "gemini-api-key" => settings::set_gemini_api_key(value)?,
                "openai-api-key" => settings::set_openai_api_key(value)?,
                "reading-level" => settings::set_reading_level(value)?,
                "gemini-model" => settings::set_gemini_model(value)?,
                "gemini-base-url" => settings::set_gemini_base_url(value)?,
                "openai-base-url" => settings::set_openai_base_url(value)?,
                "transcription-model" => settings::set_transcription_model(value)?,
                _ => return Err(format!("Unknown config key: {}", key)),
            }
            if !json {
                println!("Set {}", key);
            }
        }
    }
    Ok(())
}
