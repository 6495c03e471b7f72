//! Application settings storage
//!
//! Stores configuration like API keys in a JSON file in the data directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Global settings instance
static SETTINGS: RwLock<Option<Settings>> = RwLock::new(None);

/// Path to config file (set during init)
static CONFIG_PATH: RwLock<Option<PathBuf>> = RwLock::new(None);

pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// Free-form reading level inserted into the prompt
    #[serde(default = "default_reading_level")]
    pub reading_level: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,
    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
}

fn default_reading_level() -> String {
    "high school".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            openai_api_key: None,
            reading_level: default_reading_level(),
            gemini_model: default_gemini_model(),
            gemini_base_url: default_gemini_base_url(),
            openai_base_url: default_openai_base_url(),
            transcription_model: default_transcription_model(),
        }
    }
}

impl Settings {
    /// Load settings from disk or create default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
                Err(_) => Settings::default(),
            }
        } else {
            Settings::default()
        }
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, content).map_err(|e| format!("Failed to write settings: {}", e))?;

        Ok(())
    }
}

/// Initialize settings with the data directory
pub fn init(data_dir: PathBuf) {
    let config_path = data_dir.join("settings.json");
    let settings = Settings::load(&config_path);

    if let Ok(mut guard) = CONFIG_PATH.write() {
        *guard = Some(config_path);
    }
    if let Ok(mut guard) = SETTINGS.write() {
        *guard = Some(settings);
    }
}

/// Snapshot of the current settings (defaults if not initialized)
pub fn current() -> Settings {
    SETTINGS
        .read()
        .ok()
        .and_then(|guard| guard.clone())
        .unwrap_or_default()
}

/// Apply `change` to the settings and write them to disk
fn update<F>(change: F) -> Result<(), String>
where
    F: FnOnce(&mut Settings),
{
    let mut settings_guard = SETTINGS.write().map_err(|_| "Failed to acquire settings lock")?;
    let settings = settings_guard.get_or_insert_with(Settings::default);
    change(settings);

    let config_path = CONFIG_PATH
        .read()
        .map_err(|_| "Failed to acquire config path lock")?
        .clone()
        .ok_or("Settings not initialized")?;

    settings.save(&config_path)
}

/// Env var if set and non-empty, otherwise the stored value
fn resolve_key(env_var: &str, stored: Option<String>) -> Option<String> {
    if let Ok(key) = std::env::var(env_var) {
        if !key.is_empty() {
            return Some(key);
        }
    }
    stored.filter(|k| !k.is_empty())
}

/// Where a credential comes from
pub fn key_source(env_var: &str, stored: &Option<String>) -> &'static str {
    if std::env::var(env_var).map(|k| !k.is_empty()).unwrap_or(false) {
        "env"
    } else if stored.as_ref().map(|k| !k.is_empty()).unwrap_or(false) {
        "settings"
    } else {
        "none"
    }
}

/// Mask a key for display (shows first 8 / last 4 chars)
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "*".repeat(chars.len())
    }
}

// ==================== Gemini API Key ====================

/// Get the Gemini API key (checks env var first, then stored setting)
pub fn get_gemini_api_key() -> Option<String> {
    resolve_key(GEMINI_KEY_ENV, current().gemini_api_key)
}

pub fn get_masked_gemini_api_key() -> Option<String> {
    get_gemini_api_key().map(|k| mask_key(&k))
}

/// Set and save the Gemini API key
pub fn set_gemini_api_key(key: String) -> Result<(), String> {
    update(|s| s.gemini_api_key = if key.is_empty() { None } else { Some(key) })?;
    println!("Gemini API key saved to settings");
    Ok(())
}

// ==================== OpenAI API Key (for transcription) ====================

/// Get the OpenAI API key (checks env var first, then stored setting)
pub fn get_openai_api_key() -> Option<String> {
    resolve_key(OPENAI_KEY_ENV, current().openai_api_key)
}

pub fn get_masked_openai_api_key() -> Option<String> {
    get_openai_api_key().map(|k| mask_key(&k))
}

/// Set and save the OpenAI API key
pub fn set_openai_api_key(key: String) -> Result<(), String> {
    update(|s| s.openai_api_key = if key.is_empty() { None } else { Some(key) })?;
    println!("OpenAI API key saved to settings");
    Ok(())
}

// ==================== Generation ====================

pub fn get_reading_level() -> String {
    current().reading_level
}

pub fn set_reading_level(level: String) -> Result<(), String> {
    if level.trim().is_empty() {
        return Err("Reading level cannot be empty".to_string());
    }
    update(|s| s.reading_level = level)
}

pub fn set_gemini_model(model: String) -> Result<(), String> {
    update(|s| s.gemini_model = model)
}

pub fn set_transcription_model(model: String) -> Result<(), String> {
    update(|s| s.transcription_model = model)
}

/// Base URLs are settable so requests can be pointed at a proxy
pub fn set_gemini_base_url(url: String) -> Result<(), String> {
    update(|s| s.gemini_base_url = url.trim_end_matches('/').to_string())
}

pub fn set_openai_base_url(url: String) -> Result<(), String> {
    update(|s| s.openai_base_url = url.trim_end_matches('/').to_string())
}
