//! Settings-related commands

use crate::settings::{self, GEMINI_KEY_ENV, OPENAI_KEY_ENV};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyStatus {
    pub has_key: bool,
    pub masked_key: Option<String>,
    pub source: String, // "env", "settings", or "none"
}

fn key_status(env_var: &str, stored: Option<String>, resolved: Option<String>) -> ApiKeyStatus {
    ApiKeyStatus {
        has_key: resolved.is_some(),
        masked_key: resolved.map(|k| settings::mask_key(&k)),
        source: settings::key_source(env_var, &stored).to_string(),
    }
}

pub fn get_gemini_key_status() -> ApiKeyStatus {
    key_status(
        GEMINI_KEY_ENV,
        settings::current().gemini_api_key,
        settings::get_gemini_api_key(),
    )
}

pub fn get_openai_key_status() -> ApiKeyStatus {
    key_status(
        OPENAI_KEY_ENV,
        settings::current().openai_api_key,
        settings::get_openai_api_key(),
    )
}

/// Command-line flag first, then env var / stored setting
pub fn resolve_gemini_key(flag: Option<&str>) -> Option<String> {
    flag.map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or_else(settings::get_gemini_api_key)
}

pub fn resolve_openai_key(flag: Option<&str>) -> Option<String> {
    flag.map(str::to_string)
        .filter(|k| !k.trim().is_empty())
        .or_else(settings::get_openai_api_key)
}
