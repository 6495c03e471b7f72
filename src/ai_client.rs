//! Gemini API client for summary and flashcard generation
//!
//! Builds the study prompt, sends it to the `generateContent` endpoint and
//! returns the first candidate's text. Parsing that text is left to
//! [`crate::parser`].

use serde::{Deserialize, Serialize};

use crate::error::{StudyError, StudyResult};
use crate::settings::Settings;
use crate::utils::safe_truncate;

/// Gemini API request format
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

/// Gemini API response format. Every level is optional: a response
/// without usable text is treated as an empty answer.
#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default()
    }
}

/// Prompt asking for a bullet summary at `level` plus five Q/A flashcards
pub fn build_prompt(content: &str, level: &str) -> String {
    format!(
        "You are an educational assistant. Summarize the following content at a {} reading level into bullet points. \
         Then create 5 flashcards with question-answer pairs to help a student understand the topic better. Content: {}",
        level, content
    )
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.gemini_base_url.clone(), settings.gemini_model.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Summarize `content` at `level`. Returns the raw model text.
    pub async fn summarize(&self, content: &str, level: &str, api_key: &str) -> StudyResult<String> {
        self.generate(&build_prompt(content, level), api_key).await
    }

    /// Send one prompt and return the model's text ("" when it has none)
    pub async fn generate(&self, prompt: &str, api_key: &str) -> StudyResult<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| StudyError::Request(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            eprintln!("[Gemini] API error {}: {}", status, safe_truncate(&body, 300));
            return Err(StudyError::Api { status: status.as_u16() });
        }

        let api_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| StudyError::Request(format!("Failed to parse response: {}", e)))?;

        Ok(api_response.first_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_level_and_content() {
        let prompt = build_prompt("Cells divide.", "5th grade");
        assert!(prompt.starts_with("You are an educational assistant."));
        assert!(prompt.contains("at a 5th grade reading level into bullet points"));
        assert!(prompt.contains("create 5 flashcards"));
        assert!(prompt.ends_with("Content: Cells divide."));
    }

    #[test]
    fn test_first_text() {
        let json = r#"{"candidates":[{"content":{"parts":[{"text":"- a\n- b"},{"text":"ignored"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_text(), "- a\n- b");
    }

    #[test]
    fn test_first_text_missing_pieces_is_empty() {
        for json in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{}]}}]}"#,
        ] {
            let response: GenerateResponse = serde_json::from_str(json).unwrap();
            assert_eq!(response.first_text(), "", "input: {}", json);
        }
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new("http://localhost:9000/", "gemini-1.5-flash");
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
