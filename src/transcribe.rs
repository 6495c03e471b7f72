//! Speech-to-text client (OpenAI audio transcriptions)

use std::path::Path;

use crate::error::{StudyError, StudyResult};
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct TranscriptionClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl TranscriptionClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.openai_base_url.clone(), settings.transcription_model.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/audio/transcriptions", self.base_url)
    }

    /// Upload a media file and return the trimmed transcript
    pub async fn transcribe_file(&self, path: &Path, api_key: &str) -> StudyResult<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StudyError::Request(format!("Failed to read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "media".to_string());

        self.transcribe(bytes, &file_name, api_key).await
    }

    pub async fn transcribe(&self, bytes: Vec<u8>, file_name: &str, api_key: &str) -> StudyResult<String> {
        let file_part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "text");

        let response = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StudyError::Request(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            eprintln!("[Transcribe] API error {}", status);
            return Err(StudyError::Transcription { status: status.as_u16() });
        }

        let transcript = response
            .text()
            .await
            .map_err(|e| StudyError::Request(format!("Failed to read transcript: {}", e)))?;

        Ok(transcript.trim().to_string())
    }
}
