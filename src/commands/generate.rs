//! User-action flows: submit text, summarize a PDF, transcribe media.
//!
//! Each flow checks its required inputs before any network activity, calls
//! its collaborators one after another, and only commits a result (render +
//! store) once every call has succeeded. Failures become notices on the
//! `AppState` and are also returned to the caller.

use std::path::Path;

use crate::ai_client::GeminiClient;
use crate::app_state::AppState;
use crate::error::{StudyError, StudyResult};
use crate::pdf_extractor;
use crate::record::SummaryRecord;
use crate::storage::KeyValueStore;
use crate::transcribe::TranscriptionClient;

pub const NOTICE_NEED_CONTENT: &str = "Please enter or upload some content.";
pub const NOTICE_NEED_GEMINI_KEY: &str = "Please enter your Gemini API key.";
pub const NOTICE_NEED_MEDIA: &str = "Please select an audio or video file.";
pub const NOTICE_NEED_OPENAI_KEY: &str = "Please enter your OpenAI API key for transcription.";
pub const NOTICE_GENERATED: &str = "Summary & flashcards generated!";
pub const NOTICE_PDF_EXTRACTED: &str = "PDF text extracted!";
pub const NOTICE_PDF_FAILED: &str = "PDF extraction failed.";
pub const NOTICE_PDF_SUMMARIZED: &str = "PDF summarized!";
pub const NOTICE_TRANSCRIBED: &str = "Transcription complete!";

/// Result of the PDF flow: the extracted text always, a record when the
/// text was also summarized
#[derive(Debug)]
pub struct PdfOutcome {
    pub text: String,
    pub record: Option<SummaryRecord>,
    /// Summarization failure; extraction itself still succeeded
    pub summary_error: Option<StudyError>,
}

/// Call the model with the loading flag raised for the duration
async fn summarize_with_loading<S: KeyValueStore>(
    state: &mut AppState<S>,
    client: &GeminiClient,
    content: &str,
    level: &str,
    api_key: &str,
) -> StudyResult<SummaryRecord> {
    state.set_loading(true);
    let result = client.summarize(content, level, api_key).await;
    state.set_loading(false);

    let response_text = result?;
    Ok(state.apply_response(&response_text))
}

/// Summarize user-supplied content and show the result
pub async fn submit_content<S: KeyValueStore>(
    state: &mut AppState<S>,
    client: &GeminiClient,
    content: &str,
    level: &str,
    api_key: &str,
) -> StudyResult<SummaryRecord> {
    let content = content.trim();
    let api_key = api_key.trim();
    if content.is_empty() {
        state.notify(NOTICE_NEED_CONTENT);
        return Err(StudyError::missing(NOTICE_NEED_CONTENT));
    }
    if api_key.is_empty() {
        state.notify(NOTICE_NEED_GEMINI_KEY);
        return Err(StudyError::missing(NOTICE_NEED_GEMINI_KEY));
    }

    state.notify("Processing with Gemini AI...");
    match summarize_with_loading(state, client, content, level, api_key).await {
        Ok(record) => {
            state.notify(NOTICE_GENERATED);
            Ok(record)
        }
        Err(e) => {
            state.notify(format!("Error: {}", e));
            Err(e)
        }
    }
}

/// Extract a PDF's text and, when a Gemini key is available and the text is
/// not empty, summarize it straight away
pub async fn summarize_pdf<S: KeyValueStore>(
    state: &mut AppState<S>,
    client: &GeminiClient,
    pdf_bytes: &[u8],
    level: &str,
    api_key: Option<&str>,
) -> StudyResult<PdfOutcome> {
    state.notify("Extracting text from PDF...");
    state.set_loading(true);
    let extracted = pdf_extractor::extract_text_from_pdf(pdf_bytes);
    state.set_loading(false);

    let text = match extracted {
        Ok(text) => text,
        Err(e) => {
            eprintln!("[PDF] {}", e);
            state.notify(NOTICE_PDF_FAILED);
            return Err(StudyError::Extraction(e));
        }
    };
    state.notify(NOTICE_PDF_EXTRACTED);

    let mut outcome = PdfOutcome {
        text,
        record: None,
        summary_error: None,
    };

    let api_key = api_key.map(str::trim).unwrap_or_default();
    if api_key.is_empty() || outcome.text.is_empty() {
        return Ok(outcome);
    }

    state.notify("Summarizing PDF content using Gemini...");
    match summarize_with_loading(state, client, &outcome.text, level, api_key).await {
        Ok(record) => {
            state.notify(NOTICE_PDF_SUMMARIZED);
            outcome.record = Some(record);
        }
        Err(e) => {
            state.notify(format!("Error: {}", e));
            outcome.summary_error = Some(e);
        }
    }
    Ok(outcome)
}

/// Transcribe an audio or video file into text
pub async fn transcribe_media<S: KeyValueStore>(
    state: &mut AppState<S>,
    client: &TranscriptionClient,
    media: Option<&Path>,
    api_key: &str,
) -> StudyResult<String> {
    let media = match media {
        Some(path) if path.is_file() => path,
        _ => {
            state.notify(NOTICE_NEED_MEDIA);
            return Err(StudyError::missing(NOTICE_NEED_MEDIA));
        }
    };
    let api_key = api_key.trim();
    if api_key.is_empty() {
        state.notify(NOTICE_NEED_OPENAI_KEY);
        return Err(StudyError::missing(NOTICE_NEED_OPENAI_KEY));
    }

    state.notify("Uploading file for transcription...");
    state.set_loading(true);
    let result = client.transcribe_file(media, api_key).await;
    state.set_loading(false);

    match result {
        Ok(transcript) => {
            state.notify(NOTICE_TRANSCRIBED);
            Ok(transcript)
        }
        Err(e) => {
            state.notify(format!("Error: {}", e));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf_extractor::fixtures::single_page_pdf;
    use crate::record::Flashcard;
    use crate::storage::{MemoryStore, LAST_SUMMARY_KEY};
    use std::io::Read;
    use std::thread::JoinHandle;
    use std::time::Duration;
    use tempfile::TempDir;

    /// What the fake server saw
    struct Seen {
        url: String,
        body: String,
        authorization: Option<String>,
    }

    /// Serve exactly one request with `status` and `body` on a local port
    fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<Option<Seen>>) {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let handle = std::thread::spawn(move || {
            let mut request = server.recv_timeout(Duration::from_secs(10)).ok()??;
            let mut raw = Vec::new();
            request.as_reader().read_to_end(&mut raw).ok()?;
            let authorization = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.to_string());
            let seen = Seen {
                url: request.url().to_string(),
                body: String::from_utf8_lossy(&raw).to_string(),
                authorization,
            };
            let response = tiny_http::Response::from_string(body).with_status_code(status);
            request.respond(response).ok()?;
            Some(seen)
        });
        (format!("http://{}", addr), handle)
    }

    const GEMINI_OK: &str = r#"{"candidates":[{"content":{"parts":[{"text":"- Point one\n- Point two\nQ: What is X? A: It is Y."}]}}]}"#;

    #[tokio::test]
    async fn test_submit_renders_and_persists() {
        let (base, handle) = serve_once(200, GEMINI_OK);
        let client = GeminiClient::new(base, "gemini-1.5-flash");
        let mut state = AppState::new(MemoryStore::new());

        let record = submit_content(&mut state, &client, "  Photosynthesis notes ", "college", "k-123")
            .await
            .unwrap();

        assert_eq!(record.summary_points, vec!["Point one", "Point two"]);
        assert_eq!(record.flashcards, vec![Flashcard::new("What is X?", "It is Y.")]);
        assert!(state.view.visible);
        assert!(!state.loading);
        assert!(state.store.get_item(LAST_SUMMARY_KEY).unwrap().is_some());
        assert_eq!(state.notices.last().map(String::as_str), Some(NOTICE_GENERATED));

        let seen = handle.join().unwrap().unwrap();
        assert_eq!(seen.url, "/v1beta/models/gemini-1.5-flash:generateContent?key=k-123");
        let sent: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
        let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("at a college reading level"));
        assert!(prompt.ends_with("Content: Photosynthesis notes"));
    }

    #[tokio::test]
    async fn test_submit_error_carries_status_and_commits_nothing() {
        let (base, handle) = serve_once(429, r#"{"error":"quota"}"#);
        let client = GeminiClient::new(base, "gemini-1.5-flash");
        let mut state = AppState::new(MemoryStore::new());

        let err = submit_content(&mut state, &client, "text", "college", "k")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(429));
        assert!(!state.view.visible);
        assert!(!state.loading);
        assert!(state.store.get_item(LAST_SUMMARY_KEY).unwrap().is_none());
        assert_eq!(state.notices.last().map(String::as_str), Some("Error: API error (429)"));
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_submit_empty_model_text_gives_empty_record() {
        let (base, handle) = serve_once(200, r#"{"candidates":[]}"#);
        let client = GeminiClient::new(base, "m");
        let mut state = AppState::new(MemoryStore::new());

        let record = submit_content(&mut state, &client, "text", "college", "k").await.unwrap();
        assert!(record.is_empty());
        assert!(state.view.visible);
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let base = format!("http://{}", server.server_addr().to_ip().unwrap());
        let client = GeminiClient::new(base, "m");
        let mut state = AppState::new(MemoryStore::new());

        let err = submit_content(&mut state, &client, "some text", "college", "   ")
            .await
            .unwrap_err();

        assert!(matches!(err, StudyError::MissingInput(_)));
        assert_eq!(state.notices, vec![NOTICE_NEED_GEMINI_KEY.to_string()]);
        assert!(server.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_content_checked_first() {
        let client = GeminiClient::new("http://127.0.0.1:9", "m");
        let mut state = AppState::new(MemoryStore::new());

        let err = submit_content(&mut state, &client, " \n ", "college", "").await.unwrap_err();
        assert_eq!(err.to_string(), NOTICE_NEED_CONTENT);
        assert_eq!(state.notices, vec![NOTICE_NEED_CONTENT.to_string()]);
    }

    #[tokio::test]
    async fn test_pdf_garbage_reports_extraction_failure() {
        let client = GeminiClient::new("http://127.0.0.1:9", "m");
        let mut state = AppState::new(MemoryStore::new());

        let err = summarize_pdf(&mut state, &client, b"not a pdf", "college", Some("k"))
            .await
            .unwrap_err();

        assert!(matches!(err, StudyError::Extraction(_)));
        assert_eq!(state.notices.last().map(String::as_str), Some(NOTICE_PDF_FAILED));
        assert!(!state.loading);
        assert!(!state.view.visible);
    }

    #[tokio::test]
    async fn test_pdf_extracted_and_summarized() {
        let (base, handle) = serve_once(200, GEMINI_OK);
        let client = GeminiClient::new(base, "gemini-1.5-flash");
        let mut state = AppState::new(MemoryStore::new());

        let outcome = summarize_pdf(&mut state, &client, &single_page_pdf("Mitosis"), "college", Some("k"))
            .await
            .unwrap();

        assert!(outcome.text.contains("Mitosis"));
        assert!(outcome.summary_error.is_none());
        let record = outcome.record.unwrap();
        assert_eq!(record.summary_points, vec!["Point one", "Point two"]);
        assert!(state.view.visible);
        assert!(!state.loading);
        assert!(state.store.get_item(LAST_SUMMARY_KEY).unwrap().is_some());
        assert!(state.notices.contains(&NOTICE_PDF_EXTRACTED.to_string()));
        assert_eq!(state.notices.last().map(String::as_str), Some(NOTICE_PDF_SUMMARIZED));

        let seen = handle.join().unwrap().unwrap();
        let sent: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
        let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("Mitosis"));
    }

    #[tokio::test]
    async fn test_pdf_without_key_returns_text_only() {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let base = format!("http://{}", server.server_addr().to_ip().unwrap());
        let client = GeminiClient::new(base, "m");
        let mut state = AppState::new(MemoryStore::new());

        let outcome = summarize_pdf(&mut state, &client, &single_page_pdf("Mitosis"), "college", None)
            .await
            .unwrap();

        assert!(outcome.text.contains("Mitosis"));
        assert!(outcome.record.is_none());
        assert!(outcome.summary_error.is_none());
        assert!(!state.view.visible);
        assert!(state.store.get_item(LAST_SUMMARY_KEY).unwrap().is_none());
        assert_eq!(state.notices.last().map(String::as_str), Some(NOTICE_PDF_EXTRACTED));
        assert!(server.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pdf_summary_failure_keeps_text_and_commits_nothing() {
        let (base, handle) = serve_once(500, "boom");
        let client = GeminiClient::new(base, "m");
        let mut state = AppState::new(MemoryStore::new());

        let outcome = summarize_pdf(&mut state, &client, &single_page_pdf("Mitosis"), "college", Some("k"))
            .await
            .unwrap();

        assert!(outcome.text.contains("Mitosis"));
        assert!(outcome.record.is_none());
        assert_eq!(outcome.summary_error.as_ref().and_then(StudyError::status), Some(500));
        assert!(!state.view.visible);
        assert!(!state.loading);
        assert!(state.store.get_item(LAST_SUMMARY_KEY).unwrap().is_none());
        assert_eq!(state.notices.last().map(String::as_str), Some("Error: API error (500)"));
        handle.join().unwrap();
    }

    #[tokio::test]
    async fn test_transcript_feeds_summary() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("lecture.mp3");
        std::fs::write(&audio, b"ID3fake").unwrap();

        let (speech_base, speech_handle) = serve_once(200, "Cells divide by mitosis.");
        let (gemini_base, gemini_handle) = serve_once(200, GEMINI_OK);
        let transcriber = TranscriptionClient::new(speech_base, "whisper-1");
        let client = GeminiClient::new(gemini_base, "m");
        let mut state = AppState::new(MemoryStore::new());

        let transcript = transcribe_media(&mut state, &transcriber, Some(&audio), "sk-test")
            .await
            .unwrap();
        let record = submit_content(&mut state, &client, &transcript, "college", "k")
            .await
            .unwrap();

        assert_eq!(record.flashcards, vec![Flashcard::new("What is X?", "It is Y.")]);
        assert!(state.store.get_item(LAST_SUMMARY_KEY).unwrap().is_some());
        speech_handle.join().unwrap();
        let seen = gemini_handle.join().unwrap().unwrap();
        assert!(seen.body.contains("Cells divide by mitosis."));
    }

    #[tokio::test]
    async fn test_transcribe_missing_file_and_key() {
        let dir = TempDir::new().unwrap();
        let client = TranscriptionClient::new("http://127.0.0.1:9", "whisper-1");
        let mut state = AppState::new(MemoryStore::new());

        let err = transcribe_media(&mut state, &client, None, "k").await.unwrap_err();
        assert_eq!(err.to_string(), NOTICE_NEED_MEDIA);

        let missing = dir.path().join("nope.mp3");
        let err = transcribe_media(&mut state, &client, Some(&missing), "k").await.unwrap_err();
        assert_eq!(err.to_string(), NOTICE_NEED_MEDIA);

        let audio = dir.path().join("lecture.mp3");
        std::fs::write(&audio, b"ID3fake").unwrap();
        let err = transcribe_media(&mut state, &client, Some(&audio), "").await.unwrap_err();
        assert_eq!(err.to_string(), NOTICE_NEED_OPENAI_KEY);
    }

    #[tokio::test]
    async fn test_transcribe_success() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("lecture.mp3");
        std::fs::write(&audio, b"ID3fake").unwrap();

        let (base, handle) = serve_once(200, "  Today we cover mitosis.\n");
        let client = TranscriptionClient::new(base, "whisper-1");
        let mut state = AppState::new(MemoryStore::new());

        let transcript = transcribe_media(&mut state, &client, Some(&audio), "sk-test")
            .await
            .unwrap();

        assert_eq!(transcript, "Today we cover mitosis.");
        assert_eq!(state.notices.last().map(String::as_str), Some(NOTICE_TRANSCRIBED));

        let seen = handle.join().unwrap().unwrap();
        assert_eq!(seen.url, "/v1/audio/transcriptions");
        assert_eq!(seen.authorization.as_deref(), Some("Bearer sk-test"));
        assert!(seen.body.contains("whisper-1"));
        assert!(seen.body.contains("lecture.mp3"));
        assert!(seen.body.contains("name=\"response_format\""));
    }

    #[tokio::test]
    async fn test_transcribe_failure_status() {
        let dir = TempDir::new().unwrap();
        let audio = dir.path().join("clip.wav");
        std::fs::write(&audio, b"RIFF").unwrap();

        let (base, handle) = serve_once(401, "unauthorized");
        let client = TranscriptionClient::new(base, "whisper-1");
        let mut state = AppState::new(MemoryStore::new());

        let err = transcribe_media(&mut state, &client, Some(&audio), "bad").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(
            state.notices.last().map(String::as_str),
            Some("Error: Transcription failed (401)")
        );
        handle.join().unwrap();
    }
}
