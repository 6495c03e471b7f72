//! Application state: the rendered view, the local store and pending notices.
//!
//! Rendering, persisting and restoring all go through `AppState`, so the
//! whole output round-trip runs without a display attached.

use std::fs;
use std::path::{Path, PathBuf};

use crate::parser::parse_response;
use crate::record::{Flashcard, SummaryRecord};
use crate::storage::{KeyValueStore, LAST_SUMMARY_KEY};
use crate::view::OutputView;

/// File name used by the text export
pub const EXPORT_FILE_NAME: &str = "smart-summary.txt";

pub const NOTICE_STORAGE_FAILED: &str = "Local storage full or blocked.";
pub const NOTICE_SAVED: &str = "Summary saved locally!";

pub struct AppState<S: KeyValueStore> {
    pub view: OutputView,
    pub store: S,
    /// Transient user-facing messages, oldest first
    pub notices: Vec<String>,
    /// Set while a collaborator call is in flight
    pub loading: bool,
}

impl<S: KeyValueStore> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            view: OutputView::new(),
            store,
            notices: Vec::new(),
            loading: false,
        }
    }

    pub fn notify(&mut self, msg: impl Into<String>) {
        self.notices.push(msg.into());
    }

    /// Take all pending notices
    pub fn drain_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn render(&mut self, record: &SummaryRecord) {
        self.view.render(record);
    }

    /// Write `record` as the only stored summary. A failure becomes a notice
    /// and leaves the view untouched. Returns whether the write succeeded.
    pub fn persist(&mut self, record: &SummaryRecord) -> bool {
        let json = match record.to_json() {
            Ok(json) => json,
            Err(e) => {
                eprintln!("[Store] {}", e);
                self.notify(NOTICE_STORAGE_FAILED);
                return false;
            }
        };

        match self.store.set_item(LAST_SUMMARY_KEY, &json) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("[Store] Failed to save summary: {}", e);
                self.notify(NOTICE_STORAGE_FAILED);
                false
            }
        }
    }

    /// Load the stored summary and render it. Anything missing or unreadable
    /// counts as no prior session: the output is hidden and `None` returned.
    pub fn restore(&mut self) -> Option<SummaryRecord> {
        let stored = match self.store.get_item(LAST_SUMMARY_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => {
                self.view.hide();
                return None;
            }
            Err(e) => {
                eprintln!("[Store] Could not read stored summary: {}", e);
                self.view.hide();
                return None;
            }
        };

        match SummaryRecord::from_json(&stored) {
            Ok(record) => {
                self.render(&record);
                Some(record)
            }
            Err(e) => {
                eprintln!("[Store] {}", e);
                self.view.hide();
                None
            }
        }
    }

    /// Parse a model response, show it and store it
    pub fn apply_response(&mut self, response_text: &str) -> SummaryRecord {
        let record = parse_response(response_text);
        self.render(&record);
        self.persist(&record);
        record
    }

    /// Plain-text rendition read back from the view, not from a record
    pub fn export_text(&self) -> String {
        let mut txt = String::from("Summary:\n");
        for item in &self.view.summary_items {
            txt.push_str(&format!("- {}\n", item));
        }
        txt.push_str("\nFlashcards:\n");
        for card in &self.view.cards {
            txt.push_str(&format!("{}\n\n", card.content));
        }
        txt
    }

    /// Write the text export into `dir`, returning the file path
    pub fn write_export(&self, dir: &Path) -> Result<PathBuf, String> {
        fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create export directory: {}", e))?;
        let path = dir.join(EXPORT_FILE_NAME);
        fs::write(&path, self.export_text())
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        Ok(path)
    }

    /// Rebuild a record from what is on display and store it.
    ///
    /// Questions are not recovered: every card is stored with an empty
    /// question and its full rendered content as the answer.
    pub fn manual_save(&mut self) -> bool {
        let record = SummaryRecord::new(
            self.view.summary_items.clone(),
            self.view
                .cards
                .iter()
                .map(|card| Flashcard::new("", card.content.clone()))
                .collect(),
        );

        let saved = self.persist(&record);
        if saved {
            self.notify(NOTICE_SAVED);
        }
        saved
    }
}
