//! The summary record: ordered key points plus ordered flashcards.
//!
//! This is the only unit that gets persisted. The JSON shape
//! (`{"summary": [...], "flashcards": [{"q": .., "a": ..}]}`) is what the
//! local store holds under `lastSummary`.

use serde::{Deserialize, Serialize};

/// One question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    #[serde(rename = "q", default)]
    pub question: String,
    #[serde(rename = "a", default)]
    pub answer: String,
}

impl Flashcard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Parsed result of one model response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Display order is insertion order; duplicates allowed
    #[serde(rename = "summary")]
    pub summary_points: Vec<String>,
    pub flashcards: Vec<Flashcard>,
}

impl SummaryRecord {
    pub fn new(summary_points: Vec<String>, flashcards: Vec<Flashcard>) -> Self {
        Self {
            summary_points,
            flashcards,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary_points.is_empty() && self.flashcards.is_empty()
    }

    /// Serialize for the local store
    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string(self).map_err(|e| format!("Failed to serialize summary: {}", e))
    }

    /// Deserialize a stored record. Both lists are required; a card missing
    /// `q` or `a` reads that side as empty.
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse stored summary: {}", e))
    }
}
