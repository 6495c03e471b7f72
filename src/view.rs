//! Rendered output
//!
//! `OutputView` is the visible state of the output area: the summary list,
//! the flippable key-points card and one numbered card per flashcard. It
//! holds only what a reader sees. Flashcard question and answer are folded
//! into a single content string, so anything read back from the view (text
//! export, manual save) works from that string rather than the record.

use crate::record::SummaryRecord;

/// Front label of the key-points card
pub const KEY_POINTS_LABEL: &str = "Key Points";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPointsCard {
    pub front_label: String,
    pub points: Vec<String>,
    pub flipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard {
    /// 1-based position
    pub number: usize,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputView {
    pub visible: bool,
    pub summary_items: Vec<String>,
    pub key_points: Option<KeyPointsCard>,
    pub cards: Vec<RenderedCard>,
}

impl OutputView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace everything on display with `record`
    pub fn render(&mut self, record: &SummaryRecord) {
        self.clear();
        self.visible = true;

        self.summary_items = record.summary_points.clone();

        if !record.summary_points.is_empty() {
            self.key_points = Some(KeyPointsCard {
                front_label: KEY_POINTS_LABEL.to_string(),
                points: record.summary_points.clone(),
                flipped: false,
            });
        }

        self.cards = record
            .flashcards
            .iter()
            .enumerate()
            .map(|(idx, card)| {
                let number = idx + 1;
                RenderedCard {
                    number,
                    // Newline separates the sides; export and manual save read it back
                    content: format!("Q{}: {}\nA{}: {}", number, card.question, number, card.answer),
                }
            })
            .collect();
    }

    /// Hide the output area; used when there is no prior session
    pub fn hide(&mut self) {
        self.visible = false;
    }

    fn clear(&mut self) {
        self.summary_items.clear();
        self.key_points = None;
        self.cards.clear();
    }

    /// Toggle the key-points card. Returns the new side (true = back).
    pub fn flip_key_points(&mut self) -> Option<bool> {
        let card = self.key_points.as_mut()?;
        card.flipped = !card.flipped;
        Some(card.flipped)
    }

    /// Plain-terminal rendition of the current view
    pub fn to_terminal(&self) -> String {
        if !self.visible {
            return String::new();
        }

        let mut out = String::new();
        out.push_str("Summary\n");
        for item in &self.summary_items {
            out.push_str(&format!("  • {}\n", item));
        }

        if let Some(card) = &self.key_points {
            out.push('\n');
            if card.flipped {
                out.push_str(&format!("┌ {} (back)\n", card.front_label));
                for point in &card.points {
                    out.push_str(&format!("│ - {}\n", point));
                }
                out.push_str("└\n");
            } else {
                out.push_str(&format!("┌ {} ┐  (flip with --back)\n", card.front_label));
            }
        }

        if !self.cards.is_empty() {
            out.push_str("\nFlashcards\n");
            for card in &self.cards {
                for line in card.content.lines() {
                    out.push_str(&format!("  {}\n", line));
                }
                out.push('\n');
            }
        }

        out
    }
}
