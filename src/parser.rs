//! Model response parser
//!
//! Turns a free-form model response into a [`SummaryRecord`]. Two independent
//! extractors run over the same text:
//! - bullet lines (`-`, `*` or `•` followed by whitespace) become summary points
//! - `Q:` ... `A:` pairs become flashcards
//!
//! When either comes back empty a fallback kicks in, so parsing never fails:
//! no bullets means the first non-empty lines are used as points, and no
//! Q/A pairs means flashcards are synthesized from the leading points.

use regex::Regex;
use std::sync::LazyLock;

use crate::record::{Flashcard, SummaryRecord};

/// Lines used as summary points when the response has no bullets
pub const MAX_FALLBACK_POINTS: usize = 7;

/// Flashcards synthesized when the response has no Q/A pairs
pub const MAX_SYNTHESIZED_CARDS: usize = 5;

/// Bullet glyph at line start, whitespace, then the point text.
/// CRLF mode so `\r` never ends up inside a captured point.
static BULLET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mR)^[-*•]\s+(.+)$").unwrap()
});

const QUESTION_MARKER: &str = "Q:";
const ANSWER_MARKER: &str = "A:";

/// Parse a raw model response. Total: any input yields a record.
pub fn parse_response(text: &str) -> SummaryRecord {
    let mut summary_points = extract_bullets(text);
    let mut flashcards = extract_qa_pairs(text);

    if summary_points.is_empty() {
        summary_points = fallback_points(text);
    }
    if flashcards.is_empty() {
        flashcards = synthesize_flashcards(&summary_points);
    }

    SummaryRecord::new(summary_points, flashcards)
}

/// Content of every bullet line, in document order
pub fn extract_bullets(text: &str) -> Vec<String> {
    BULLET_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Every `Q: <question> A: <answer>` pair, in document order.
///
/// A question runs up to the first `A:` after it; an answer runs up to the
/// next `Q:` or the end of the text. Both may span lines and are trimmed.
/// Each side needs at least one character after its marker, and that
/// character may be whitespace, so `Q:` directly above `A:` still yields a
/// card with an empty question.
pub fn extract_qa_pairs(text: &str) -> Vec<Flashcard> {
    let mut cards = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(QUESTION_MARKER) {
        let q_start = cursor + offset + QUESTION_MARKER.len();
        // No usable answer marker past this question means none past any later one either
        let Some(a_marker) = question_end(text, q_start) else {
            break;
        };

        let a_start = skip_whitespace(text, a_marker + ANSWER_MARKER.len());
        let a_end = match next_char_end(text, a_start) {
            Some(a_min_end) => text[a_min_end..]
                .find(QUESTION_MARKER)
                .map(|o| a_min_end + o)
                .unwrap_or(text.len()),
            // Only whitespace after the marker
            None => text.len(),
        };

        cards.push(Flashcard::new(
            text[q_start..a_marker].trim(),
            text[a_start..a_end].trim(),
        ));
        cursor = a_end;
    }

    cards
}

/// Position of the `A:` closing a question whose text starts at `q_start`.
///
/// The first visible character of the question is preferred; only when no
/// answer marker follows it does the leading whitespace count as the question.
fn question_end(text: &str, q_start: usize) -> Option<usize> {
    let visible = skip_whitespace(text, q_start);
    if let Some(found) = next_char_end(text, visible).and_then(|from| answer_marker_from(text, from)) {
        return Some(found);
    }
    if visible == q_start {
        return None;
    }
    next_char_end(text, q_start).and_then(|from| answer_marker_from(text, from))
}

/// First `A:` at or after `from` with at least one character behind it
fn answer_marker_from(text: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(offset) = text[search..].find(ANSWER_MARKER) {
        let marker = search + offset;
        if marker + ANSWER_MARKER.len() < text.len() {
            return Some(marker);
        }
        search = marker + ANSWER_MARKER.len();
    }
    None
}

/// First non-empty trimmed lines, used when no bullets were found
pub fn fallback_points(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_FALLBACK_POINTS)
        .map(str::to_string)
        .collect()
}

/// One restating flashcard per leading summary point
pub fn synthesize_flashcards(points: &[String]) -> Vec<Flashcard> {
    points
        .iter()
        .take(MAX_SYNTHESIZED_CARDS)
        .map(|point| Flashcard::new(format!("What does this mean: \"{}\"?", point), point.clone()))
        .collect()
}

/// Byte index of the first non-whitespace char at or after `from`
fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Byte index just past the char starting at `at`, if there is one
fn next_char_end(text: &str, at: usize) -> Option<usize> {
    text[at..].chars().next().map(|c| at + c.len_utf8())
}
