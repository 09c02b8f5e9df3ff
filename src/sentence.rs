use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Sentence terminator followed by the whitespace run that closes the span
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence regex"));

static WORD_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid gap regex"));

/// A span of the document treated as one unit by the sliding window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Trimmed text of the span
    pub text: String,
    /// Byte offset where the span starts
    pub start_char: usize,
    /// Byte offset one past the span, including its trailing whitespace
    pub end_char: usize,
    /// Line holding the first non-blank character
    pub start_line: usize,
    /// Line holding the last non-blank character
    pub end_line: usize,
    /// The whitespace closing the span contains a blank line
    pub paragraph_end: bool,
}

/// Split text into sentences ending in `.`, `!` or `?` followed by whitespace
pub fn split_sentences(text: &str) -> Vec<Sentence> {
    split_on(text, &SENTENCE_END)
}

/// Split text into whitespace-delimited words
pub fn split_words(text: &str) -> Vec<Sentence> {
    split_on(text, &WORD_GAP)
}

fn split_on(text: &str, boundary: &Regex) -> Vec<Sentence> {
    let lines = LineIndex::new(text);
    let mut spans = Vec::new();
    let mut current = 0;

    for m in boundary.find_iter(text) {
        let end = m.end();
        let paragraph_end = m.as_str().matches('\n').count() >= 2;
        if let Some(span) = make_span(text, &lines, current, end, paragraph_end) {
            spans.push(span);
        }
        current = end;
    }

    if current < text.len() {
        if let Some(span) = make_span(text, &lines, current, text.len(), false) {
            spans.push(span);
        }
    }

    spans
}

fn make_span(
    text: &str,
    lines: &LineIndex,
    start: usize,
    end: usize,
    paragraph_end: bool,
) -> Option<Sentence> {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let content_start = start + (raw.len() - raw.trim_start().len());
    let content_end = start + raw.trim_end().len();

    Some(Sentence {
        text: trimmed.to_string(),
        start_char: start,
        end_char: end,
        start_line: lines.line_of(content_start),
        end_line: lines.line_of(content_end.saturating_sub(1)),
        paragraph_end,
    })
}

/// Maps byte offsets to zero-based line numbers
pub(crate) struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            newlines: text.match_indices('\n').map(|(i, _)| i).collect(),
        }
    }

    pub(crate) fn line_of(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&nl| nl < offset)
    }
}
