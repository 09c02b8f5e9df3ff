use super::types::{ChunkMetadata, TextChunk, content_hash};
use super::{ChunkConfig, ChunkError, LOOKAHEAD_SENTENCES};
use crate::sentence::Sentence;
use crate::structure::{SpecialBlock, StructuralElement};
use crate::tokenizer::TokenCounter;
use tracing::trace;

/// Substrings marking a fence or horizontal rule
const BLOCK_DELIMITERS: [&str; 4] = ["```", "---", "___", "***"];

/// Sliding-window pass over sentence spans.
///
/// Windows close on a hard cutoff when the next sentence would overflow
/// `max_tokens`, or on a soft cutoff at a good break point once `min_tokens`
/// is reached. Each new window is seeded with the tail of the previous one.
/// Budgets are checked against the joined chunk text, so tokenizers whose
/// counts do not add up across sentences still respect `max_tokens`.
pub fn chunk_sentences(
    sentences: &[Sentence],
    structures: &[StructuralElement],
    special_blocks: &[SpecialBlock],
    page_breaks: &[usize],
    config: &ChunkConfig,
    counter: &mut TokenCounter<'_>,
) -> Result<Vec<TextChunk>, ChunkError> {
    let window = SlidingWindow {
        sentences,
        structures,
        special_blocks,
        page_breaks,
        config,
    };
    window.run(counter)
}

struct SlidingWindow<'a> {
    sentences: &'a [Sentence],
    structures: &'a [StructuralElement],
    special_blocks: &'a [SpecialBlock],
    page_breaks: &'a [usize],
    config: &'a ChunkConfig,
}

impl SlidingWindow<'_> {
    fn run(&self, counter: &mut TokenCounter<'_>) -> Result<Vec<TextChunk>, ChunkError> {
        let sentence_tokens = self
            .sentences
            .iter()
            .map(|s| counter.count(&s.text))
            .collect::<Result<Vec<_>, _>>()?;

        let mut chunks = Vec::new();
        let mut window: Vec<usize> = Vec::new();

        for i in 0..self.sentences.len() {
            if !window.is_empty() && self.tokens_with(&window, Some(i), counter)? > self.config.max_tokens {
                trace!(sentence = i, "hard cutoff");
                chunks.push(self.materialize(&window, chunks.len(), counter)?);
                window = self.seed_overlap(&window, i, counter)?;
            }

            window.push(i);
            let window_tokens = self.tokens_with(&window, None, counter)?;

            if window_tokens < self.config.min_tokens || !self.is_good_break_point(i) {
                continue;
            }

            // Hold the cut if the tail would be a tiny chunk
            let lookahead_end = (i + 1 + LOOKAHEAD_SENTENCES).min(sentence_tokens.len());
            let remaining: usize = sentence_tokens[i + 1..lookahead_end].iter().sum();
            if remaining * 2 < self.config.min_tokens {
                continue;
            }

            trace!(sentence = i, window_tokens, "soft cutoff");
            chunks.push(self.materialize(&window, chunks.len(), counter)?);
            window = if i + 1 < self.sentences.len() {
                self.seed_overlap(&window, i + 1, counter)?
            } else {
                Vec::new()
            };
        }

        if !window.is_empty() {
            chunks.push(self.materialize(&window, chunks.len(), counter)?);
        }

        Ok(chunks)
    }

    /// Longest tail of the closed window that fits the overlap budget.
    ///
    /// The tail must also leave room for sentence `next`, so overlap alone
    /// never pushes the next window past `max_tokens`.
    fn seed_overlap(
        &self,
        window: &[usize],
        next: usize,
        counter: &mut TokenCounter<'_>,
    ) -> Result<Vec<usize>, ChunkError> {
        if self.config.overlap_tokens == 0 {
            return Ok(Vec::new());
        }

        let mut start = window.len();
        for pos in (0..window.len()).rev() {
            let tail = &window[pos..];
            if self.tokens_with(tail, None, counter)? > self.config.overlap_tokens
                || self.tokens_with(tail, Some(next), counter)? > self.config.max_tokens
            {
                break;
            }
            start = pos;
        }

        Ok(window[start..].to_vec())
    }

    /// Token count of the window's chunk text, optionally with one more sentence
    fn tokens_with(
        &self,
        window: &[usize],
        extra: Option<usize>,
        counter: &mut TokenCounter<'_>,
    ) -> Result<usize, ChunkError> {
        let indices: Vec<usize> = window.iter().copied().chain(extra).collect();
        Ok(counter.count(&self.join(&indices))?)
    }

    fn join(&self, window: &[usize]) -> String {
        window
            .iter()
            .map(|&i| self.sentences[i].text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_good_break_point(&self, i: usize) -> bool {
        let sentence = &self.sentences[i];
        let Some(next) = self.sentences.get(i + 1) else {
            return true;
        };

        if self.inside_special_block(sentence, next) {
            return false;
        }

        if self.config.respect_paragraph_boundaries
            && (sentence.paragraph_end || sentence.text.contains("\n\n"))
        {
            return true;
        }

        if self.heading_near(sentence.end_line) {
            return true;
        }

        BLOCK_DELIMITERS.iter().any(|d| sentence.text.contains(d))
    }

    /// A structural element sits within one line of `line`
    fn heading_near(&self, line: usize) -> bool {
        let first = self
            .structures
            .partition_point(|e| e.line_number + 1 < line);
        self.structures
            .get(first)
            .is_some_and(|e| e.line_number <= line + 1)
    }

    fn inside_special_block(&self, sentence: &Sentence, next: &Sentence) -> bool {
        self.special_blocks.iter().any(|b| {
            b.contains_line(sentence.end_line) && b.contains_line(next.start_line)
        })
    }

    fn materialize(
        &self,
        window: &[usize],
        chunk_index: usize,
        counter: &mut TokenCounter<'_>,
    ) -> Result<TextChunk, ChunkError> {
        let first = &self.sentences[window[0]];
        let last = &self.sentences[window[window.len() - 1]];

        let content = self.join(window);
        let token_count = counter.count(&content)?;

        let mut metadata = ChunkMetadata::for_content(&content);
        metadata.oversized = window.len() == 1 && token_count > self.config.max_tokens;

        Ok(TextChunk {
            content_hash: content_hash(&content),
            content,
            chunk_index,
            token_count,
            start_char: first.start_char,
            end_char: last.end_char,
            start_page: resolve_page(self.page_breaks, first.start_char, false),
            end_page: resolve_page(self.page_breaks, last.end_char, true),
            section_title: section_title_at(self.structures, first.start_char),
            chunk_level: 0,
            parent_chunk_id: None,
            metadata,
            embedding_id: None,
        })
    }
}

/// Title of the last heading starting at or before `offset`
pub(crate) fn section_title_at(structures: &[StructuralElement], offset: usize) -> Option<String> {
    let after = structures.partition_point(|e| e.char_offset <= offset);
    after
        .checked_sub(1)
        .map(|i| structures[i].title.clone())
}

/// 1-indexed page holding `offset`.
///
/// `offset` is matched against the first break exceeding it; an exclusive end
/// offset may equal the break of the page it ends on. Offsets past the last
/// break fall on the implicit final page.
pub(crate) fn resolve_page(page_breaks: &[usize], offset: usize, end_exclusive: bool) -> Option<usize> {
    if page_breaks.is_empty() {
        return None;
    }

    let page = page_breaks
        .iter()
        .position(|&brk| if end_exclusive { offset <= brk } else { offset < brk })
        .unwrap_or(page_breaks.len());

    Some(page + 1)
}
