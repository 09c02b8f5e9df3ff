mod config;
mod dedup;
mod error;
mod hierarchy;
mod merge;
mod stats;
mod types;
mod window;


pub use config::ChunkConfig;
pub use dedup::deduplicate;
pub use error::ChunkError;
pub use hierarchy::build_hierarchy;
pub use merge::merge_small_chunks;
pub use stats::ChunkStats;
pub use types::{ChunkMetadata, TextChunk, content_hash};
pub use window::chunk_sentences;

use crate::document::Document;
use crate::sentence::{split_sentences, split_words};
use crate::structure::{detect_special_blocks, extract_structure};
use crate::tokenizer::{TokenCounter, Tokenizer};
use rayon::prelude::*;
use tracing::{debug, info};

/// Upcoming sentences inspected before a soft cutoff
pub const LOOKAHEAD_SENTENCES: usize = 4;

/// A section needs more chunks than this to get a parent chunk
pub const PARENT_MIN_CHILDREN: usize = 3;

/// Children quoted in a parent chunk
pub const PARENT_PREVIEW_CHILDREN: usize = 3;

/// Characters quoted from each child in a parent chunk
pub const PARENT_PREVIEW_CHARS: usize = 500;

/// Structure-aware sliding-window chunker
pub struct SemanticChunker {
    config: ChunkConfig,
    tokenizer: Box<dyn Tokenizer>,
}

impl SemanticChunker {
    /// Create a chunker, rejecting inconsistent token budgets
    pub fn new(config: ChunkConfig, tokenizer: impl Tokenizer + 'static) -> Result<Self, ChunkError> {
        config.validate()?;
        info!(
            "Initialized chunker with token range {}-{} (tokenizer: {})",
            config.min_tokens,
            config.max_tokens,
            tokenizer.model()
        );
        Ok(Self {
            config,
            tokenizer: Box::new(tokenizer),
        })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Run the full pipeline over one document's text.
    ///
    /// Structure extraction, sentence splitting and the sliding window run in
    /// sequence, followed by hierarchy grouping and deduplication. Blank text
    /// yields no chunks; only tokenizer failures are reported.
    pub fn chunk_text(&self, text: &str, page_breaks: &[usize]) -> Result<Vec<TextChunk>, ChunkError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut counter = TokenCounter::new(self.tokenizer.as_ref());

        let structures = if self.config.detect_structure {
            let structures = extract_structure(text);
            info!("Extracted {} structural elements", structures.len());
            structures
        } else {
            Vec::new()
        };
        let special_blocks = detect_special_blocks(text);

        let sentences = if self.config.respect_sentence_boundaries {
            split_sentences(text)
        } else {
            split_words(text)
        };
        debug!(
            sentences = sentences.len(),
            special_blocks = special_blocks.len(),
            "split document"
        );

        let mut chunks = chunk_sentences(
            &sentences,
            &structures,
            &special_blocks,
            page_breaks,
            &self.config,
            &mut counter,
        )?;

        if !structures.is_empty() {
            chunks = build_hierarchy(chunks, &mut counter)?;
        }

        if self.config.enable_deduplication {
            chunks = deduplicate(chunks);
        }

        info!(
            "Created {} chunks from {} characters ({} distinct token counts cached)",
            chunks.len(),
            text.len(),
            counter.cached()
        );
        Ok(chunks)
    }

    pub fn chunk_document(&self, document: &Document) -> Result<Vec<TextChunk>, ChunkError> {
        self.chunk_text(&document.text, &document.page_breaks)
    }

    /// Chunk independent documents in parallel, one pass per document
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Result<Vec<TextChunk>, ChunkError>> {
        documents
            .par_iter()
            .map(|document| self.chunk_document(document))
            .collect()
    }

    /// Optional post-pass folding undersized chunks into their successors
    pub fn merge_small_chunks(&self, chunks: Vec<TextChunk>) -> Vec<TextChunk> {
        let before = chunks.len();
        let merged = merge_small_chunks(chunks, self.config.min_tokens);
        debug!("Merged {} chunks into {}", before, merged.len());
        merged
    }
}
