use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::structure::is_list_item;

/// A chunk of document text ready for embedding and storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// The text content of this chunk
    pub content: String,
    /// Position in emission order within the document
    pub chunk_index: usize,
    /// Tokenizer count of `content`
    pub token_count: usize,
    /// Byte offset in the document (start)
    pub start_char: usize,
    /// Byte offset in the document (end, exclusive)
    pub end_char: usize,
    /// 1-indexed page holding `start_char`
    pub start_page: Option<usize>,
    /// 1-indexed page holding `end_char`
    pub end_page: Option<usize>,
    /// Title of the heading this chunk falls under
    pub section_title: Option<String>,
    /// 0 for top-level chunks, 1 for children of a parent chunk
    pub chunk_level: u8,
    /// `chunk_index` of the parent chunk
    pub parent_chunk_id: Option<usize>,
    pub metadata: ChunkMetadata,
    /// SHA-256 hex digest of `content`
    pub content_hash: String,
    /// Vector store reference, set once embedded
    pub embedding_id: Option<Uuid>,
}

/// Metadata for a chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub has_code: bool,
    pub has_list: bool,
    pub has_table: bool,
    /// Synthesized summary chunk for a large section
    #[serde(default)]
    pub is_parent: bool,
    /// Number of children grouped under a parent chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_count: Option<usize>,
    /// A single sentence exceeded `max_tokens` and was kept whole
    #[serde(default)]
    pub oversized: bool,
    pub created_at: DateTime<Utc>,
}

impl ChunkMetadata {
    pub fn new() -> Self {
        Self {
            has_code: false,
            has_list: false,
            has_table: false,
            is_parent: false,
            child_count: None,
            oversized: false,
            created_at: Utc::now(),
        }
    }
}

impl Default for ChunkMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl TextChunk {
    /// Top-level chunk that is not a synthesized parent
    pub fn is_top_level(&self) -> bool {
        self.chunk_level == 0 && !self.metadata.is_parent
    }

    /// Replace the content and refresh its hash
    pub fn set_content(&mut self, content: String) {
        self.content_hash = content_hash(&content);
        self.content = content;
    }
}

/// Compute the SHA-256 hex digest used for deduplication
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

impl ChunkMetadata {
    /// Content flags for a freshly materialized chunk
    pub(crate) fn for_content(content: &str) -> Self {
        Self {
            has_code: content.contains("```"),
            has_list: content.lines().any(is_list_item),
            has_table: content.matches('|').count() > 2,
            ..Self::new()
        }
    }
}
