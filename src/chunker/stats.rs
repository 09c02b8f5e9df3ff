use super::types::TextChunk;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Summary figures derived from an emitted chunk list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkStats {
    pub total_chunks: usize,
    pub total_tokens: usize,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub avg_tokens: f64,
    pub distinct_sections: usize,
    pub parent_chunks: usize,
    pub child_chunks: usize,
    pub hierarchy_levels: usize,
}

impl ChunkStats {
    pub fn from_chunks(chunks: &[TextChunk]) -> Self {
        if chunks.is_empty() {
            return Self::default();
        }

        let total_tokens: usize = chunks.iter().map(|c| c.token_count).sum();
        let sections: HashSet<&str> = chunks
            .iter()
            .filter_map(|c| c.section_title.as_deref())
            .collect();
        let levels: HashSet<u8> = chunks.iter().map(|c| c.chunk_level).collect();

        Self {
            total_chunks: chunks.len(),
            total_tokens,
            min_tokens: chunks.iter().map(|c| c.token_count).min().unwrap_or(0),
            max_tokens: chunks.iter().map(|c| c.token_count).max().unwrap_or(0),
            avg_tokens: total_tokens as f64 / chunks.len() as f64,
            distinct_sections: sections.len(),
            parent_chunks: chunks.iter().filter(|c| c.metadata.is_parent).count(),
            child_chunks: chunks.iter().filter(|c| c.chunk_level > 0).count(),
            hierarchy_levels: levels.len(),
        }
    }
}
