// model.rs - metadata about the embedding model in use
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingModelInfo {
    pub name: String,
    /// Length of every vector the model returns
    pub dim: usize,
    /// Most texts sent to the model in one call
    pub max_batch: usize,
}

impl EmbeddingModelInfo {
    pub fn new(name: impl Into<String>, dim: usize, max_batch: usize) -> Self {
        Self {
            name: name.into(),
            dim,
            max_batch,
        }
    }

    pub fn gemma_300m() -> Self {
        Self::new("google/embeddinggemma-300m", 768, 32)
    }
}

impl Default for EmbeddingModelInfo {
    fn default() -> Self {
        Self::gemma_300m()
    }
}
