// client.rs - the embedding backend seam
use super::model::EmbeddingModelInfo;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedding backend failed: {0}")]
    Backend(String),

    #[error("expected {expected} vectors, backend returned {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("vector for chunk {chunk_index} has {got} dimensions, model declares {expected}")]
    DimensionMismatch {
        chunk_index: usize,
        expected: usize,
        got: usize,
    },
}

/// Turns chunk texts into vectors.
///
/// One vector per input text, in input order. Batching is handled by the
/// caller according to `model_info().max_batch`.
pub trait Embedder: Send + Sync {
    fn model_info(&self) -> &EmbeddingModelInfo;

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}
