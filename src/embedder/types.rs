use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vector produced for one chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEmbedding {
    pub chunk_index: usize,
    pub embedding_id: Uuid,
    pub vector: Vec<f32>,
}
