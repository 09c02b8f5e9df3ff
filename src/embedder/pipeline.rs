use super::{Batcher, ChunkEmbedding, EmbedError, Embedder};
use crate::chunker::TextChunk;
use tracing::{debug, info};
use uuid::Uuid;

/// Embed every chunk in model-sized batches.
///
/// The backend must answer every batch with one vector per text of the
/// declared dimension. Only once all batches succeed does each chunk get a
/// fresh `embedding_id`; on error the chunks are left untouched.
pub fn embed_chunks(
    embedder: &dyn Embedder,
    chunks: &mut [TextChunk],
) -> Result<Vec<ChunkEmbedding>, EmbedError> {
    let model = embedder.model_info();
    let batcher = Batcher::new(model.max_batch);
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let mut vectors = Vec::with_capacity(texts.len());

    for batch in batcher.split(&texts) {
        let batch_vectors = embedder.embed(batch)?;
        if batch_vectors.len() != batch.len() {
            return Err(EmbedError::CountMismatch {
                expected: batch.len(),
                got: batch_vectors.len(),
            });
        }
        debug!(batch = batch.len(), "embedded batch");
        vectors.extend(batch_vectors);
    }

    if let Some((chunk, vector)) = chunks.iter().zip(&vectors).find(|(_, v)| v.len() != model.dim) {
        return Err(EmbedError::DimensionMismatch {
            chunk_index: chunk.chunk_index,
            expected: model.dim,
            got: vector.len(),
        });
    }

    let embeddings: Vec<ChunkEmbedding> = chunks
        .iter_mut()
        .zip(vectors)
        .map(|(chunk, vector)| {
            let embedding_id = Uuid::new_v4();
            chunk.embedding_id = Some(embedding_id);
            ChunkEmbedding {
                chunk_index: chunk.chunk_index,
                embedding_id,
                vector,
            }
        })
        .collect();

    info!("Embedded {} chunks with {}", embeddings.len(), model.name);
    Ok(embeddings)
}
