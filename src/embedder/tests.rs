use super::*;
use crate::chunker::{ChunkConfig, SemanticChunker, TextChunk};
use crate::tokenizer::WhitespaceTokenizer;
use std::sync::Mutex;

/// Embeds each text as `[len, 0, ...]` padded to the model dimension
struct FakeEmbedder {
    info: EmbeddingModelInfo,
    calls: Mutex<Vec<usize>>,
    drop_last: bool,
    /// Batch call (0-based) that reports a backend failure
    fail_on_call: Option<usize>,
}

impl FakeEmbedder {
    fn new(dim: usize, max_batch: usize) -> Self {
        Self {
            info: EmbeddingModelInfo::new("fake", dim, max_batch),
            calls: Mutex::new(Vec::new()),
            drop_last: false,
            fail_on_call: None,
        }
    }
}

impl Embedder for FakeEmbedder {
    fn model_info(&self) -> &EmbeddingModelInfo {
        &self.info
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut calls = self.calls.lock().unwrap();
        if self.fail_on_call == Some(calls.len()) {
            return Err(EmbedError::Backend("connection reset".to_string()));
        }
        calls.push(texts.len());
        drop(calls);
        let mut vectors: Vec<Vec<f32>> = texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0; self.info.dim];
                v[0] = t.len() as f32;
                v
            })
            .collect();
        if self.drop_last {
            vectors.pop();
        }
        Ok(vectors)
    }
}

struct WrongDimension(EmbeddingModelInfo);

impl Embedder for WrongDimension {
    fn model_info(&self) -> &EmbeddingModelInfo {
        &self.0
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|_| vec![1.0; self.0.dim + 1]).collect())
    }
}

fn sample_chunks() -> Vec<TextChunk> {
    let text = (1..=12)
        .map(|i| format!("Sentence number {i} is here."))
        .collect::<Vec<_>>()
        .join("\n\n");
    let config = ChunkConfig::default().with_tokens(5, 10, 0);
    SemanticChunker::new(config, WhitespaceTokenizer)
        .unwrap()
        .chunk_text(&text, &[])
        .unwrap()
}

// ========================================================================
// Batcher
// ========================================================================

#[test]
fn test_batching_small() {
    let batcher = Batcher::new(3);
    let items = vec![
        "chunk1".to_string(),
        "chunk2".to_string(),
        "chunk3".to_string(),
        "chunk4".to_string(),
        "chunk5".to_string(),
    ];

    let batches = batcher.split(&items);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 3);
    assert_eq!(batches[1].len(), 2);
}

#[test]
fn test_batching_exact_size() {
    let batcher = Batcher::new(5);
    let items = vec!["a".to_string(); 10];

    let batches = batcher.split(&items);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].len(), 5);
    assert_eq!(batches[1].len(), 5);
}

#[test]
fn test_batching_empty() {
    let batcher = Batcher::new(100);
    let items: Vec<String> = vec![];

    let batches = batcher.split(&items);
    assert_eq!(batches.len(), 0);
}

#[test]
fn test_batching_zero_size() {
    let batcher = Batcher::new(0);
    assert_eq!(batcher.batch_size, 1);
    assert_eq!(batcher.split(&[1, 2, 3]).len(), 3);
}

// ========================================================================
// Model Info
// ========================================================================

#[test]
fn test_model_info_default() {
    let model = EmbeddingModelInfo::default();
    assert_eq!(model.name, "google/embeddinggemma-300m");
    assert_eq!(model.dim, 768);
    assert_eq!(model.max_batch, 32);
}

#[test]
fn test_model_info_custom() {
    let model = EmbeddingModelInfo::new("custom-model", 384, 64);
    assert_eq!(model.name, "custom-model");
    assert_eq!(model.dim, 384);
    assert_eq!(model.max_batch, 64);
}

// ========================================================================
// Chunk Embedding
// ========================================================================

#[test]
fn test_embed_chunks_in_batches() {
    let mut chunks = sample_chunks();
    assert_eq!(chunks.len(), 12);
    let embedder = FakeEmbedder::new(4, 5);

    let embeddings = embed_chunks(&embedder, &mut chunks).unwrap();

    assert_eq!(*embedder.calls.lock().unwrap(), vec![5, 5, 2]);
    assert_eq!(embeddings.len(), chunks.len());
    for (chunk, embedding) in chunks.iter().zip(&embeddings) {
        assert_eq!(embedding.chunk_index, chunk.chunk_index);
        assert_eq!(chunk.embedding_id, Some(embedding.embedding_id));
        assert_eq!(embedding.vector.len(), 4);
        assert_eq!(embedding.vector[0], chunk.content.len() as f32);
    }
}

#[test]
fn test_embed_no_chunks() {
    let embedder = FakeEmbedder::new(4, 5);
    let embeddings = embed_chunks(&embedder, &mut []).unwrap();
    assert!(embeddings.is_empty());
    assert!(embedder.calls.lock().unwrap().is_empty());
}

#[test]
fn test_missing_vector_is_rejected() {
    let mut chunks = sample_chunks();
    let embedder = FakeEmbedder {
        drop_last: true,
        ..FakeEmbedder::new(4, 8)
    };

    let result = embed_chunks(&embedder, &mut chunks);
    assert!(matches!(
        result,
        Err(EmbedError::CountMismatch { expected: 8, got: 7 })
    ));
}

#[test]
fn test_failed_batch_leaves_chunks_untouched() {
    let mut chunks = sample_chunks();
    let embedder = FakeEmbedder {
        fail_on_call: Some(2),
        ..FakeEmbedder::new(4, 5)
    };

    let result = embed_chunks(&embedder, &mut chunks);
    assert!(matches!(result, Err(EmbedError::Backend(_))));
    assert_eq!(*embedder.calls.lock().unwrap(), vec![5, 5]);
    assert!(chunks.iter().all(|c| c.embedding_id.is_none()));
}

#[test]
fn test_wrong_dimension_is_rejected() {
    let mut chunks = sample_chunks();
    let embedder = WrongDimension(EmbeddingModelInfo::new("wide", 3, 16));

    let result = embed_chunks(&embedder, &mut chunks);
    assert!(matches!(
        result,
        Err(EmbedError::DimensionMismatch { expected: 3, got: 4, .. })
    ));
    assert!(chunks.iter().all(|c| c.embedding_id.is_none()));
}
