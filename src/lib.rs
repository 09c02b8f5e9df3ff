// Public API exports
pub mod chunker;
pub mod db;
pub mod document;
pub mod embedder;
pub mod logging;
pub mod sentence;
pub mod structure;
pub mod tokenizer;

// Re-export main types for convenience
pub use chunker::{
    ChunkConfig, ChunkError, ChunkMetadata, ChunkStats, SemanticChunker, TextChunk,
    merge_small_chunks,
};
pub use db::ChunkStore;
pub use document::Document;
pub use embedder::{Batcher, ChunkEmbedding, EmbedError, Embedder, EmbeddingModelInfo, embed_chunks};
pub use sentence::{Sentence, split_sentences};
pub use structure::{
    BlockKind, SpecialBlock, StructuralElement, StructureKind, detect_special_blocks,
    extract_structure,
};
pub use tokenizer::{HeuristicTokenizer, Tokenizer, TokenizerError, WhitespaceTokenizer};
