pub mod batcher;
pub mod client;
pub mod model;
pub mod pipeline;
pub mod types;

#[cfg(test)]
mod tests;

pub use batcher::Batcher;
pub use client::{EmbedError, Embedder};
pub use model::EmbeddingModelInfo;
pub use pipeline::embed_chunks;
pub use types::ChunkEmbedding;
