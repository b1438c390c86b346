// Embeddings module
// Text-to-vector seam used by the indexing sink, with Ollama as the backing model server

pub mod ollama;

use async_trait::async_trait;

use crate::Result;

pub use ollama::OllamaClient;

/// Computes a fixed-length vector for a piece of text
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
