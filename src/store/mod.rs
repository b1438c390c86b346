// Vector store module
// Persistent video embeddings keyed by video id, backed by LanceDB

#[cfg(test)]
mod tests;

pub mod vector_store;

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;
use crate::record::VideoRecord;

pub use vector_store::VectorStore;

/// One stored video: its id, the embedding of its text and the record itself
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: VideoRecord,
}

impl EmbeddingEntry {
    #[inline]
    pub fn new(vector: Vec<f32>, metadata: VideoRecord) -> Self {
        Self {
            id: metadata.video_id.clone(),
            vector,
            metadata,
        }
    }
}

/// Nearest-neighbour hit returned by [`VectorStore::search_similar`]
#[derive(Debug, Clone, Serialize)]
pub struct SimilarVideo {
    #[serde(flatten)]
    pub record: VideoRecord,
    #[serde(rename = "Distance")]
    pub distance: f32,
}

/// Keyed write side of the store. Writing an id that already exists replaces it.
#[async_trait]
pub trait VideoIndex: Send + Sync {
    async fn upsert(&self, entry: EmbeddingEntry) -> Result<()>;
}
