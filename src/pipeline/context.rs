use std::sync::Arc;

use tracing::info;

use super::{Fetcher, IndexingFetch, IndexingSink, PlainFetch, ScrapePipeline};
use crate::config::{ApiKey, Config};
use crate::embeddings::OllamaClient;
use crate::http::run_blocking;
use crate::store::VectorStore;
use crate::youtube::YoutubeClient;
use crate::{Result, ScraperError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    Plain,
    Indexing,
}

/// Process-lifetime dependencies, built once at startup
pub struct AppContext {
    pub config: Config,
    pub pipeline: Arc<dyn ScrapePipeline>,
}

impl AppContext {
    /// Wire clients for the chosen variant. The indexing variant checks the
    /// embedding model and opens the store before any request is served.
    #[inline]
    pub async fn build(config: Config, api_key: ApiKey, mode: PipelineMode) -> Result<Self> {
        let youtube = YoutubeClient::new(&config.youtube, api_key)
            .map_err(|e| ScraperError::Config(e.to_string()))?;
        let fetcher = Fetcher::new(Arc::new(youtube));

        let pipeline: Arc<dyn ScrapePipeline> = match mode {
            PipelineMode::Plain => Arc::new(PlainFetch::new(fetcher)),
            PipelineMode::Indexing => {
                let ollama = OllamaClient::new(&config.ollama)
                    .map_err(|e| ScraperError::Config(format!("{:#}", e)))?;
                let probe = ollama.clone();
                run_blocking(move || probe.health_check()).await?;

                let store = VectorStore::new(&config).await?;
                let sink = IndexingSink::new(Arc::new(ollama), Arc::new(store));
                Arc::new(IndexingFetch::new(fetcher, sink))
            }
        };

        info!("Using {} pipeline", pipeline.name());
        Ok(Self { config, pipeline })
    }
}
