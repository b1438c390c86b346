//! Result assembly: search, per-hit details lookup, normalization and the
//! optional embedding/upsert stage.
//!
//! Everything inside one run is sequential. A details lookup that comes back
//! empty drops that video and carries on; any error aborts the whole run
//! without partial output.


mod context;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::embeddings::Embedder;
use crate::record::{VideoRecord, normalize};
use crate::store::{EmbeddingEntry, VideoIndex};
use crate::youtube::{DetailsLookup, VideoSource};
use crate::{Result, ScraperError};

pub use context::{AppContext, PipelineMode};

pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Largest page the search endpoint accepts
pub const PROVIDER_MAX_RESULTS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    keyword: String,
    max_results: u32,
}

impl Query {
    /// Validate a caller's request. A blank keyword or a zero limit is rejected,
    /// limits above the provider cap are clamped.
    #[inline]
    pub fn new(keyword: &str, max_results: Option<u32>) -> Result<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ScraperError::Validation("Keyword is required".to_string()));
        }

        let requested = max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        if requested == 0 {
            return Err(ScraperError::Validation(
                "max_results must be a positive integer".to_string(),
            ));
        }

        let max_results = if requested > PROVIDER_MAX_RESULTS {
            warn!(
                "max_results {} exceeds the provider cap, using {}",
                requested, PROVIDER_MAX_RESULTS
            );
            PROVIDER_MAX_RESULTS
        } else {
            requested
        };

        Ok(Self {
            keyword: keyword.to_string(),
            max_results,
        })
    }

    #[inline]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[inline]
    pub fn max_results(&self) -> u32 {
        self.max_results
    }
}

/// Search + details + normalize
#[derive(Clone)]
pub struct Fetcher {
    source: Arc<dyn VideoSource>,
}

impl Fetcher {
    #[inline]
    pub fn new(source: Arc<dyn VideoSource>) -> Self {
        Self { source }
    }

    #[inline]
    pub async fn fetch(&self, query: &Query) -> Result<Vec<VideoRecord>> {
        let hits = self
            .source
            .search(query.keyword(), query.max_results())
            .await?;
        debug!("Search for {:?} returned {} hits", query.keyword(), hits.len());

        let mut records = Vec::with_capacity(hits.len());
        let mut skipped = 0_usize;

        for hit in hits
            .iter()
            .filter(|hit| hit.is_video())
            .take(query.max_results() as usize)
        {
            match self.source.video_details(&hit.video_id).await? {
                DetailsLookup::Found(video) => records.push(normalize(&hit.video_id, &video)),
                DetailsLookup::Missing => {
                    debug!("No details for video {}, skipping", hit.video_id);
                    skipped += 1;
                }
            }
        }

        info!(
            "Fetched {} videos for {:?} ({} skipped)",
            records.len(),
            query.keyword(),
            skipped
        );
        Ok(records)
    }
}

/// Embed a record and upsert it under its video id
#[derive(Clone)]
pub struct IndexingSink {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VideoIndex>,
}

impl IndexingSink {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VideoIndex>) -> Self {
        Self { embedder, index }
    }

    #[inline]
    pub async fn index(&self, record: &VideoRecord) -> Result<()> {
        let vector = self.embedder.embed(&record.embedding_text()).await?;
        debug!(
            "Embedded video {} into {} dimensions",
            record.video_id,
            vector.len()
        );
        self.index
            .upsert(EmbeddingEntry::new(vector, record.clone()))
            .await
    }
}

/// A complete keyword-to-records run
#[async_trait]
pub trait ScrapePipeline: Send + Sync {
    async fn run(&self, query: &Query) -> Result<Vec<VideoRecord>>;

    fn name(&self) -> &'static str;
}

/// Fetch and normalize only
#[derive(Clone)]
pub struct PlainFetch {
    fetcher: Fetcher,
}

impl PlainFetch {
    #[inline]
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ScrapePipeline for PlainFetch {
    async fn run(&self, query: &Query) -> Result<Vec<VideoRecord>> {
        self.fetcher.fetch(query).await
    }

    fn name(&self) -> &'static str {
        "plain"
    }
}

/// Fetch and normalize, then embed and upsert every record in order.
/// An embedding or store failure fails the run; nothing is skipped.
#[derive(Clone)]
pub struct IndexingFetch {
    fetcher: Fetcher,
    sink: IndexingSink,
}

impl IndexingFetch {
    #[inline]
    pub fn new(fetcher: Fetcher, sink: IndexingSink) -> Self {
        Self { fetcher, sink }
    }
}

#[async_trait]
impl ScrapePipeline for IndexingFetch {
    async fn run(&self, query: &Query) -> Result<Vec<VideoRecord>> {
        let records = self.fetcher.fetch(query).await?;

        for record in &records {
            self.sink.index(record).await?;
        }

        info!("Indexed {} videos", records.len());
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "indexing"
    }
}
