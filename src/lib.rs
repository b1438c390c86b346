use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScraperError>;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl ScraperError {
    /// Wrap a client-side failure, keeping the whole context chain in the message
    #[inline]
    pub fn upstream(error: &anyhow::Error) -> Self {
        Self::Upstream(format!("{:#}", error))
    }
}

pub mod commands;
pub mod config;
pub mod embeddings;
mod http;
pub mod pipeline;
pub mod record;
pub mod server;
pub mod store;
pub mod youtube;

pub use pipeline::{AppContext, IndexingFetch, PipelineMode, PlainFetch, Query, ScrapePipeline};
pub use record::VideoRecord;
