use std::sync::Arc;

use tracing::info;

use crate::config::{ApiKey, Config};
use crate::embeddings::{Embedder, OllamaClient};
use crate::pipeline::{AppContext, PipelineMode, Query};
use crate::store::VectorStore;
use crate::{Result, ScraperError, server};

fn load_api_key() -> Result<ApiKey> {
    ApiKey::from_env().map_err(|e| ScraperError::Config(e.to_string()))
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| ScraperError::Other(e.into()))
}

/// Run one keyword search and print the records as pretty JSON
#[inline]
pub async fn scrape(
    config: Config,
    keyword: &str,
    max_results: u32,
    mode: PipelineMode,
) -> Result<()> {
    let api_key = load_api_key()?;
    let query = Query::new(keyword, Some(max_results))?;
    let context = AppContext::build(config, api_key, mode).await?;

    let records = context.pipeline.run(&query).await?;

    println!("{}", to_pretty_json(&records)?);
    Ok(())
}

/// Start the HTTP adapter
#[inline]
pub async fn serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
    mode: PipelineMode,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config
        .server
        .validate()
        .map_err(|e| ScraperError::Config(e.to_string()))?;

    let api_key = load_api_key()?;
    let context = AppContext::build(config, api_key, mode).await?;

    server::serve(&context.config.server, Arc::clone(&context.pipeline)).await
}

/// Embed `text` and print the closest indexed videos
#[inline]
pub async fn similar(config: &Config, text: &str, limit: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(ScraperError::Validation("Search text is required".to_string()));
    }

    let ollama = OllamaClient::new(&config.ollama)
        .map_err(|e| ScraperError::Config(format!("{:#}", e)))?;
    let store = VectorStore::new(config).await?;

    info!(
        "Searching {} indexed videos",
        store.count_entries().await?
    );

    let vector = ollama.embed(text).await?;
    let results = store.search_similar(&vector, limit).await?;

    println!("{}", to_pretty_json(&results)?);
    Ok(())
}
