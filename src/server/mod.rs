//! HTTP adapter: `POST /scrape` over the configured pipeline.


use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::pipeline::{Query, ScrapePipeline};
use crate::{Result, ScraperError};

/// Shared application state
#[derive(Clone)]
struct AppState {
    pipeline: Arc<dyn ScrapePipeline>,
}

const KEYWORD_REQUIRED: &str = "Keyword is required";
const LIMIT_NOT_POSITIVE: &str = "max_results must be a positive integer";

/// Body of `POST /scrape`. Fields stay untyped so a wrong type is reported
/// with the same message as a missing or invalid value.
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub keyword: Option<Value>,
    #[serde(default, alias = "maxResults")]
    pub max_results: Option<Value>,
}

impl ScrapeRequest {
    /// An empty body is an empty request
    fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ScraperError::Validation(format!("Invalid JSON body: {}", e)))
    }

    fn into_query(self) -> Result<Query> {
        let keyword = match self.keyword {
            Some(Value::String(keyword)) => keyword,
            _ => return Err(ScraperError::Validation(KEYWORD_REQUIRED.to_string())),
        };

        let max_results = match self.max_results {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => Some(n.as_u64().ok_or_else(limit_error)?),
            Some(Value::String(s)) => Some(s.trim().parse::<u64>().map_err(|_| limit_error())?),
            Some(_) => return Err(limit_error()),
        };
        // Anything past u32 is clamped to the provider cap anyway
        let max_results = max_results.map(|n| u32::try_from(n).unwrap_or(u32::MAX));

        Query::new(&keyword, max_results)
    }
}

fn limit_error() -> ScraperError {
    ScraperError::Validation(LIMIT_NOT_POSITIVE.to_string())
}

/// Error body `{"error": "..."}` with the status matching the error class
struct ApiError(ScraperError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ScraperError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[inline]
pub fn router(pipeline: Arc<dyn ScrapePipeline>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/scrape", post(scrape))
        .with_state(AppState { pipeline })
}

/// Bind and serve until Ctrl+C
#[inline]
pub async fn serve(config: &ServerConfig, pipeline: Arc<dyn ScrapePipeline>) -> Result<()> {
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        "Listening on http://{} ({} pipeline)",
        addr,
        pipeline.name()
    );

    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn scrape(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Response, ApiError> {
    let query = ScrapeRequest::parse(&body)
        .and_then(ScrapeRequest::into_query)
        .map_err(|e| {
            warn!("Rejected scrape request: {}", e);
            ApiError(e)
        })?;

    match state.pipeline.run(&query).await {
        Ok(records) => Ok(Json(records).into_response()),
        Err(e) => {
            error!("Scrape for {:?} failed: {}", query.keyword(), e);
            Err(ApiError(e))
        }
    }
}
